//! # smartfarm-app
//!
//! Application layer — the messaging fabric and the **port definitions**
//! (traits) it drives.
//!
//! ## Responsibilities
//! - Define **port traits** that device adapters implement:
//!   - `DeviceDirectory` — execute actuator actions, answer inventory queries
//!   - `TelemetrySource` — sample every sensor once
//! - Provide the in-process **topic router** (wildcard pub/sub + message log)
//! - Provide the **command dispatcher** (control and system topics → device calls → result envelopes)
//! - Provide the **telemetry scheduler** (periodic sensor publishing)
//! - Bundle all of the above in a **fabric** context for the composition root
//!
//! ## Dependency rule
//! Depends on `smartfarm-domain` only (plus `tokio` for the scheduler task).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod command_history;
pub mod dispatcher;
pub mod fabric;
pub mod message_log;
pub mod ports;
pub mod router;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;
