//! # smartfarm-adapter-simulator
//!
//! Simulated farm hardware backing the messaging fabric.
//!
//! ## Provided devices
//!
//! Every bed gets the same device set:
//!
//! | Device | Id | Behaviour |
//! |--------|----|-----------|
//! | Sensors | one per [`SensorKind`](smartfarm_domain::sensor::SensorKind) | Uniform readings with ±5% jitter, clamped to range |
//! | Lamp 1 / Lamp 2 | `{bed}-lamp1`, `{bed}-lamp2` | `turn_on` / `turn_off` / `toggle` / `set_intensity` |
//! | Pump | `{bed}-pump` | same vocabulary |
//! | Fan | `{bed}-fan` | same vocabulary |
//!
//! ## Dependency rule
//!
//! Depends on `smartfarm-app` (port traits) and `smartfarm-domain` only.

mod config;
mod devices;
mod registry;
mod templates;

pub use config::{BedSeed, FarmSeed, SimulatorConfig};
pub use devices::{ActuatorSimulator, SensorSimulator};
pub use registry::DeviceRegistry;
pub use templates::{ACTUATORS, ActuatorTemplate, sensor_spec, sensor_specs};
