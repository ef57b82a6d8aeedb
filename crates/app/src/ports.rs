//! Port definitions — traits that device adapters implement.
//!
//! The fabric drives devices only through these traits, so the simulator
//! can be swapped for real hardware without touching routing or dispatch.

pub mod devices;
pub mod telemetry;

pub use devices::{DeviceCensus, DeviceDirectory};
pub use telemetry::TelemetrySource;
