//! Simulated devices — one sensor per measured quantity, one actuator per
//! controllable output.
//!
//! Simulators are plain state machines; the registry serialises access.

mod actuator;
mod sensor;

pub use actuator::ActuatorSimulator;
pub use sensor::SensorSimulator;
