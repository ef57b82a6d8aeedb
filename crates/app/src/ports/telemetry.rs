//! Telemetry port — one sample per sensor, on demand.

use std::sync::Arc;

use smartfarm_domain::envelope::SensorReading;
use smartfarm_domain::error::SmartFarmError;

/// Produces sensor readings for the telemetry scheduler.
pub trait TelemetrySource: Send + Sync {
    /// Sample every registered sensor once.
    ///
    /// Offline sensors yield an `Err` entry instead of a reading; one bad
    /// sensor never hides the others.
    fn sample_all(&self) -> Vec<Result<SensorReading, SmartFarmError>>;
}

impl<T: TelemetrySource + ?Sized> TelemetrySource for Arc<T> {
    fn sample_all(&self) -> Vec<Result<SensorReading, SmartFarmError>> {
        (**self).sample_all()
    }
}
