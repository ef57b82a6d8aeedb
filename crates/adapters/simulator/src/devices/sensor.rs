//! Sensor simulator — uniform samples with a little jitter, kept in range.

use smartfarm_domain::envelope::SensorReading;
use smartfarm_domain::error::DeviceError;
use smartfarm_domain::id::{BedId, FarmId};
use smartfarm_domain::sensor::{SensorKind, SensorSpec, SensorState};
use smartfarm_domain::time::{Timestamp, now};

/// Share of the range used for the symmetric jitter (±5%).
const JITTER_SPREAD: f64 = 0.1;

/// A simulated sensor attached to one bed.
#[derive(Debug, Clone)]
pub struct SensorSimulator {
    farm_id: FarmId,
    bed_id: BedId,
    spec: SensorSpec,
    last_value: Option<f64>,
    last_update: Timestamp,
    is_online: bool,
}

impl SensorSimulator {
    /// An online sensor that has not produced anything yet.
    #[must_use]
    pub fn new(farm_id: FarmId, bed_id: BedId, spec: SensorSpec) -> Self {
        Self {
            farm_id,
            bed_id,
            spec,
            last_value: None,
            last_update: now(),
            is_online: true,
        }
    }

    #[must_use]
    pub fn kind(&self) -> SensorKind {
        self.spec.kind
    }

    #[must_use]
    pub fn bed_id(&self) -> &BedId {
        &self.bed_id
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.is_online
    }

    pub fn set_online(&mut self, online: bool) {
        self.is_online = online;
        self.last_update = now();
    }

    /// Draw a new value and return it as a reading.
    ///
    /// The value is uniform over `[min, max]` plus jitter, rounded to one
    /// decimal and clamped back into range.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::SensorOffline`] when the sensor is offline;
    /// its last value is left untouched.
    pub fn produce_reading(&mut self, rng: &mut fastrand::Rng) -> Result<SensorReading, DeviceError> {
        if !self.is_online {
            return Err(DeviceError::SensorOffline {
                bed_id: self.bed_id.clone(),
                sensor_type: self.spec.kind.to_string(),
            });
        }
        let span = self.spec.span();
        let base = self.spec.min + rng.f64() * span;
        let jitter = (rng.f64() - 0.5) * JITTER_SPREAD * span;
        let value = self.spec.clamp(((base + jitter) * 10.0).round() / 10.0);

        self.last_value = Some(value);
        self.last_update = now();
        Ok(self.reading(value))
    }

    /// The most recent reading, if one was produced.
    #[must_use]
    pub fn latest_reading(&self) -> Option<SensorReading> {
        self.last_value.map(|value| self.reading(value))
    }

    #[must_use]
    pub fn snapshot(&self) -> SensorState {
        SensorState {
            farm_id: self.farm_id.clone(),
            bed_id: self.bed_id.clone(),
            spec: self.spec.clone(),
            last_value: self.last_value,
            last_update: self.last_update,
            is_online: self.is_online,
        }
    }

    fn reading(&self, value: f64) -> SensorReading {
        SensorReading {
            farm_id: self.farm_id.clone(),
            bed_id: self.bed_id.clone(),
            sensor_type: self.spec.kind,
            value,
            unit: self.spec.unit.clone(),
            timestamp: self.last_update,
            quality: self.spec.quality_of(value),
        }
    }
}
