//! Sensors — measurement types, bounds and reading quality.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::id::{BedId, FarmId};
use crate::time::Timestamp;

/// The quantity a sensor measures. Doubles as the sensor identifier within a bed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Temperature,
    Humidity,
    Ec,
    Ph,
    Light,
    WaterTemp,
}

impl SensorKind {
    /// Every sensor kind, in template order.
    pub const ALL: [Self; 6] = [
        Self::Temperature,
        Self::Humidity,
        Self::Ec,
        Self::Ph,
        Self::Light,
        Self::WaterTemp,
    ];

    /// Wire name of the kind (`water_temp`, …).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Ec => "ec",
            Self::Ph => "ph",
            Self::Light => "light",
            Self::WaterTemp => "water_temp",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known [`SensorKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sensor type `{0}`")]
pub struct UnknownSensorKind(pub String);

impl FromStr for SensorKind {
    type Err = UnknownSensorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownSensorKind(s.to_string()))
    }
}

/// Quality flag attached to every reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingQuality {
    #[default]
    Good,
    Warning,
    Error,
}

/// Static description of a sensor: what it measures and its physical range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSpec {
    pub kind: SensorKind,
    pub min: f64,
    pub max: f64,
    pub unit: String,
    /// Values outside this band are flagged [`ReadingQuality::Warning`].
    pub comfort: Option<(f64, f64)>,
}

impl SensorSpec {
    /// Width of the value range.
    #[must_use]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Clamp a raw value into `[min, max]`.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Classify a value against the comfort band.
    #[must_use]
    pub fn quality_of(&self, value: f64) -> ReadingQuality {
        match self.comfort {
            Some((low, high)) if value < low || value > high => ReadingQuality::Warning,
            _ => ReadingQuality::Good,
        }
    }
}

/// Point-in-time snapshot of a simulated sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorState {
    pub farm_id: FarmId,
    pub bed_id: BedId,
    pub spec: SensorSpec,
    pub last_value: Option<f64>,
    pub last_update: Timestamp,
    pub is_online: bool,
}
