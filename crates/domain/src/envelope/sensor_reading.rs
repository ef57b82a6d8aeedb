//! Sensor reading — one telemetry sample.

use serde::{Deserialize, Serialize};

use super::EnvelopeSchema;
use crate::id::{BedId, FarmId};
use crate::sensor::{ReadingQuality, SensorKind};
use crate::time::Timestamp;

/// A single value produced by a sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub farm_id: FarmId,
    pub bed_id: BedId,
    pub sensor_type: SensorKind,
    pub value: f64,
    pub unit: String,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub quality: ReadingQuality,
}

impl EnvelopeSchema for SensorReading {
    const NAME: &'static str = "SensorReading";
    const REQUIRED: &'static [&'static str] =
        &["farm_id", "bed_id", "sensor_type", "value", "unit", "timestamp"];

    extract_variant!(SensorReading);
}
