//! System envelopes — status aggregates, inventory answers and queries.

use serde::{Deserialize, Serialize};

use super::EnvelopeSchema;
use crate::farm::{Bed, Farm};
use crate::id::{BedId, FarmId};
use crate::time::{Timestamp, now};

/// Overall health of the installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemHealth {
    Good,
    Warning,
    Error,
}

/// Aggregate counters answering `get_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub total_farms: usize,
    pub total_beds: usize,
    pub active_sensors: usize,
    pub online_actuators: usize,
    pub system_health: SystemHealth,
    pub timestamp: Timestamp,
}

impl EnvelopeSchema for SystemStatus {
    const NAME: &'static str = "SystemStatus";
    const REQUIRED: &'static [&'static str] = &[
        "total_farms",
        "total_beds",
        "active_sensors",
        "online_actuators",
        "system_health",
        "timestamp",
    ];

    extract_variant!(SystemStatus);
}

/// Inbound request on `system/{action}`.
///
/// `action` may be omitted, in which case the topic segment names it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farm_id: Option<FarmId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bed_id: Option<BedId>,
    #[serde(default = "now")]
    pub timestamp: Timestamp,
}

impl SystemQuery {
    /// Query for `action` with no filters.
    #[must_use]
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            farm_id: None,
            bed_id: None,
            timestamp: now(),
        }
    }

    /// Restrict the query to one farm.
    #[must_use]
    pub fn for_farm(mut self, farm_id: FarmId) -> Self {
        self.farm_id = Some(farm_id);
        self
    }

    /// Restrict the query to one bed.
    #[must_use]
    pub fn for_bed(mut self, bed_id: BedId) -> Self {
        self.bed_id = Some(bed_id);
        self
    }
}

impl EnvelopeSchema for SystemQuery {
    const NAME: &'static str = "SystemQuery";
    const REQUIRED: &'static [&'static str] = &[];

    extract_variant!(SystemQuery);
}

/// Per-farm inventory answering `get_farms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmInfo {
    pub farm_id: FarmId,
    pub name: String,
    pub bed_count: usize,
    pub active_beds: usize,
    pub total_sensors: usize,
    pub last_update: Timestamp,
}

impl FarmInfo {
    /// Summarise a farm from its counters.
    #[must_use]
    pub fn new(farm: &Farm, bed_count: usize, active_beds: usize, total_sensors: usize) -> Self {
        Self {
            farm_id: farm.id.clone(),
            name: farm.name.clone(),
            bed_count,
            active_beds,
            total_sensors,
            last_update: now(),
        }
    }
}

impl EnvelopeSchema for FarmInfo {
    const NAME: &'static str = "FarmInfo";
    const REQUIRED: &'static [&'static str] = &["farm_id", "name", "bed_count", "last_update"];

    extract_variant!(FarmInfo);
}

/// Per-bed inventory answering `get_beds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedInfo {
    pub bed_id: BedId,
    pub farm_id: FarmId,
    pub name: String,
    pub crop_name: String,
    pub growing_method: String,
    pub sensor_count: usize,
    pub actuator_count: usize,
    pub last_update: Timestamp,
}

impl BedInfo {
    /// Summarise a bed with its device counts.
    #[must_use]
    pub fn new(bed: &Bed, sensor_count: usize, actuator_count: usize) -> Self {
        Self {
            bed_id: bed.id.clone(),
            farm_id: bed.farm_id.clone(),
            name: bed.name.clone(),
            crop_name: bed.crop.crop_name.clone(),
            growing_method: bed.crop.growing_method.clone(),
            sensor_count,
            actuator_count,
            last_update: now(),
        }
    }
}

impl EnvelopeSchema for BedInfo {
    const NAME: &'static str = "BedInfo";
    const REQUIRED: &'static [&'static str] = &["bed_id", "farm_id", "name", "last_update"];

    extract_variant!(BedInfo);
}
