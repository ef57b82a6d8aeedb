//! Device status — the observable state of an actuator.

use serde::{Deserialize, Serialize};

use super::EnvelopeSchema;
use crate::actuator::{ActuatorKind, ActuatorStatus};
use crate::id::DeviceId;
use crate::time::Timestamp;

/// Actuator state as published after a command or on inventory queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub device_id: DeviceId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ActuatorKind,
    pub status: ActuatorStatus,
    /// 0–100; older producers call this `brightness`.
    #[serde(default, alias = "brightness")]
    pub intensity: u8,
    pub is_online: bool,
    pub last_update: Timestamp,
}

impl EnvelopeSchema for DeviceStatus {
    const NAME: &'static str = "DeviceStatus";
    const REQUIRED: &'static [&'static str] =
        &["device_id", "name", "type", "status", "is_online", "last_update"];

    extract_variant!(DeviceStatus);
}
