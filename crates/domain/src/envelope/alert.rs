//! Alert — a notification about something that went wrong (or might).

use serde::{Deserialize, Serialize};

use super::EnvelopeSchema;
use crate::error::SmartFarmError;
use crate::id::{BedId, DeviceId, FarmId, MessageId};
use crate::time::{Timestamp, now};

/// Subsystem an alert originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Sensor,
    Control,
    System,
}

/// Severity of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
    Critical,
}

/// A notification envelope. Dispatch failures are reported as alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub level: AlertLevel,
    pub message: String,
    pub farm_id: FarmId,
    pub bed_id: BedId,
    pub device_id: Option<DeviceId>,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub acknowledged: bool,
}

impl Alert {
    /// Build an unacknowledged alert stamped now.
    #[must_use]
    pub fn new(
        kind: AlertKind,
        level: AlertLevel,
        message: impl Into<String>,
        farm_id: FarmId,
        bed_id: BedId,
        device_id: Option<DeviceId>,
    ) -> Self {
        Self {
            alert_id: MessageId::new().to_string(),
            kind,
            level,
            message: message.into(),
            farm_id,
            bed_id,
            device_id,
            timestamp: now(),
            acknowledged: false,
        }
    }

    /// Error-level alert whose message starts with the error code
    /// (`DeviceNotFound: device ghost-1 not found`).
    #[must_use]
    pub fn from_error(
        kind: AlertKind,
        err: &SmartFarmError,
        farm_id: FarmId,
        bed_id: BedId,
        device_id: Option<DeviceId>,
    ) -> Self {
        let message = format!("{}: {err}", err.code());
        Self::new(kind, AlertLevel::Error, message, farm_id, bed_id, device_id)
    }
}

impl EnvelopeSchema for Alert {
    const NAME: &'static str = "Alert";
    const REQUIRED: &'static [&'static str] = &[
        "alert_id",
        "type",
        "level",
        "message",
        "farm_id",
        "bed_id",
        "timestamp",
    ];

    extract_variant!(Alert);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeviceError;

    #[test]
    fn should_prefix_message_with_error_code() {
        let err: SmartFarmError = DeviceError::NotFound {
            device_id: DeviceId::from("ghost-1"),
        }
        .into();
        let alert = Alert::from_error(
            AlertKind::Control,
            &err,
            FarmId::from("farm_001"),
            BedId::from("bed_001"),
            Some(DeviceId::from("ghost-1")),
        );
        assert_eq!(alert.message, "DeviceNotFound: device ghost-1 not found");
        assert_eq!(alert.level, AlertLevel::Error);
        assert!(!alert.acknowledged);
    }

    #[test]
    fn should_serialize_null_device_id() {
        let alert = Alert::new(
            AlertKind::System,
            AlertLevel::Info,
            "started",
            FarmId::from("farm_001"),
            BedId::from("bed_001"),
            None,
        );
        let value = serde_json::to_value(&alert).unwrap();
        assert!(value["device_id"].is_null());
        assert_eq!(value["type"], serde_json::json!("system"));
        assert_eq!(value["level"], serde_json::json!("info"));
    }

    #[test]
    fn should_order_levels_by_severity() {
        assert!(AlertLevel::Critical > AlertLevel::Error);
        assert!(AlertLevel::Warning > AlertLevel::Info);
    }
}
