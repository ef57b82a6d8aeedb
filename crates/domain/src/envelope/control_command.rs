//! Control command — an inbound request to change an actuator.

use serde::{Deserialize, Serialize};

use super::{EnvelopeSchema, Parameters};
use crate::id::{BedId, DeviceId, FarmId, MessageId};
use crate::time::{Timestamp, now};

/// Request to run `action` on `device_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlCommand {
    pub farm_id: FarmId,
    pub bed_id: BedId,
    pub device_id: DeviceId,
    pub action: String,
    #[serde(default)]
    pub parameters: Parameters,
    pub timestamp: Timestamp,
    #[serde(default = "generate_command_id")]
    pub command_id: String,
}

fn generate_command_id() -> String {
    MessageId::new().to_string()
}

impl ControlCommand {
    /// Build a command stamped with the current time and a fresh command id.
    #[must_use]
    pub fn new(
        farm_id: FarmId,
        bed_id: BedId,
        device_id: DeviceId,
        action: impl Into<String>,
        parameters: Parameters,
    ) -> Self {
        Self {
            farm_id,
            bed_id,
            device_id,
            action: action.into(),
            parameters,
            timestamp: now(),
            command_id: generate_command_id(),
        }
    }
}

impl EnvelopeSchema for ControlCommand {
    const NAME: &'static str = "ControlCommand";
    const REQUIRED: &'static [&'static str] = &["farm_id", "bed_id", "device_id", "action", "timestamp"];

    extract_variant!(ControlCommand);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use serde_json::json;

    #[test]
    fn should_decode_full_payload() {
        let command = ControlCommand::decode(&json!({
            "farm_id": "farm_001",
            "bed_id": "bed_001",
            "device_id": "bed_001-lamp1",
            "action": "turn_on",
            "parameters": {"intensity": 80, "duration": 3600},
            "timestamp": "2025-01-15T10:30:00Z",
            "command_id": "1642248600000"
        }))
        .unwrap();
        assert_eq!(command.action, "turn_on");
        assert_eq!(command.command_id, "1642248600000");
        assert_eq!(command.parameters.get("intensity"), Some(&json!(80)));
    }

    #[test]
    fn should_report_first_missing_field() {
        let err = ControlCommand::decode(&json!({
            "farm_id": "farm_001",
            "bed_id": "bed_001",
            "timestamp": "2025-01-15T10:30:00Z"
        }))
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                envelope: "ControlCommand",
                field: "device_id"
            }
        );
    }

    #[test]
    fn should_reject_unparseable_timestamp() {
        let err = ControlCommand::decode(&json!({
            "farm_id": "farm_001",
            "bed_id": "bed_001",
            "device_id": "bed_001-fan",
            "action": "toggle",
            "timestamp": "yesterday"
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::Malformed { .. }));
    }

    #[test]
    fn should_generate_distinct_command_ids() {
        let a = ControlCommand::new(
            FarmId::from("f"),
            BedId::from("b"),
            DeviceId::from("d"),
            "toggle",
            Parameters::new(),
        );
        let b = ControlCommand::new(
            FarmId::from("f"),
            BedId::from("b"),
            DeviceId::from("d"),
            "toggle",
            Parameters::new(),
        );
        assert_ne!(a.command_id, b.command_id);
    }
}
