//! Command history records — one entry per dispatched control command.

use serde::{Deserialize, Serialize};

use crate::envelope::{ControlCommand, Parameters};
use crate::error::SmartFarmError;
use crate::id::DeviceId;
use crate::time::{Timestamp, now};

/// Outcome of a single control command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub device_id: DeviceId,
    pub action: String,
    /// Absent when the inbound payload was too broken to carry one.
    pub command_id: Option<String>,
    pub parameters: Parameters,
    pub timestamp: Timestamp,
    pub success: bool,
    pub error: Option<String>,
}

impl CommandRecord {
    /// Record a command that was applied.
    #[must_use]
    pub fn succeeded(command: &ControlCommand) -> Self {
        Self {
            device_id: command.device_id.clone(),
            action: command.action.clone(),
            command_id: Some(command.command_id.clone()),
            parameters: command.parameters.clone(),
            timestamp: now(),
            success: true,
            error: None,
        }
    }

    /// Record a command that was rejected by a device.
    #[must_use]
    pub fn failed(command: &ControlCommand, err: &SmartFarmError) -> Self {
        Self {
            success: false,
            error: Some(format!("{}: {err}", err.code())),
            ..Self::succeeded(command)
        }
    }

    /// Record a payload that never decoded into a command.
    #[must_use]
    pub fn rejected(device_id: DeviceId, action: Option<String>, err: &SmartFarmError) -> Self {
        Self {
            device_id,
            action: action.unwrap_or_default(),
            command_id: None,
            parameters: Parameters::new(),
            timestamp: now(),
            success: false,
            error: Some(format!("{}: {err}", err.code())),
        }
    }
}
