//! Actuators — controllable devices and the actions they accept.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::envelope::{DeviceStatus, Parameters};
use crate::error::{DeviceError, SmartFarmError, ValidationError};
use crate::id::{BedId, DeviceId, FarmId};
use crate::time::Timestamp;

/// Upper bound of the intensity scale.
pub const MAX_INTENSITY: u8 = 100;

/// Category of an actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActuatorKind {
    Light,
    Pump,
    Fan,
    Valve,
}

impl fmt::Display for ActuatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => f.write_str("light"),
            Self::Pump => f.write_str("pump"),
            Self::Fan => f.write_str("fan"),
            Self::Valve => f.write_str("valve"),
        }
    }
}

/// Binary power state of an actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActuatorStatus {
    On,
    #[default]
    Off,
}

impl ActuatorStatus {
    /// The opposite state.
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }
}

impl fmt::Display for ActuatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
        }
    }
}

/// A decoded actuator action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorAction {
    /// Switch on, at the given intensity or full power.
    TurnOn { intensity: Option<u8> },
    /// Switch off; intensity drops to zero.
    TurnOff,
    /// Change intensity; only legal while on.
    SetIntensity { intensity: u8 },
    /// Flip the power state.
    Toggle,
}

impl ActuatorAction {
    /// Decode an action name and its parameter map.
    ///
    /// `intensity` is read from the parameters, falling back to the older
    /// `brightness` key. `set_brightness` is accepted as an alias of
    /// `set_intensity`.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::UnsupportedAction`] for unknown action names and
    /// [`ValidationError`] when `set_intensity` lacks a usable intensity.
    pub fn parse(action: &str, parameters: &Parameters) -> Result<Self, SmartFarmError> {
        match action {
            "turn_on" => Ok(Self::TurnOn {
                intensity: read_intensity(parameters)?,
            }),
            "turn_off" => Ok(Self::TurnOff),
            "toggle" => Ok(Self::Toggle),
            "set_intensity" | "set_brightness" => {
                let intensity =
                    read_intensity(parameters)?.ok_or(ValidationError::MissingField {
                        envelope: "ControlCommand",
                        field: "parameters.intensity",
                    })?;
                Ok(Self::SetIntensity { intensity })
            }
            other => Err(DeviceError::UnsupportedAction {
                action: other.to_string(),
            }
            .into()),
        }
    }

    /// Canonical action name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::TurnOn { .. } => "turn_on",
            Self::TurnOff => "turn_off",
            Self::SetIntensity { .. } => "set_intensity",
            Self::Toggle => "toggle",
        }
    }
}

fn read_intensity(parameters: &Parameters) -> Result<Option<u8>, ValidationError> {
    let Some(raw) = parameters
        .get("intensity")
        .or_else(|| parameters.get("brightness"))
        .filter(|value| !value.is_null())
    else {
        return Ok(None);
    };
    let value = raw.as_f64().ok_or_else(|| ValidationError::InvalidField {
        envelope: "ControlCommand",
        field: "parameters.intensity",
        reason: format!("expected a number, got {raw}"),
    })?;
    Ok(Some(clamp_intensity(value)))
}

/// Clamp an arbitrary number onto the `0..=100` intensity scale.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn clamp_intensity(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, f64::from(MAX_INTENSITY)) as u8
}

/// Point-in-time snapshot of a simulated actuator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorState {
    pub device_id: DeviceId,
    pub name: String,
    pub kind: ActuatorKind,
    pub farm_id: FarmId,
    pub bed_id: BedId,
    pub status: ActuatorStatus,
    pub intensity: u8,
    pub is_online: bool,
    pub last_update: Timestamp,
}

impl ActuatorState {
    /// Render the snapshot as a `DeviceStatus` envelope body.
    #[must_use]
    pub fn to_status(&self) -> DeviceStatus {
        DeviceStatus {
            device_id: self.device_id.clone(),
            name: self.name.clone(),
            kind: self.kind,
            status: self.status,
            intensity: self.intensity,
            is_online: self.is_online,
            last_update: self.last_update,
        }
    }
}
