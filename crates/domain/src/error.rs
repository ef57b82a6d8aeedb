//! Common error types used across the workspace.
//!
//! Each concern has its own typed error; [`SmartFarmError`] aggregates them
//! through `#[from]` conversions so `?` works across layers.

use crate::id::{BedId, DeviceId, FarmId};

/// Top-level error for every fallible smartfarm operation.
#[derive(Debug, thiserror::Error)]
pub enum SmartFarmError {
    /// A device-level failure raised by a simulator or a lookup.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// An inbound envelope or topic pattern failed structural validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The registry was configured inconsistently.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl SmartFarmError {
    /// Stable machine-readable code carried inside alert envelopes.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Device(err) => err.code(),
            Self::Validation(_) => "EnvelopeValidationFailed",
            Self::Registry(_) => "RegistryConfigInvalid",
        }
    }
}

/// Failures raised by device lookups and device simulators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// No device with the given id is registered.
    #[error("device {device_id} not found")]
    NotFound { device_id: DeviceId },

    /// No sensor of the given type exists on the bed.
    #[error("sensor {sensor_type} not found on bed {bed_id}")]
    SensorNotFound { bed_id: BedId, sensor_type: String },

    /// The device exists but its online flag is false.
    #[error("device {device_id} is offline")]
    Offline { device_id: DeviceId },

    /// An intensity change was attempted while the actuator is off.
    #[error("device {device_id} must be on to change its intensity")]
    ActuatorNotOn { device_id: DeviceId },

    /// The action name is not part of the actuator vocabulary.
    #[error("unsupported action `{action}`")]
    UnsupportedAction { action: String },

    /// A reading was requested from an offline sensor.
    #[error("sensor {sensor_type} on bed {bed_id} is offline")]
    SensorOffline { bed_id: BedId, sensor_type: String },
}

impl DeviceError {
    /// Stable machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } | Self::SensorNotFound { .. } => "DeviceNotFound",
            Self::Offline { .. } => "DeviceOffline",
            Self::ActuatorNotOn { .. } => "ActuatorNotOn",
            Self::UnsupportedAction { .. } => "UnsupportedAction",
            Self::SensorOffline { .. } => "SensorOffline",
        }
    }
}

/// Structural validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A display name was empty.
    #[error("name must not be empty")]
    EmptyName,

    /// An identifier was empty.
    #[error("{kind} identifier must not be empty")]
    EmptyId { kind: &'static str },

    /// An identifier contains a character reserved by the topic syntax.
    #[error("{kind} identifier `{id}` must not contain `/`, `+` or `#`")]
    ReservedCharacter { kind: &'static str, id: String },

    /// A required envelope field is absent or null.
    #[error("{envelope} envelope is missing required field `{field}`")]
    MissingField {
        envelope: &'static str,
        field: &'static str,
    },

    /// The payload is not a JSON object.
    #[error("{envelope} envelope must be a JSON object")]
    NotAnObject { envelope: &'static str },

    /// A field is present but has the wrong shape.
    #[error("{envelope} envelope has an invalid `{field}` field: {reason}")]
    InvalidField {
        envelope: &'static str,
        field: &'static str,
        reason: String,
    },

    /// The payload carries every required field but still fails to decode.
    #[error("{envelope} envelope is malformed: {reason}")]
    Malformed {
        envelope: &'static str,
        reason: String,
    },

    /// A subscription pattern is malformed.
    #[error("invalid topic pattern `{pattern}`: {reason}")]
    InvalidTopicPattern {
        pattern: String,
        reason: &'static str,
    },
}

/// Inconsistent registry configuration; fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A farm with this id is already registered.
    #[error("farm {0} is already registered")]
    DuplicateFarm(FarmId),

    /// A bed with this id is already registered.
    #[error("bed {0} is already registered")]
    DuplicateBed(BedId),

    /// A bed references a farm that does not exist.
    #[error("bed {bed_id} references unknown farm {farm_id}")]
    UnknownFarm { bed_id: BedId, farm_id: FarmId },

    /// A farm or bed record failed validation.
    #[error("invalid registry record")]
    InvalidRecord(#[source] ValidationError),
}
