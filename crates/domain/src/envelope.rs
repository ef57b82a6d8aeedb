//! Envelopes — the typed payloads exchanged over topics.
//!
//! Every envelope is a flat JSON record with snake_case field names and a
//! timestamp. Outbound envelopes are built from typed structs; inbound JSON
//! arrives as [`Envelope::Raw`] and must pass [`EnvelopeSchema::decode`]
//! (required-field check, then typed decode) before anything acts on it.

/// Implements [`EnvelopeSchema::extract`] for a variant wrapping the same-named struct.
macro_rules! extract_variant {
    ($variant:ident) => {
        fn extract(envelope: &$crate::envelope::Envelope) -> Option<&Self> {
            match envelope {
                $crate::envelope::Envelope::$variant(inner) => Some(inner),
                _ => None,
            }
        }
    };
}

mod alert;
mod control_command;
mod device_status;
mod sensor_reading;
mod system;

pub use alert::{Alert, AlertKind, AlertLevel};
pub use control_command::ControlCommand;
pub use device_status::DeviceStatus;
pub use sensor_reading::SensorReading;
pub use system::{BedInfo, FarmInfo, SystemHealth, SystemQuery, SystemStatus};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ValidationError;

/// Open parameter map carried by control commands.
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// Structural schema shared by every envelope type.
pub trait EnvelopeSchema: DeserializeOwned {
    /// Envelope name used in validation errors.
    const NAME: &'static str;

    /// Fields that must be present and non-null.
    const REQUIRED: &'static [&'static str];

    /// Borrow the typed variant out of an envelope, if it is one.
    fn extract(envelope: &Envelope) -> Option<&Self>;

    /// Check that `value` is an object carrying every required field.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotAnObject`] or
    /// [`ValidationError::MissingField`] for the first missing field.
    fn validate(value: &serde_json::Value) -> Result<(), ValidationError> {
        let object = value
            .as_object()
            .ok_or(ValidationError::NotAnObject {
                envelope: Self::NAME,
            })?;
        for &field in Self::REQUIRED {
            if object.get(field).is_none_or(serde_json::Value::is_null) {
                return Err(ValidationError::MissingField {
                    envelope: Self::NAME,
                    field,
                });
            }
        }
        Ok(())
    }

    /// Validate, then decode into the typed envelope.
    ///
    /// # Errors
    ///
    /// Returns the [`validate`](Self::validate) error, or
    /// [`ValidationError::Malformed`] when a field has the wrong type.
    fn decode(value: &serde_json::Value) -> Result<Self, ValidationError> {
        Self::validate(value)?;
        serde_json::from_value(value.clone()).map_err(|err| ValidationError::Malformed {
            envelope: Self::NAME,
            reason: err.to_string(),
        })
    }
}

/// Tagged union of every payload the fabric carries.
///
/// Serializes as the bare inner record, so subscribers and the message log
/// see exactly the documented field set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    SensorReading(SensorReading),
    ControlCommand(ControlCommand),
    DeviceStatus(DeviceStatus),
    Alert(Alert),
    SystemStatus(SystemStatus),
    SystemQuery(SystemQuery),
    FarmInfo(FarmInfo),
    BedInfo(BedInfo),
    /// Undecoded inbound JSON; validated by the consumer.
    Raw(serde_json::Value),
}

impl Envelope {
    /// Name of the variant, for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SensorReading(_) => SensorReading::NAME,
            Self::ControlCommand(_) => ControlCommand::NAME,
            Self::DeviceStatus(_) => DeviceStatus::NAME,
            Self::Alert(_) => Alert::NAME,
            Self::SystemStatus(_) => SystemStatus::NAME,
            Self::SystemQuery(_) => SystemQuery::NAME,
            Self::FarmInfo(_) => FarmInfo::NAME,
            Self::BedInfo(_) => BedInfo::NAME,
            Self::Raw(_) => "Raw",
        }
    }

    /// Parse a JSON text into a [`Envelope::Raw`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Malformed`] when `text` is not valid JSON.
    pub fn from_json(text: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(text)
            .map(Self::Raw)
            .map_err(|err| ValidationError::Malformed {
                envelope: "Raw",
                reason: err.to_string(),
            })
    }

    /// Serialize to a compact JSON string.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures (non-string map keys and the like).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Interpret the envelope as `T`: the matching typed variant is cloned,
    /// a raw payload is validated and decoded.
    ///
    /// Returns `None` when the envelope is a different typed variant, and
    /// `Some(Err(_))` when a raw payload fails validation.
    #[must_use]
    pub fn decode_as<T: EnvelopeSchema + Clone>(&self) -> Option<Result<T, ValidationError>> {
        if let Self::Raw(value) = self {
            return Some(T::decode(value));
        }
        T::extract(self).cloned().map(Ok)
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Envelope {
                fn from(value: $variant) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from_variant!(
    SensorReading,
    ControlCommand,
    DeviceStatus,
    Alert,
    SystemStatus,
    SystemQuery,
    FarmInfo,
    BedInfo,
);
