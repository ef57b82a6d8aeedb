//! Topics — `/`-delimited channel names, subscription patterns, and the two
//! naming schemes devices use.
//!
//! Pattern rules:
//! - a literal segment matches the same text at that position;
//! - `+` matches exactly one segment;
//! - `#` (final segment only) matches one or more remaining segments,
//!   so `farms/f1/#` matches `farms/f1/state` but not `farms/f1`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::envelope::SensorReading;
use crate::error::ValidationError;
use crate::id::{BedId, DeviceId, FarmId};

const SINGLE: &str = "+";
const MULTI: &str = "#";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Single,
    Multi,
}

/// A parsed subscription pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl TopicPattern {
    /// Parse and validate a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTopicPattern`] when the pattern is
    /// empty, `#` is not the last segment, or a wildcard shares a segment
    /// with other characters.
    pub fn parse(pattern: &str) -> Result<Self, ValidationError> {
        let invalid = |reason| ValidationError::InvalidTopicPattern {
            pattern: pattern.to_string(),
            reason,
        };
        if pattern.is_empty() {
            return Err(invalid("pattern must not be empty"));
        }

        let parts: Vec<&str> = pattern.split('/').collect();
        let last = parts.len() - 1;
        let mut segments = Vec::with_capacity(parts.len());
        for (index, part) in parts.into_iter().enumerate() {
            let segment = match part {
                SINGLE => Segment::Single,
                MULTI if index == last => Segment::Multi,
                MULTI => return Err(invalid("`#` is only allowed as the last segment")),
                literal if literal.contains(['+', '#']) => {
                    return Err(invalid("wildcards must occupy a whole segment"));
                }
                literal => Segment::Literal(literal.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// The pattern as it was written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the pattern contains any wildcard segment.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| !matches!(segment, Segment::Literal(_)))
    }

    /// Whether a concrete `topic` is selected by this pattern.
    #[must_use]
    pub fn matches(&self, topic: &str) -> bool {
        if self.raw == topic {
            return true;
        }
        let mut parts = topic.split('/');
        for segment in &self.segments {
            match segment {
                Segment::Multi => return parts.next().is_some(),
                Segment::Single => {
                    if parts.next().is_none() {
                        return false;
                    }
                }
                Segment::Literal(literal) => {
                    if parts.next() != Some(literal.as_str()) {
                        return false;
                    }
                }
            }
        }
        parts.next().is_none()
    }
}

impl FromStr for TopicPattern {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TopicPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Which naming scheme telemetry is published under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicScheme {
    /// `sensors/{farm}/{bed}/{type}`.
    #[default]
    Legacy,
    /// `farms/{farm}/devices/{bed}-{type}/telemetry`.
    Device,
}

impl TopicScheme {
    /// Telemetry topic for a reading under this scheme.
    #[must_use]
    pub fn telemetry_topic(self, reading: &SensorReading) -> String {
        match self {
            Self::Legacy => legacy::sensor(&reading.farm_id, &reading.bed_id, reading.sensor_type.as_str()),
            Self::Device => {
                let device_id = DeviceId::scoped(&reading.bed_id, reading.sensor_type.as_str());
                device::telemetry(&reading.farm_id, &device_id)
            }
        }
    }
}

/// Bed-oriented scheme used by the simulator.
pub mod legacy {
    use super::{BedId, DeviceId, FarmId};

    /// Pattern the dispatcher listens on for control commands.
    pub const CONTROL_PATTERN: &str = "control/+/+/+";
    /// Pattern the dispatcher listens on for system queries.
    pub const SYSTEM_PATTERN: &str = "system/+";
    /// Topic dispatch failures are reported on.
    pub const CONTROL_ERROR: &str = "control/error";
    /// Topic `get_status` answers are published on.
    pub const SYSTEM_STATUS: &str = "system/status";

    #[must_use]
    pub fn sensor(farm_id: &FarmId, bed_id: &BedId, sensor_type: &str) -> String {
        format!("sensors/{farm_id}/{bed_id}/{sensor_type}")
    }

    #[must_use]
    pub fn control(farm_id: &FarmId, bed_id: &BedId, device_id: &DeviceId) -> String {
        format!("control/{farm_id}/{bed_id}/{device_id}")
    }

    #[must_use]
    pub fn control_result(farm_id: &FarmId, bed_id: &BedId, device_id: &DeviceId) -> String {
        format!("control/{farm_id}/{bed_id}/{device_id}/result")
    }

    #[must_use]
    pub fn system(action: &str) -> String {
        format!("system/{action}")
    }

    #[must_use]
    pub fn system_farm(farm_id: &FarmId) -> String {
        format!("system/farms/{farm_id}")
    }

    #[must_use]
    pub fn system_bed(bed_id: &BedId) -> String {
        format!("system/beds/{bed_id}")
    }

    #[must_use]
    pub fn system_actuator(device_id: &DeviceId) -> String {
        format!("system/actuators/{device_id}")
    }

    /// Split `control/{farm}/{bed}/{device}` into its ids.
    #[must_use]
    pub fn parse_control(topic: &str) -> Option<(FarmId, BedId, DeviceId)> {
        let mut parts = topic.split('/');
        if parts.next()? != "control" {
            return None;
        }
        let farm = parts.next()?;
        let bed = parts.next()?;
        let device = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        Some((farm.into(), bed.into(), device.into()))
    }

    /// The `{action}` segment of `system/{action}`.
    #[must_use]
    pub fn parse_system(topic: &str) -> Option<&str> {
        topic
            .strip_prefix("system/")
            .filter(|rest| !rest.is_empty() && !rest.contains('/'))
    }
}

/// Canonical device-oriented scheme: `farms/{farm}/devices/{device}/{type}`.
pub mod device {
    use super::{DeviceId, FarmId};

    /// Pattern the dispatcher listens on for canonical commands.
    pub const COMMAND_PATTERN: &str = "farms/+/devices/+/command";

    #[must_use]
    pub fn registry(farm_id: &FarmId, device_id: &DeviceId) -> String {
        format!("farms/{farm_id}/devices/{device_id}/registry")
    }

    #[must_use]
    pub fn state(farm_id: &FarmId, device_id: &DeviceId) -> String {
        format!("farms/{farm_id}/devices/{device_id}/state")
    }

    #[must_use]
    pub fn telemetry(farm_id: &FarmId, device_id: &DeviceId) -> String {
        format!("farms/{farm_id}/devices/{device_id}/telemetry")
    }

    #[must_use]
    pub fn command(farm_id: &FarmId, device_id: &DeviceId) -> String {
        format!("farms/{farm_id}/devices/{device_id}/command")
    }

    #[must_use]
    pub fn ack(farm_id: &FarmId, device_id: &DeviceId) -> String {
        format!("farms/{farm_id}/devices/{device_id}/command/ack")
    }

    /// Split `farms/{farm}/devices/{device}/command` into its ids.
    #[must_use]
    pub fn parse_command(topic: &str) -> Option<(FarmId, DeviceId)> {
        let parts: Vec<&str> = topic.split('/').collect();
        match parts.as_slice() {
            ["farms", farm, "devices", device, "command"] => {
                Some(((*farm).into(), (*device).into()))
            }
            _ => None,
        }
    }
}
