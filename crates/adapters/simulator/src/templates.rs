//! Fixed device set instantiated for every bed.
//!
//! Temperature and humidity ranges deliberately overlap the edge of their
//! comfort bands so the demo installation produces warning-quality readings.

use smartfarm_domain::actuator::ActuatorKind;
use smartfarm_domain::sensor::{SensorKind, SensorSpec};

/// Template for one actuator: bed-local id suffix, display name, category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorTemplate {
    pub local_id: &'static str,
    pub name: &'static str,
    pub kind: ActuatorKind,
}

/// Actuators every bed gets.
pub const ACTUATORS: [ActuatorTemplate; 4] = [
    ActuatorTemplate {
        local_id: "lamp1",
        name: "Lamp 1",
        kind: ActuatorKind::Light,
    },
    ActuatorTemplate {
        local_id: "lamp2",
        name: "Lamp 2",
        kind: ActuatorKind::Light,
    },
    ActuatorTemplate {
        local_id: "pump",
        name: "Pump",
        kind: ActuatorKind::Pump,
    },
    ActuatorTemplate {
        local_id: "fan",
        name: "Fan",
        kind: ActuatorKind::Fan,
    },
];

/// Sensor specs every bed gets, one per [`SensorKind`].
#[must_use]
pub fn sensor_specs() -> Vec<SensorSpec> {
    SensorKind::ALL.into_iter().map(sensor_spec).collect()
}

/// Range, unit and comfort band for a sensor kind.
#[must_use]
pub fn sensor_spec(kind: SensorKind) -> SensorSpec {
    let (min, max, unit, comfort) = match kind {
        SensorKind::Temperature => (35.0, 45.0, "\u{b0}C", Some((18.0, 35.0))),
        SensorKind::Humidity => (82.0, 95.0, "%", Some((40.0, 80.0))),
        SensorKind::Ec => (1.0, 2.5, "mS/cm", None),
        SensorKind::Ph => (5.5, 7.0, "pH", None),
        SensorKind::Light => (0.0, 1000.0, "lux", None),
        SensorKind::WaterTemp => (18.0, 25.0, "\u{b0}C", None),
    };
    SensorSpec {
        kind,
        min,
        max,
        unit: unit.to_string(),
        comfort,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_cover_every_sensor_kind_once() {
        let specs = sensor_specs();
        assert_eq!(specs.len(), SensorKind::ALL.len());
        for kind in SensorKind::ALL {
            assert_eq!(specs.iter().filter(|spec| spec.kind == kind).count(), 1);
        }
    }

    #[test]
    fn should_have_ordered_bounds() {
        for spec in sensor_specs() {
            assert!(spec.min < spec.max, "{} has inverted bounds", spec.kind);
        }
    }

    #[test]
    fn should_use_distinct_actuator_suffixes() {
        let mut ids: Vec<&str> = ACTUATORS.iter().map(|t| t.local_id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), ACTUATORS.len());
    }
}
