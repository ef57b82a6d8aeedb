//! Device directory port — actuator control and inventory lookups.

use std::sync::Arc;

use smartfarm_domain::actuator::ActuatorState;
use smartfarm_domain::envelope::{BedInfo, FarmInfo, Parameters, SystemHealth, SystemStatus};
use smartfarm_domain::error::SmartFarmError;
use smartfarm_domain::id::{BedId, DeviceId, FarmId};
use smartfarm_domain::time::now;

/// Registry of controllable devices, as seen by the dispatcher.
pub trait DeviceDirectory: Send + Sync {
    /// Apply `action` to the actuator `device_id` and return its new state.
    ///
    /// # Errors
    ///
    /// Returns `DeviceNotFound` for unknown ids and whatever the actuator
    /// rejects the action with (`DeviceOffline`, `ActuatorNotOn`,
    /// `UnsupportedAction`, validation failures).
    fn execute(
        &self,
        device_id: &DeviceId,
        action: &str,
        parameters: &Parameters,
    ) -> Result<ActuatorState, SmartFarmError>;

    /// Snapshot of every actuator, optionally restricted to one bed.
    fn actuators(&self, bed_id: Option<&BedId>) -> Vec<ActuatorState>;

    /// Inventory summary of every farm.
    fn farm_infos(&self) -> Vec<FarmInfo>;

    /// Inventory summary of every bed, optionally restricted to one farm.
    fn bed_infos(&self, farm_id: Option<&FarmId>) -> Vec<BedInfo>;

    /// Device counters for the whole installation.
    fn census(&self) -> DeviceCensus;
}

impl<T: DeviceDirectory + ?Sized> DeviceDirectory for Arc<T> {
    fn execute(
        &self,
        device_id: &DeviceId,
        action: &str,
        parameters: &Parameters,
    ) -> Result<ActuatorState, SmartFarmError> {
        (**self).execute(device_id, action, parameters)
    }

    fn actuators(&self, bed_id: Option<&BedId>) -> Vec<ActuatorState> {
        (**self).actuators(bed_id)
    }

    fn farm_infos(&self) -> Vec<FarmInfo> {
        (**self).farm_infos()
    }

    fn bed_infos(&self, farm_id: Option<&FarmId>) -> Vec<BedInfo> {
        (**self).bed_infos(farm_id)
    }

    fn census(&self) -> DeviceCensus {
        (**self).census()
    }
}

/// Device counters used to answer `get_status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceCensus {
    pub farms: usize,
    pub beds: usize,
    pub sensors: usize,
    pub online_sensors: usize,
    pub actuators: usize,
    pub online_actuators: usize,
}

impl DeviceCensus {
    /// `good` when everything is reachable, `error` when nothing is,
    /// `warning` in between.
    #[must_use]
    pub fn health(&self) -> SystemHealth {
        let devices = self.sensors + self.actuators;
        let online = self.online_sensors + self.online_actuators;
        if online == devices {
            SystemHealth::Good
        } else if online == 0 {
            SystemHealth::Error
        } else {
            SystemHealth::Warning
        }
    }

    /// Render as a `SystemStatus` envelope body stamped now.
    #[must_use]
    pub fn to_status(&self) -> SystemStatus {
        SystemStatus {
            total_farms: self.farms,
            total_beds: self.beds,
            active_sensors: self.online_sensors,
            online_actuators: self.online_actuators,
            system_health: self.health(),
            timestamp: now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn census(online_sensors: usize, online_actuators: usize) -> DeviceCensus {
        DeviceCensus {
            farms: 1,
            beds: 1,
            sensors: 6,
            online_sensors,
            actuators: 4,
            online_actuators,
        }
    }

    #[test]
    fn should_report_good_when_everything_is_online() {
        assert_eq!(census(6, 4).health(), SystemHealth::Good);
    }

    #[test]
    fn should_report_warning_when_one_device_is_offline() {
        assert_eq!(census(6, 3).health(), SystemHealth::Warning);
        assert_eq!(census(5, 4).health(), SystemHealth::Warning);
    }

    #[test]
    fn should_report_error_when_nothing_is_online() {
        assert_eq!(census(0, 0).health(), SystemHealth::Error);
    }

    #[test]
    fn should_report_good_for_empty_installation() {
        assert_eq!(DeviceCensus::default().health(), SystemHealth::Good);
    }

    #[test]
    fn should_map_counters_into_status() {
        let status = census(5, 2).to_status();
        assert_eq!(status.total_farms, 1);
        assert_eq!(status.total_beds, 1);
        assert_eq!(status.active_sensors, 5);
        assert_eq!(status.online_actuators, 2);
        assert_eq!(status.system_health, SystemHealth::Warning);
    }
}
