//! In-memory port implementations shared by the unit tests.

use std::sync::Mutex;

use smartfarm_domain::actuator::{ActuatorAction, ActuatorKind, ActuatorState, ActuatorStatus};
use smartfarm_domain::envelope::{BedInfo, FarmInfo, Parameters, SensorReading};
use smartfarm_domain::error::{DeviceError, SmartFarmError};
use smartfarm_domain::farm::{Bed, Farm};
use smartfarm_domain::id::{BedId, DeviceId, FarmId};
use smartfarm_domain::sensor::{ReadingQuality, SensorKind};
use smartfarm_domain::time::now;

use crate::ports::{DeviceCensus, DeviceDirectory, TelemetrySource};

/// One farm, one bed, two actuators and two sensors.
pub(crate) struct FakeDevices {
    farm: Farm,
    bed: Bed,
    actuators: Mutex<Vec<ActuatorState>>,
    sensors: Mutex<Vec<(SensorKind, bool)>>,
}

impl FakeDevices {
    pub(crate) fn new() -> Self {
        let farm = Farm::new("farm_001", "Farm 1").unwrap();
        let bed = Bed::builder()
            .id("bed_001")
            .farm_id("farm_001")
            .name("Bed 1")
            .build()
            .unwrap();
        let actuator = |local: &str, kind| ActuatorState {
            device_id: DeviceId::scoped(&bed.id, local),
            name: local.to_string(),
            kind,
            farm_id: farm.id.clone(),
            bed_id: bed.id.clone(),
            status: ActuatorStatus::Off,
            intensity: 0,
            is_online: true,
            last_update: now(),
        };
        let actuators = vec![
            actuator("lamp1", ActuatorKind::Light),
            actuator("pump", ActuatorKind::Pump),
        ];
        Self {
            actuators: Mutex::new(actuators),
            sensors: Mutex::new(vec![(SensorKind::Temperature, true), (SensorKind::Ph, true)]),
            farm,
            bed,
        }
    }

    pub(crate) fn set_actuator_online(&self, device_id: &str, online: bool) {
        for actuator in self.actuators.lock().unwrap().iter_mut() {
            if actuator.device_id.as_str() == device_id {
                actuator.is_online = online;
            }
        }
    }

    pub(crate) fn set_sensor_online(&self, kind: SensorKind, online: bool) {
        for sensor in self.sensors.lock().unwrap().iter_mut() {
            if sensor.0 == kind {
                sensor.1 = online;
            }
        }
    }

    pub(crate) fn sensor_count(&self) -> usize {
        self.sensors.lock().unwrap().len()
    }
}

impl DeviceDirectory for FakeDevices {
    fn execute(
        &self,
        device_id: &DeviceId,
        action: &str,
        parameters: &Parameters,
    ) -> Result<ActuatorState, SmartFarmError> {
        let mut actuators = self.actuators.lock().unwrap();
        let actuator = actuators
            .iter_mut()
            .find(|actuator| &actuator.device_id == device_id)
            .ok_or_else(|| DeviceError::NotFound {
                device_id: device_id.clone(),
            })?;
        if !actuator.is_online {
            return Err(DeviceError::Offline {
                device_id: device_id.clone(),
            }
            .into());
        }
        match ActuatorAction::parse(action, parameters)? {
            ActuatorAction::TurnOn { intensity } => {
                actuator.status = ActuatorStatus::On;
                actuator.intensity = intensity.unwrap_or(100);
            }
            ActuatorAction::TurnOff => {
                actuator.status = ActuatorStatus::Off;
                actuator.intensity = 0;
            }
            ActuatorAction::SetIntensity { .. } if actuator.status == ActuatorStatus::Off => {
                return Err(DeviceError::ActuatorNotOn {
                    device_id: device_id.clone(),
                }
                .into());
            }
            ActuatorAction::SetIntensity { intensity } => actuator.intensity = intensity,
            ActuatorAction::Toggle => {
                actuator.status = actuator.status.flipped();
                if actuator.status == ActuatorStatus::Off {
                    actuator.intensity = 0;
                }
            }
        }
        Ok(actuator.clone())
    }

    fn actuators(&self, bed_id: Option<&BedId>) -> Vec<ActuatorState> {
        self.actuators
            .lock()
            .unwrap()
            .iter()
            .filter(|actuator| bed_id.is_none_or(|bed_id| &actuator.bed_id == bed_id))
            .cloned()
            .collect()
    }

    fn farm_infos(&self) -> Vec<FarmInfo> {
        vec![FarmInfo::new(&self.farm, 1, 1, self.sensor_count())]
    }

    fn bed_infos(&self, farm_id: Option<&FarmId>) -> Vec<BedInfo> {
        if farm_id.is_some_and(|farm_id| farm_id != &self.farm.id) {
            return Vec::new();
        }
        vec![BedInfo::new(&self.bed, self.sensor_count(), 2)]
    }

    fn census(&self) -> DeviceCensus {
        let actuators = self.actuators.lock().unwrap();
        let sensors = self.sensors.lock().unwrap();
        DeviceCensus {
            farms: 1,
            beds: 1,
            sensors: sensors.len(),
            online_sensors: sensors.iter().filter(|(_, online)| *online).count(),
            actuators: actuators.len(),
            online_actuators: actuators.iter().filter(|a| a.is_online).count(),
        }
    }
}

impl TelemetrySource for FakeDevices {
    fn sample_all(&self) -> Vec<Result<SensorReading, SmartFarmError>> {
        self.sensors
            .lock()
            .unwrap()
            .iter()
            .map(|&(kind, online)| {
                if !online {
                    return Err(DeviceError::SensorOffline {
                        bed_id: self.bed.id.clone(),
                        sensor_type: kind.to_string(),
                    }
                    .into());
                }
                Ok(SensorReading {
                    farm_id: self.farm.id.clone(),
                    bed_id: self.bed.id.clone(),
                    sensor_type: kind,
                    value: 21.5,
                    unit: "u".to_string(),
                    timestamp: now(),
                    quality: ReadingQuality::Good,
                })
            })
            .collect()
    }
}
