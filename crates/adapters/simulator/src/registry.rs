//! Device registry — the farm → bed → device hierarchy of simulated hardware.
//!
//! A single mutex guards the whole hierarchy and the random source, so every
//! operation sees a consistent installation.

use std::sync::{Mutex, MutexGuard, PoisonError};

use smartfarm_app::ports::{DeviceCensus, DeviceDirectory, TelemetrySource};
use smartfarm_domain::actuator::ActuatorState;
use smartfarm_domain::envelope::{BedInfo, FarmInfo, Parameters, SensorReading};
use smartfarm_domain::error::{DeviceError, RegistryError, SmartFarmError};
use smartfarm_domain::farm::{Bed, CropInfo, Farm};
use smartfarm_domain::id::{BedId, DeviceId, FarmId};
use smartfarm_domain::sensor::{SensorKind, SensorState};

use crate::config::SimulatorConfig;
use crate::devices::{ActuatorSimulator, SensorSimulator};
use crate::templates;

struct BedEntry {
    bed: Bed,
    sensors: Vec<SensorSimulator>,
    actuators: Vec<ActuatorSimulator>,
}

impl BedEntry {
    fn new(bed: Bed) -> Self {
        let sensors = templates::sensor_specs()
            .into_iter()
            .map(|spec| SensorSimulator::new(bed.farm_id.clone(), bed.id.clone(), spec))
            .collect();
        let actuators = templates::ACTUATORS
            .iter()
            .map(|template| ActuatorSimulator::new(bed.farm_id.clone(), bed.id.clone(), template))
            .collect();
        Self {
            bed,
            sensors,
            actuators,
        }
    }

    fn is_active(&self) -> bool {
        self.sensors.iter().any(SensorSimulator::is_online)
            || self.actuators.iter().any(|a| a.state().is_online)
    }
}

struct Inner {
    farms: Vec<Farm>,
    beds: Vec<BedEntry>,
    rng: fastrand::Rng,
}

impl Inner {
    fn actuator_mut(&mut self, device_id: &DeviceId) -> Result<&mut ActuatorSimulator, DeviceError> {
        self.beds
            .iter_mut()
            .flat_map(|entry| entry.actuators.iter_mut())
            .find(|actuator| actuator.device_id() == device_id)
            .ok_or_else(|| DeviceError::NotFound {
                device_id: device_id.clone(),
            })
    }

    fn sensor_mut(
        &mut self,
        bed_id: &BedId,
        kind: SensorKind,
    ) -> Result<&mut SensorSimulator, DeviceError> {
        self.beds
            .iter_mut()
            .filter(|entry| &entry.bed.id == bed_id)
            .flat_map(|entry| entry.sensors.iter_mut())
            .find(|sensor| sensor.kind() == kind)
            .ok_or_else(|| DeviceError::SensorNotFound {
                bed_id: bed_id.clone(),
                sensor_type: kind.to_string(),
            })
    }
}

/// Registry of every simulated farm, bed, sensor and actuator.
pub struct DeviceRegistry {
    inner: Mutex<Inner>,
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

impl DeviceRegistry {
    /// An empty registry. `seed` makes sensor readings reproducible.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                farms: Vec::new(),
                beds: Vec::new(),
                rng: seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed),
            }),
        }
    }

    /// Build and seed a registry from configuration.
    ///
    /// # Errors
    ///
    /// Fails on invalid records, duplicate ids, or beds pointing at unknown farms.
    pub fn from_config(config: &SimulatorConfig) -> Result<Self, RegistryError> {
        let registry = Self::new(config.seed);
        for seed in &config.farms {
            let farm = Farm::new(seed.id.as_str(), seed.name.as_str())
                .map_err(RegistryError::InvalidRecord)?;
            registry.add_farm(farm)?;
        }
        for seed in &config.beds {
            let defaults = CropInfo::default();
            let bed = Bed::builder()
                .id(seed.id.as_str())
                .farm_id(seed.farm_id.as_str())
                .name(seed.name.as_str())
                .crop(
                    seed.crop_name.clone().unwrap_or(defaults.crop_name),
                    seed.growing_method.clone().unwrap_or(defaults.growing_method),
                )
                .build()
                .map_err(RegistryError::InvalidRecord)?;
            registry.add_bed(bed)?;
        }
        Ok(registry)
    }

    /// Register a farm.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidRecord`] if the farm fails validation,
    /// or [`RegistryError::DuplicateFarm`] if the id is taken.
    pub fn add_farm(&self, farm: Farm) -> Result<(), RegistryError> {
        farm.validate().map_err(RegistryError::InvalidRecord)?;
        let mut inner = self.lock();
        if inner.farms.iter().any(|existing| existing.id == farm.id) {
            return Err(RegistryError::DuplicateFarm(farm.id));
        }
        tracing::info!(farm_id = %farm.id, name = %farm.name, "farm added");
        inner.farms.push(farm);
        Ok(())
    }

    /// Register a bed and create its sensors and actuators.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidRecord`], [`RegistryError::UnknownFarm`]
    /// or [`RegistryError::DuplicateBed`].
    pub fn add_bed(&self, bed: Bed) -> Result<(), RegistryError> {
        bed.validate().map_err(RegistryError::InvalidRecord)?;
        let mut inner = self.lock();
        if !inner.farms.iter().any(|farm| farm.id == bed.farm_id) {
            return Err(RegistryError::UnknownFarm {
                bed_id: bed.id,
                farm_id: bed.farm_id,
            });
        }
        if inner.beds.iter().any(|entry| entry.bed.id == bed.id) {
            return Err(RegistryError::DuplicateBed(bed.id));
        }
        tracing::info!(bed_id = %bed.id, farm_id = %bed.farm_id, crop = %bed.crop.crop_name, "bed added");
        inner.beds.push(BedEntry::new(bed));
        Ok(())
    }

    /// Remove a bed together with all of its devices.
    pub fn remove_bed(&self, bed_id: &BedId) -> Option<Bed> {
        let mut inner = self.lock();
        let Some(index) = inner.beds.iter().position(|entry| &entry.bed.id == bed_id) else {
            tracing::warn!(%bed_id, "cannot remove unknown bed");
            return None;
        };
        let entry = inner.beds.remove(index);
        tracing::info!(
            %bed_id,
            sensors = entry.sensors.len(),
            actuators = entry.actuators.len(),
            "bed removed"
        );
        Some(entry.bed)
    }

    /// Current state of an actuator.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::NotFound`] for unknown ids.
    pub fn find_actuator(&self, device_id: &DeviceId) -> Result<ActuatorState, DeviceError> {
        self.lock()
            .actuator_mut(device_id)
            .map(|actuator| actuator.state().clone())
    }

    /// Current state of the sensor of `kind` on a bed.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::SensorNotFound`] when the bed or sensor is unknown.
    pub fn find_sensor(&self, bed_id: &BedId, kind: SensorKind) -> Result<SensorState, DeviceError> {
        self.lock()
            .sensor_mut(bed_id, kind)
            .map(|sensor| sensor.snapshot())
    }

    /// Apply an action to an actuator.
    ///
    /// # Errors
    ///
    /// Returns `DeviceNotFound` for unknown ids, otherwise whatever the
    /// actuator rejects the action with.
    pub fn control(
        &self,
        device_id: &DeviceId,
        action: &str,
        parameters: &Parameters,
    ) -> Result<ActuatorState, SmartFarmError> {
        self.lock()
            .actuator_mut(device_id)?
            .apply(action, parameters)
    }

    /// Produce a fresh reading from one sensor.
    ///
    /// # Errors
    ///
    /// Returns `DeviceNotFound` or `SensorOffline`.
    pub fn read_sensor(&self, bed_id: &BedId, kind: SensorKind) -> Result<SensorReading, DeviceError> {
        let mut inner = self.lock();
        let Inner { beds, rng, .. } = &mut *inner;
        beds.iter_mut()
            .filter(|entry| &entry.bed.id == bed_id)
            .flat_map(|entry| entry.sensors.iter_mut())
            .find(|sensor| sensor.kind() == kind)
            .ok_or_else(|| DeviceError::SensorNotFound {
                bed_id: bed_id.clone(),
                sensor_type: kind.to_string(),
            })?
            .produce_reading(rng)
    }

    /// Mark an actuator reachable or unreachable.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::NotFound`] for unknown ids.
    pub fn set_actuator_online(&self, device_id: &DeviceId, online: bool) -> Result<(), DeviceError> {
        self.lock().actuator_mut(device_id)?.set_online(online);
        tracing::info!(%device_id, online, "actuator reachability changed");
        Ok(())
    }

    /// Mark a sensor reachable or unreachable.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::SensorNotFound`] when the bed or sensor is unknown.
    pub fn set_sensor_online(
        &self,
        bed_id: &BedId,
        kind: SensorKind,
        online: bool,
    ) -> Result<(), DeviceError> {
        self.lock().sensor_mut(bed_id, kind)?.set_online(online);
        tracing::info!(%bed_id, sensor_type = %kind, online, "sensor reachability changed");
        Ok(())
    }

    /// Every actuator, optionally only those of one bed.
    #[must_use]
    pub fn actuators(&self, bed_id: Option<&BedId>) -> Vec<ActuatorState> {
        self.lock()
            .beds
            .iter()
            .filter(|entry| bed_id.is_none_or(|bed_id| &entry.bed.id == bed_id))
            .flat_map(|entry| entry.actuators.iter().map(|a| a.state().clone()))
            .collect()
    }

    /// The last reading of every sensor that has produced one.
    #[must_use]
    pub fn latest_readings(&self, bed_id: Option<&BedId>) -> Vec<SensorReading> {
        self.lock()
            .beds
            .iter()
            .filter(|entry| bed_id.is_none_or(|bed_id| &entry.bed.id == bed_id))
            .flat_map(|entry| entry.sensors.iter().filter_map(SensorSimulator::latest_reading))
            .collect()
    }

    /// Every bed, optionally only those of one farm.
    #[must_use]
    pub fn beds(&self, farm_id: Option<&FarmId>) -> Vec<Bed> {
        self.lock()
            .beds
            .iter()
            .filter(|entry| farm_id.is_none_or(|farm_id| &entry.bed.farm_id == farm_id))
            .map(|entry| entry.bed.clone())
            .collect()
    }

    #[must_use]
    pub fn farms(&self) -> Vec<Farm> {
        self.lock().farms.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DeviceDirectory for DeviceRegistry {
    fn execute(
        &self,
        device_id: &DeviceId,
        action: &str,
        parameters: &Parameters,
    ) -> Result<ActuatorState, SmartFarmError> {
        self.control(device_id, action, parameters)
    }

    fn actuators(&self, bed_id: Option<&BedId>) -> Vec<ActuatorState> {
        DeviceRegistry::actuators(self, bed_id)
    }

    fn farm_infos(&self) -> Vec<FarmInfo> {
        let inner = self.lock();
        inner
            .farms
            .iter()
            .map(|farm| {
                let beds: Vec<&BedEntry> = inner
                    .beds
                    .iter()
                    .filter(|entry| entry.bed.farm_id == farm.id)
                    .collect();
                let active = beds.iter().filter(|entry| entry.is_active()).count();
                let sensors = beds.iter().map(|entry| entry.sensors.len()).sum();
                FarmInfo::new(farm, beds.len(), active, sensors)
            })
            .collect()
    }

    fn bed_infos(&self, farm_id: Option<&FarmId>) -> Vec<BedInfo> {
        self.lock()
            .beds
            .iter()
            .filter(|entry| farm_id.is_none_or(|farm_id| &entry.bed.farm_id == farm_id))
            .map(|entry| BedInfo::new(&entry.bed, entry.sensors.len(), entry.actuators.len()))
            .collect()
    }

    fn census(&self) -> DeviceCensus {
        let inner = self.lock();
        let sensors = inner.beds.iter().flat_map(|entry| entry.sensors.iter());
        let actuators = inner.beds.iter().flat_map(|entry| entry.actuators.iter());
        DeviceCensus {
            farms: inner.farms.len(),
            beds: inner.beds.len(),
            sensors: sensors.clone().count(),
            online_sensors: sensors.filter(|sensor| sensor.is_online()).count(),
            actuators: actuators.clone().count(),
            online_actuators: actuators.filter(|a| a.state().is_online).count(),
        }
    }
}

impl TelemetrySource for DeviceRegistry {
    fn sample_all(&self) -> Vec<Result<SensorReading, SmartFarmError>> {
        let mut inner = self.lock();
        let Inner { beds, rng, .. } = &mut *inner;
        beds.iter_mut()
            .flat_map(|entry| entry.sensors.iter_mut())
            .map(|sensor| sensor.produce_reading(rng).map_err(SmartFarmError::from))
            .collect()
    }
}
