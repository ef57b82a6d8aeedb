//! Actuator simulator — on/off state machine with an intensity level.

use smartfarm_domain::actuator::{ActuatorAction, ActuatorState, ActuatorStatus, MAX_INTENSITY};
use smartfarm_domain::envelope::Parameters;
use smartfarm_domain::error::{DeviceError, SmartFarmError};
use smartfarm_domain::id::{BedId, DeviceId, FarmId};
use smartfarm_domain::time::now;

use crate::templates::ActuatorTemplate;

/// A simulated actuator attached to one bed.
///
/// Intensity is always 0 while the actuator is off.
#[derive(Debug, Clone)]
pub struct ActuatorSimulator {
    state: ActuatorState,
}

impl ActuatorSimulator {
    /// An online, switched-off actuator whose id is scoped to `bed_id`.
    #[must_use]
    pub fn new(farm_id: FarmId, bed_id: BedId, template: &ActuatorTemplate) -> Self {
        Self {
            state: ActuatorState {
                device_id: DeviceId::scoped(&bed_id, template.local_id),
                name: template.name.to_string(),
                kind: template.kind,
                farm_id,
                bed_id,
                status: ActuatorStatus::Off,
                intensity: 0,
                is_online: true,
                last_update: now(),
            },
        }
    }

    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.state.device_id
    }

    #[must_use]
    pub fn bed_id(&self) -> &BedId {
        &self.state.bed_id
    }

    #[must_use]
    pub fn state(&self) -> &ActuatorState {
        &self.state
    }

    pub fn set_online(&mut self, online: bool) {
        self.state.is_online = online;
        self.state.last_update = now();
    }

    /// Apply a named action and return the resulting state.
    ///
    /// An offline actuator rejects everything before the action is even
    /// parsed. Otherwise `last_update` is refreshed whether or not the
    /// action succeeds.
    ///
    /// # Errors
    ///
    /// - `DeviceOffline` when the actuator is offline
    /// - `UnsupportedAction` for names outside the vocabulary
    /// - `ActuatorNotOn` for an intensity change while off
    /// - `EnvelopeValidationFailed` for unusable parameters
    pub fn apply(
        &mut self,
        action: &str,
        parameters: &Parameters,
    ) -> Result<ActuatorState, SmartFarmError> {
        if !self.state.is_online {
            return Err(DeviceError::Offline {
                device_id: self.state.device_id.clone(),
            }
            .into());
        }
        self.state.last_update = now();
        let action = ActuatorAction::parse(action, parameters)?;
        tracing::debug!(device_id = %self.state.device_id, action = action.name(), "applying action");
        self.transition(action)?;
        Ok(self.state.clone())
    }

    fn transition(&mut self, action: ActuatorAction) -> Result<(), DeviceError> {
        let state = &mut self.state;
        match action {
            ActuatorAction::TurnOn { intensity } => {
                state.status = ActuatorStatus::On;
                state.intensity = intensity.unwrap_or(MAX_INTENSITY);
            }
            ActuatorAction::TurnOff => {
                state.status = ActuatorStatus::Off;
                state.intensity = 0;
            }
            ActuatorAction::SetIntensity { intensity } => {
                if state.status != ActuatorStatus::On {
                    return Err(DeviceError::ActuatorNotOn {
                        device_id: state.device_id.clone(),
                    });
                }
                state.intensity = intensity;
            }
            ActuatorAction::Toggle => {
                state.status = state.status.flipped();
                if state.status == ActuatorStatus::Off {
                    state.intensity = 0;
                }
            }
        }
        Ok(())
    }
}
