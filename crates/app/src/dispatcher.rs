//! Command dispatcher — turns inbound control and system envelopes into
//! device calls and publishes the outcome.
//!
//! | Listens on | Success | Failure |
//! |------------|---------|---------|
//! | `control/+/+/+` | `DeviceStatus` on `control/{farm}/{bed}/{device}/result` | `Alert` on `control/error` |
//! | `farms/+/devices/+/command` | `DeviceStatus` on `…/command/ack` and `…/state` | `Alert` on `…/command/ack` |
//! | `system/+` | inventory answers under `system/…` | logged and dropped |
//!
//! Every control command, valid or not, leaves a record in the
//! [`CommandHistory`].

use std::sync::{Arc, Mutex, PoisonError, Weak};

use smartfarm_domain::actuator::ActuatorState;
use smartfarm_domain::command::CommandRecord;
use smartfarm_domain::envelope::{
    Alert, AlertKind, ControlCommand, Envelope, SystemQuery, SystemStatus,
};
use smartfarm_domain::error::{SmartFarmError, ValidationError};
use smartfarm_domain::id::{BedId, DeviceId};
use smartfarm_domain::topic::{device, legacy};

use crate::command_history::CommandHistory;
use crate::ports::DeviceDirectory;
use crate::router::{SubscriptionId, TopicRouter};

/// Routes commands from the router to a [`DeviceDirectory`].
///
/// Holds the router weakly: the router owns the dispatcher's callbacks, so a
/// strong reference back would keep both alive forever.
pub struct CommandDispatcher<D> {
    router: Weak<TopicRouter>,
    devices: Arc<D>,
    history: Arc<CommandHistory>,
    subscriptions: Mutex<Vec<SubscriptionId>>,
}

impl<D: DeviceDirectory + 'static> CommandDispatcher<D> {
    #[must_use]
    pub fn new(router: &Arc<TopicRouter>, devices: Arc<D>, history: Arc<CommandHistory>) -> Self {
        Self {
            router: Arc::downgrade(router),
            devices,
            history,
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe to the control, command and system patterns.
    /// Attaching twice is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates pattern validation failures from the router.
    pub fn attach(self: &Arc<Self>) -> Result<(), SmartFarmError> {
        let mut subscriptions = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !subscriptions.is_empty() {
            return Ok(());
        }
        let Some(router) = self.router.upgrade() else {
            tracing::warn!("router dropped before the dispatcher attached");
            return Ok(());
        };

        let this = Arc::clone(self);
        subscriptions.push(router.subscribe(legacy::CONTROL_PATTERN, move |topic, envelope| {
            this.on_control(topic, envelope);
            Ok(())
        })?);
        let this = Arc::clone(self);
        subscriptions.push(router.subscribe(device::COMMAND_PATTERN, move |topic, envelope| {
            this.on_device_command(topic, envelope);
            Ok(())
        })?);
        let this = Arc::clone(self);
        subscriptions.push(router.subscribe(legacy::SYSTEM_PATTERN, move |topic, envelope| {
            this.on_system(topic, envelope);
            Ok(())
        })?);

        tracing::info!(subscriptions = subscriptions.len(), "command dispatcher attached");
        Ok(())
    }

    /// Remove every subscription added by [`attach`](Self::attach).
    pub fn detach(&self) {
        let ids = std::mem::take(
            &mut *self
                .subscriptions
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        if let Some(router) = self.router.upgrade() {
            for id in ids {
                router.unsubscribe(id);
            }
        }
    }

    /// Run a decoded command against the directory and record the outcome.
    ///
    /// # Errors
    ///
    /// Returns whatever the directory rejects the command with.
    #[tracing::instrument(skip(self, command), fields(device_id = %command.device_id, action = %command.action))]
    pub fn execute(&self, command: &ControlCommand) -> Result<ActuatorState, SmartFarmError> {
        let result = self
            .devices
            .execute(&command.device_id, &command.action, &command.parameters);
        match &result {
            Ok(state) => {
                tracing::info!(status = %state.status, intensity = state.intensity, "command applied");
                self.history.record(CommandRecord::succeeded(command));
            }
            Err(err) => {
                tracing::error!(%err, code = err.code(), "command failed");
                self.history.record(CommandRecord::failed(command, err));
            }
        }
        result
    }

    /// Current aggregate status of the installation.
    #[must_use]
    pub fn system_status(&self) -> SystemStatus {
        self.devices.census().to_status()
    }

    #[must_use]
    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    #[tracing::instrument(skip(self, envelope), fields(kind = envelope.kind()))]
    fn on_control(&self, topic: &str, envelope: &Envelope) {
        let Some(router) = self.router.upgrade() else {
            return;
        };
        let Some((farm_id, bed_id, device_id)) = legacy::parse_control(topic) else {
            return;
        };

        let command = match envelope.decode_as::<ControlCommand>() {
            None => {
                tracing::debug!("ignoring non-command envelope on control topic");
                return;
            }
            Some(Err(err)) => {
                let err = SmartFarmError::from(err);
                self.reject(device_id.clone(), raw_field(envelope, "action"), &err);
                let alert =
                    Alert::from_error(AlertKind::Control, &err, farm_id, bed_id, Some(device_id));
                router.publish(legacy::CONTROL_ERROR, alert);
                return;
            }
            Some(Ok(command)) => command,
        };

        match self.execute(&command) {
            Ok(state) => {
                let topic =
                    legacy::control_result(&command.farm_id, &command.bed_id, &command.device_id);
                router.publish(&topic, state.to_status());
            }
            Err(err) => {
                let alert = Alert::from_error(
                    AlertKind::Control,
                    &err,
                    command.farm_id,
                    command.bed_id,
                    Some(command.device_id),
                );
                router.publish(legacy::CONTROL_ERROR, alert);
            }
        }
    }

    #[tracing::instrument(skip(self, envelope), fields(kind = envelope.kind()))]
    fn on_device_command(&self, topic: &str, envelope: &Envelope) {
        let Some(router) = self.router.upgrade() else {
            return;
        };
        let Some((farm_id, device_id)) = device::parse_command(topic) else {
            return;
        };
        let ack = device::ack(&farm_id, &device_id);

        let command = match envelope.decode_as::<ControlCommand>() {
            None => {
                tracing::debug!("ignoring non-command envelope on command topic");
                return;
            }
            Some(Ok(command)) => command,
            Some(Err(err)) => {
                let err = SmartFarmError::from(err);
                self.reject(device_id.clone(), raw_field(envelope, "action"), &err);
                let bed_id = raw_field(envelope, "bed_id").map_or_else(|| BedId::new(""), BedId::from);
                let alert =
                    Alert::from_error(AlertKind::Control, &err, farm_id, bed_id, Some(device_id));
                router.publish(&ack, alert);
                return;
            }
        };
        if let Err(err) = addressed_to(&command, &device_id) {
            let err = SmartFarmError::from(err);
            self.reject(device_id.clone(), Some(command.action), &err);
            let alert = Alert::from_error(
                AlertKind::Control,
                &err,
                farm_id,
                command.bed_id,
                Some(device_id),
            );
            router.publish(&ack, alert);
            return;
        }

        match self.execute(&command) {
            Ok(state) => {
                let status = state.to_status();
                router.publish(&ack, status.clone());
                router.publish(&device::state(&farm_id, &device_id), status);
            }
            Err(err) => {
                let alert = Alert::from_error(
                    AlertKind::Control,
                    &err,
                    farm_id,
                    command.bed_id,
                    Some(device_id),
                );
                router.publish(&ack, alert);
            }
        }
    }

    #[tracing::instrument(skip(self, envelope), fields(kind = envelope.kind()))]
    fn on_system(&self, topic: &str, envelope: &Envelope) {
        let Some(router) = self.router.upgrade() else {
            return;
        };
        // Typed envelopes here are our own answers (`system/status`).
        let query = match envelope.decode_as::<SystemQuery>() {
            None => return,
            Some(Err(err)) => {
                tracing::warn!(%err, "ignoring malformed system query");
                return;
            }
            Some(Ok(query)) => query,
        };
        let Some(action) = query.action.as_deref().or_else(|| legacy::parse_system(topic)) else {
            return;
        };

        match action {
            "get_status" => {
                router.publish(legacy::SYSTEM_STATUS, self.system_status());
            }
            "get_farms" => {
                for info in self.devices.farm_infos() {
                    router.publish(&legacy::system_farm(&info.farm_id), info);
                }
            }
            "get_beds" => {
                for info in self.devices.bed_infos(query.farm_id.as_ref()) {
                    router.publish(&legacy::system_bed(&info.bed_id), info);
                }
            }
            "get_actuators" => {
                for state in self.devices.actuators(query.bed_id.as_ref()) {
                    router.publish(&legacy::system_actuator(&state.device_id), state.to_status());
                }
            }
            other => tracing::warn!(action = other, "ignoring unknown system action"),
        }
    }

    fn reject(&self, device_id: DeviceId, action: Option<String>, err: &SmartFarmError) {
        tracing::error!(%err, %device_id, "rejected malformed control command");
        self.history
            .record(CommandRecord::rejected(device_id, action, err));
    }
}

/// A canonical command must name the device its topic addresses.
fn addressed_to(command: &ControlCommand, device_id: &DeviceId) -> Result<(), ValidationError> {
    if &command.device_id == device_id {
        Ok(())
    } else {
        Err(ValidationError::InvalidField {
            envelope: "ControlCommand",
            field: "device_id",
            reason: format!("`{}` does not match topic device `{device_id}`", command.device_id),
        })
    }
}

fn raw_field(envelope: &Envelope, field: &str) -> Option<String> {
    match envelope {
        Envelope::Raw(value) => value
            .get(field)
            .and_then(serde_json::Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
