//! Fabric — one router, dispatcher, history and scheduler wired around a
//! single device backend.

use std::sync::Arc;
use std::time::Duration;

use smartfarm_domain::envelope::{ControlCommand, SystemQuery};
use smartfarm_domain::error::SmartFarmError;
use smartfarm_domain::topic::{TopicScheme, device, legacy};

use crate::command_history::CommandHistory;
use crate::dispatcher::CommandDispatcher;
use crate::ports::{DeviceDirectory, TelemetrySource};
use crate::router::TopicRouter;
use crate::scheduler::TelemetryScheduler;

/// Sizing and timing knobs for a [`Fabric`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FabricSettings {
    pub log_capacity: usize,
    pub history_capacity: usize,
    pub telemetry_interval: Duration,
    pub telemetry_scheme: TopicScheme,
}

impl Default for FabricSettings {
    fn default() -> Self {
        Self {
            log_capacity: 1000,
            history_capacity: 1000,
            telemetry_interval: Duration::from_millis(5000),
            telemetry_scheme: TopicScheme::Legacy,
        }
    }
}

/// The messaging fabric for one installation.
///
/// Independent fabrics share nothing, so several can live in one process.
pub struct Fabric<D> {
    devices: Arc<D>,
    router: Arc<TopicRouter>,
    history: Arc<CommandHistory>,
    dispatcher: Arc<CommandDispatcher<D>>,
    scheduler: Arc<TelemetryScheduler<D>>,
}

impl<D> Fabric<D>
where
    D: DeviceDirectory + TelemetrySource + 'static,
{
    /// Wire the components and attach the dispatcher. Telemetry does not
    /// run until [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// Returns an error if the dispatcher cannot subscribe.
    pub fn new(devices: Arc<D>, settings: &FabricSettings) -> Result<Self, SmartFarmError> {
        let router = Arc::new(TopicRouter::new(settings.log_capacity));
        let history = Arc::new(CommandHistory::new(settings.history_capacity));
        let dispatcher = Arc::new(CommandDispatcher::new(
            &router,
            Arc::clone(&devices),
            Arc::clone(&history),
        ));
        dispatcher.attach()?;
        let scheduler = Arc::new(TelemetryScheduler::new(
            Arc::clone(&devices),
            Arc::clone(&router),
            settings.telemetry_interval,
            settings.telemetry_scheme,
        ));

        Ok(Self {
            devices,
            router,
            history,
            dispatcher,
            scheduler,
        })
    }

    /// Start periodic telemetry. Returns `false` if already running.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn start(&self) -> bool {
        self.scheduler.start()
    }

    /// Publish a control command on its legacy control topic.
    ///
    /// Returns the number of subscribers reached.
    pub fn send_command(&self, command: ControlCommand) -> usize {
        let topic = legacy::control(&command.farm_id, &command.bed_id, &command.device_id);
        self.router.publish(&topic, command)
    }

    /// Announce every actuator on its device registry topic.
    ///
    /// Returns the number of announcements published.
    pub fn announce_devices(&self) -> usize {
        let actuators = self.devices.actuators(None);
        for state in &actuators {
            let topic = device::registry(&state.farm_id, &state.device_id);
            self.router.publish(&topic, state.to_status());
        }
        actuators.len()
    }

    /// Publish a system query on `system/{action}`.
    pub fn query(&self, query: SystemQuery) -> usize {
        let topic = legacy::system(query.action.as_deref().unwrap_or_default());
        self.router.publish(&topic, query)
    }

    /// Stop telemetry, detach the dispatcher and disconnect the router.
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
        self.dispatcher.detach();
        self.router.disconnect();
    }

    #[must_use]
    pub fn router(&self) -> &Arc<TopicRouter> {
        &self.router
    }

    #[must_use]
    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Arc<CommandDispatcher<D>> {
        &self.dispatcher
    }

    #[must_use]
    pub fn scheduler(&self) -> &Arc<TelemetryScheduler<D>> {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use smartfarm_domain::envelope::Parameters;
    use smartfarm_domain::id::{BedId, DeviceId, FarmId};

    use crate::testing::FakeDevices;

    fn fabric() -> Fabric<FakeDevices> {
        Fabric::new(Arc::new(FakeDevices::new()), &FabricSettings::default()).unwrap()
    }

    fn lamp_on() -> ControlCommand {
        ControlCommand::new(
            FarmId::from("farm_001"),
            BedId::from("bed_001"),
            DeviceId::from("bed_001-lamp1"),
            "turn_on",
            Parameters::new(),
        )
    }

    #[test]
    fn should_route_commands_through_the_dispatcher() {
        let fabric = fabric();
        assert_eq!(fabric.send_command(lamp_on()), 1);
        assert_eq!(fabric.history().len(), 1);
        assert!(fabric.history().all()[0].success);
        let topics: Vec<String> = fabric
            .router()
            .recent_messages(10)
            .into_iter()
            .map(|m| m.topic)
            .collect();
        assert_eq!(
            topics,
            [
                "control/farm_001/bed_001/bed_001-lamp1",
                "control/farm_001/bed_001/bed_001-lamp1/result"
            ]
        );
    }

    #[test]
    fn should_publish_queries_on_their_action_topic() {
        let fabric = fabric();
        fabric.query(SystemQuery::new("get_status"));
        let topics: Vec<String> = fabric
            .router()
            .recent_messages(10)
            .into_iter()
            .map(|m| m.topic)
            .collect();
        assert_eq!(topics, ["system/get_status", "system/status"]);
    }

    #[test]
    fn should_announce_actuators_on_registry_topics() {
        let fabric = fabric();
        assert_eq!(fabric.announce_devices(), 2);
        let topics: Vec<String> = fabric
            .router()
            .recent_messages(10)
            .into_iter()
            .map(|m| m.topic)
            .collect();
        assert_eq!(
            topics,
            [
                "farms/farm_001/devices/bed_001-lamp1/registry",
                "farms/farm_001/devices/bed_001-pump/registry"
            ]
        );
    }

    #[test]
    fn should_never_configure_a_zero_telemetry_interval() {
        let settings = FabricSettings {
            telemetry_interval: Duration::ZERO,
            ..FabricSettings::default()
        };
        let fabric = Fabric::new(Arc::new(FakeDevices::new()), &settings).unwrap();
        assert_eq!(fabric.scheduler().interval(), crate::scheduler::MIN_INTERVAL);
    }

    #[test]
    fn should_keep_fabrics_isolated() {
        let first = fabric();
        let second = fabric();
        first.send_command(lamp_on());
        assert_eq!(first.history().len(), 1);
        assert!(second.history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_stop_everything_on_shutdown() {
        let fabric = fabric();
        assert!(fabric.start());
        tokio::time::sleep(Duration::from_millis(5001)).await;
        fabric.shutdown().await;

        assert_eq!(fabric.scheduler().ticks(), 1);
        assert!(!fabric.router().status().connected);
        assert_eq!(fabric.send_command(lamp_on()), 0);
        assert!(fabric.history().is_empty());
    }
}
