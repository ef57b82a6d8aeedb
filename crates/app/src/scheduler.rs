//! Telemetry scheduler — samples every sensor on a fixed interval and
//! publishes the readings.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use smartfarm_domain::topic::TopicScheme;

use crate::ports::TelemetrySource;
use crate::router::TopicRouter;

/// Shortest period the loop accepts; shorter requests are raised to it.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

struct Running {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Periodic publisher of sensor readings.
///
/// At most one tick runs at a time and late ticks are delayed rather than
/// bursted. Stopping never interrupts a tick in progress.
pub struct TelemetryScheduler<S> {
    source: Arc<S>,
    router: Arc<TopicRouter>,
    interval: Duration,
    scheme: TopicScheme,
    ticks: AtomicU64,
    tick_guard: Mutex<()>,
    running: Mutex<Option<Running>>,
}

impl<S: TelemetrySource + 'static> TelemetryScheduler<S> {
    #[must_use]
    pub fn new(
        source: Arc<S>,
        router: Arc<TopicRouter>,
        interval: Duration,
        scheme: TopicScheme,
    ) -> Self {
        let interval = if interval < MIN_INTERVAL {
            tracing::warn!(requested = ?interval, "telemetry interval too short, using the minimum");
            MIN_INTERVAL
        } else {
            interval
        };
        Self {
            source,
            router,
            interval,
            scheme,
            ticks: AtomicU64::new(0),
            tick_guard: Mutex::new(()),
            running: Mutex::new(None),
        }
    }

    /// Spawn the tick loop. Returns `false` if it was already running.
    ///
    /// The first tick fires one interval after start.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.is_some() {
            return false;
        }
        let (shutdown, receiver) = watch::channel(false);
        let handle = tokio::spawn(Arc::clone(self).run(receiver));
        *running = Some(Running { shutdown, handle });
        tracing::info!(
            interval = ?self.interval,
            scheme = ?self.scheme,
            "telemetry scheduler started"
        );
        true
    }

    /// Signal the loop to stop without waiting for it. Returns `false` if it
    /// was not running.
    pub fn stop(&self) -> bool {
        let Some(running) = self.take_running() else {
            return false;
        };
        let _ = running.shutdown.send(true);
        tracing::info!(ticks = self.ticks(), "telemetry scheduler stopped");
        true
    }

    /// Stop the loop and wait for the task to finish.
    pub async fn shutdown(&self) {
        let Some(running) = self.take_running() else {
            return;
        };
        let _ = running.shutdown.send(true);
        if let Err(err) = running.handle.await {
            tracing::warn!(%err, "telemetry task ended abnormally");
        }
        tracing::info!(ticks = self.ticks(), "telemetry scheduler shut down");
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of completed ticks.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Sample once and publish every reading. Offline sensors are skipped.
    ///
    /// Concurrent calls, including the loop's own, run one after another.
    /// Returns the number of readings published.
    pub fn tick(&self) -> usize {
        let _guard = self.tick_guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut published = 0;
        for sample in self.source.sample_all() {
            match sample {
                Ok(reading) => {
                    let topic = self.scheme.telemetry_topic(&reading);
                    self.router.publish(&topic, reading);
                    published += 1;
                }
                Err(err) => tracing::debug!(%err, "sensor skipped"),
            }
        }
        self.ticks.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(published, "telemetry tick complete");
        published
    }

    fn take_running(&self) -> Option<Running> {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval completes immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = interval.tick() => {
                    if *shutdown.borrow() {
                        break;
                    }
                    self.tick();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use smartfarm_domain::envelope::SensorReading;
    use smartfarm_domain::error::SmartFarmError;
    use smartfarm_domain::sensor::SensorKind;

    use crate::testing::FakeDevices;

    const INTERVAL: Duration = Duration::from_millis(5000);

    fn setup(scheme: TopicScheme) -> (Arc<FakeDevices>, Arc<TopicRouter>, Arc<TelemetryScheduler<FakeDevices>>) {
        let devices = Arc::new(FakeDevices::new());
        let router = Arc::new(TopicRouter::new(256));
        let scheduler = Arc::new(TelemetryScheduler::new(
            Arc::clone(&devices),
            Arc::clone(&router),
            INTERVAL,
            scheme,
        ));
        (devices, router, scheduler)
    }

    fn counter(router: &TopicRouter, pattern: &str) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        router
            .subscribe(pattern, move |topic, _| {
                sink.lock().unwrap().push(topic.to_string());
                Ok(())
            })
            .unwrap();
        seen
    }

    #[test]
    fn should_publish_one_reading_per_sensor_per_tick() {
        let (_, router, scheduler) = setup(TopicScheme::Legacy);
        let seen = counter(&router, "sensors/#");

        assert_eq!(scheduler.tick(), 2);
        assert_eq!(
            *seen.lock().unwrap(),
            ["sensors/farm_001/bed_001/temperature", "sensors/farm_001/bed_001/ph"]
        );
        assert_eq!(scheduler.ticks(), 1);
    }

    #[test]
    fn should_publish_on_canonical_topics() {
        let (_, router, scheduler) = setup(TopicScheme::Device);
        let seen = counter(&router, "farms/+/devices/+/telemetry");
        scheduler.tick();
        assert_eq!(seen.lock().unwrap()[0], "farms/farm_001/devices/bed_001-temperature/telemetry");
    }

    #[test]
    fn should_skip_offline_sensors() {
        let (devices, router, scheduler) = setup(TopicScheme::Legacy);
        let seen = counter(&router, "#");
        devices.set_sensor_online(SensorKind::Ph, false);

        assert_eq!(scheduler.tick(), 1);
        assert_eq!(*seen.lock().unwrap(), ["sensors/farm_001/bed_001/temperature"]);
    }

    #[tokio::test(start_paused = true)]
    async fn should_publish_exactly_once_per_elapsed_interval() {
        let (devices, router, scheduler) = setup(TopicScheme::Legacy);
        let seen = counter(&router, "sensors/+/+/+");

        assert!(scheduler.start());
        tokio::time::sleep(INTERVAL * 3 + Duration::from_millis(10)).await;
        scheduler.shutdown().await;

        assert_eq!(scheduler.ticks(), 3);
        assert_eq!(seen.lock().unwrap().len(), 3 * devices.sensor_count());

        tokio::time::sleep(INTERVAL * 4).await;
        assert_eq!(scheduler.ticks(), 3);
        assert_eq!(seen.lock().unwrap().len(), 3 * devices.sensor_count());
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_tick_before_the_first_interval() {
        let (_, _, scheduler) = setup(TopicScheme::Legacy);
        scheduler.start();
        tokio::time::sleep(INTERVAL - Duration::from_millis(1)).await;
        assert_eq!(scheduler.ticks(), 0);
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn should_treat_start_and_stop_as_idempotent() {
        let (_, _, scheduler) = setup(TopicScheme::Legacy);

        assert!(scheduler.start());
        assert!(!scheduler.start());
        assert!(scheduler.is_running());

        assert!(scheduler.stop());
        assert!(!scheduler.stop());
        assert!(!scheduler.is_running());
        scheduler.shutdown().await;

        tokio::time::sleep(INTERVAL * 2).await;
        assert_eq!(scheduler.ticks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_raise_zero_interval_to_minimum() {
        let devices = Arc::new(FakeDevices::new());
        let router = Arc::new(TopicRouter::new(16));
        let scheduler = Arc::new(TelemetryScheduler::new(
            devices,
            router,
            Duration::ZERO,
            TopicScheme::Legacy,
        ));
        assert_eq!(scheduler.interval(), MIN_INTERVAL);

        assert!(scheduler.start());
        tokio::time::sleep(MIN_INTERVAL * 5 + Duration::from_micros(500)).await;
        assert!(scheduler.is_running());
        scheduler.shutdown().await;
        assert!(scheduler.ticks() >= 5);
    }

    struct SlowSource {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl TelemetrySource for SlowSource {
        fn sample_all(&self) -> Vec<Result<SensorReading, SmartFarmError>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(5));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Vec::new()
        }
    }

    #[test]
    fn should_run_one_tick_at_a_time() {
        let source = Arc::new(SlowSource {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let scheduler = Arc::new(TelemetryScheduler::new(
            Arc::clone(&source),
            Arc::new(TopicRouter::new(16)),
            INTERVAL,
            TopicScheme::Legacy,
        ));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let scheduler = Arc::clone(&scheduler);
                std::thread::spawn(move || scheduler.tick())
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(scheduler.ticks(), 4);
        assert_eq!(source.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_restart_after_stop() {
        let (_, _, scheduler) = setup(TopicScheme::Legacy);
        scheduler.start();
        scheduler.shutdown().await;
        assert!(scheduler.start());
        tokio::time::sleep(INTERVAL + Duration::from_millis(1)).await;
        scheduler.shutdown().await;
        assert_eq!(scheduler.ticks(), 1);
    }
}
