//! In-process topic router with MQTT-style wildcard subscriptions.
//!
//! Publishing is synchronous: every matching callback runs on the caller's
//! thread, in registration order, before [`TopicRouter::publish`] returns.
//! Callbacks may publish or subscribe themselves; the subscription list is
//! snapshotted and released before any callback runs.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use smartfarm_domain::envelope::Envelope;
use smartfarm_domain::error::SmartFarmError;
use smartfarm_domain::topic::TopicPattern;

use crate::message_log::{LoggedMessage, MessageLog};

/// Subscriber callback, invoked with the concrete topic and the envelope.
pub type Callback = Arc<dyn Fn(&str, &Envelope) -> Result<(), SmartFarmError> + Send + Sync>;

/// Opaque handle returned by [`TopicRouter::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    pattern: TopicPattern,
    callback: Callback,
}

/// Connection flag, active patterns and traffic counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterStatus {
    pub connected: bool,
    pub subscriptions: Vec<String>,
    pub total_messages: u64,
    pub log_capacity: usize,
}

/// Wildcard publish/subscribe broker.
pub struct TopicRouter {
    subscriptions: RwLock<Vec<Subscription>>,
    log: MessageLog,
    next_id: AtomicU64,
    connected: AtomicBool,
}

impl TopicRouter {
    /// Create a connected router whose message log keeps `log_capacity` entries.
    #[must_use]
    pub fn new(log_capacity: usize) -> Self {
        Self {
            subscriptions: RwLock::new(Vec::new()),
            log: MessageLog::new(log_capacity),
            next_id: AtomicU64::new(1),
            connected: AtomicBool::new(true),
        }
    }

    /// Register `callback` for every topic matching `pattern`.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `pattern` is malformed
    /// (`#` before the last segment, wildcards inside a segment).
    pub fn subscribe<F>(&self, pattern: &str, callback: F) -> Result<SubscriptionId, SmartFarmError>
    where
        F: Fn(&str, &Envelope) -> Result<(), SmartFarmError> + Send + Sync + 'static,
    {
        let pattern = TopicPattern::parse(pattern)?;
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(pattern = %pattern, "subscription added");
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscription {
                id,
                pattern,
                callback: Arc::new(callback),
            });
        Ok(id)
    }

    /// Remove a subscription. Returns `false` when the handle is unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscriptions.len();
        subscriptions.retain(|subscription| subscription.id != id);
        before != subscriptions.len()
    }

    /// Deliver `envelope` to every subscriber whose pattern matches `topic`.
    ///
    /// Returns the number of callbacks invoked. A callback that fails or
    /// panics is logged and counted; the remaining subscribers still run.
    /// Publishing on a disconnected router is a no-op returning 0.
    pub fn publish(&self, topic: &str, envelope: impl Into<Envelope>) -> usize {
        if !self.is_connected() {
            tracing::debug!(topic, "router disconnected, message dropped");
            return 0;
        }
        let envelope = envelope.into();
        self.log.record(topic, &envelope);

        let targets: Vec<Callback> = self
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|subscription| subscription.pattern.matches(topic))
            .map(|subscription| Arc::clone(&subscription.callback))
            .collect();

        for callback in &targets {
            match catch_unwind(AssertUnwindSafe(|| callback(topic, &envelope))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::error!(%err, topic, "subscriber failed to handle message");
                }
                Err(_) => tracing::error!(topic, "subscriber panicked while handling message"),
            }
        }

        tracing::debug!(topic, kind = envelope.kind(), delivered = targets.len(), "message published");
        targets.len()
    }

    /// The last `limit` published messages, oldest first.
    #[must_use]
    pub fn recent_messages(&self, limit: usize) -> Vec<LoggedMessage> {
        self.log.recent(limit)
    }

    #[must_use]
    pub fn status(&self) -> RouterStatus {
        let subscriptions = self
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|subscription| subscription.pattern.to_string())
            .collect();
        RouterStatus {
            connected: self.is_connected(),
            subscriptions,
            total_messages: self.log.total(),
            log_capacity: self.log.capacity(),
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Drop every subscription and stop accepting messages. Idempotent.
    pub fn disconnect(&self) {
        if !self.connected.swap(false, Ordering::AcqRel) {
            return;
        }
        // Taken out of the lock so callback drops cannot re-enter it.
        let dropped = std::mem::take(
            &mut *self
                .subscriptions
                .write()
                .unwrap_or_else(PoisonError::into_inner),
        );
        tracing::info!(subscriptions = dropped.len(), "router disconnected");
    }
}

impl Default for TopicRouter {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use smartfarm_domain::envelope::SystemQuery;
    use smartfarm_domain::error::DeviceError;
    use smartfarm_domain::id::DeviceId;

    fn envelope() -> Envelope {
        SystemQuery::new("get_status").into()
    }

    fn recorder(router: &TopicRouter, pattern: &str) -> Arc<Mutex<Vec<String>>> {
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
    fn should_deliver_to_matching_wildcard_subscribers() {
        let router = TopicRouter::new(16);
        let telemetry = recorder(&router, "farms/+/devices/+/telemetry");
        let farm = recorder(&router, "farms/f1/#");

        assert_eq!(router.publish("farms/f1/devices/d1/telemetry", envelope()), 2);
        assert_eq!(router.publish("farms/f1/devices/d1/d2/telemetry", envelope()), 1);
        assert_eq!(router.publish("farms/f1/state", envelope()), 1);

        assert_eq!(*telemetry.lock().unwrap(), ["farms/f1/devices/d1/telemetry"]);
        assert_eq!(farm.lock().unwrap().len(), 3);
    }

    #[test]
    fn should_invoke_callbacks_in_registration_order() {
        let router = TopicRouter::new(16);
        let order = Arc::new(Mutex::new(Vec::new()));
        for label in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            router
                .subscribe("#", move |_, _| {
                    order.lock().unwrap().push(label);
                    Ok(())
                })
                .unwrap();
        }
        router.publish("system/status", envelope());
        assert_eq!(*order.lock().unwrap(), ["first", "second", "third"]);
    }

    #[test]
    fn should_return_zero_when_nothing_matches() {
        let router = TopicRouter::new(16);
        let _seen = recorder(&router, "control/+/+/+");
        assert_eq!(router.publish("control/error", envelope()), 0);
    }

    #[test]
    fn should_keep_delivering_after_failing_subscriber() {
        let router = TopicRouter::new(16);
        router
            .subscribe("#", |_, _| {
                Err(DeviceError::NotFound {
                    device_id: DeviceId::from("ghost-1"),
                }
                .into())
            })
            .unwrap();
        router
            .subscribe("#", |_, _| panic!("subscriber bug"))
            .unwrap();
        let seen = recorder(&router, "#");

        assert_eq!(router.publish("control/error", envelope()), 3);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn should_allow_publishing_from_inside_a_callback() {
        let router = Arc::new(TopicRouter::new(16));
        let inner = Arc::downgrade(&router);
        router
            .subscribe("system/+", move |topic, envelope| {
                if topic == "system/get_status"
                    && let Some(router) = inner.upgrade()
                {
                    router.publish("status/echo", envelope.clone());
                }
                Ok(())
            })
            .unwrap();
        let echoed = recorder(&router, "status/echo");

        router.publish("system/get_status", envelope());

        assert_eq!(echoed.lock().unwrap().len(), 1);
        let topics: Vec<String> = router
            .recent_messages(10)
            .into_iter()
            .map(|m| m.topic)
            .collect();
        assert_eq!(topics, ["system/get_status", "status/echo"]);
    }

    #[test]
    fn should_stop_delivering_after_unsubscribe() {
        let router = TopicRouter::new(16);
        let seen = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&seen);
        let id = router
            .subscribe("system/+", move |_, _| {
                *sink.lock().unwrap() += 1;
                Ok(())
            })
            .unwrap();

        router.publish("system/get_status", envelope());
        assert!(router.unsubscribe(id));
        assert!(!router.unsubscribe(id));
        router.publish("system/get_status", envelope());

        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn should_reject_malformed_pattern() {
        let router = TopicRouter::new(16);
        let err = router.subscribe("farms/#/state", |_, _| Ok(())).unwrap_err();
        assert_eq!(err.code(), "EnvelopeValidationFailed");
        assert!(router.status().subscriptions.is_empty());
    }

    #[test]
    fn should_log_serialized_payloads() {
        let router = TopicRouter::new(16);
        router.publish("system/get_status", envelope());
        let logged = router.recent_messages(1);
        assert_eq!(logged.len(), 1);
        let payload: serde_json::Value = serde_json::from_str(&logged[0].payload).unwrap();
        assert_eq!(payload["action"], serde_json::json!("get_status"));
    }

    #[test]
    fn should_report_status() {
        let router = TopicRouter::new(16);
        let _seen = recorder(&router, "control/+/+/+");
        router.publish("control/error", envelope());

        let status = router.status();
        assert!(status.connected);
        assert_eq!(status.subscriptions, ["control/+/+/+"]);
        assert_eq!(status.total_messages, 1);
        assert_eq!(status.log_capacity, 16);
    }

    #[test]
    fn should_drop_everything_after_disconnect() {
        let router = TopicRouter::new(16);
        let seen = recorder(&router, "#");

        router.disconnect();
        router.disconnect();

        assert_eq!(router.publish("system/get_status", envelope()), 0);
        assert!(seen.lock().unwrap().is_empty());
        let status = router.status();
        assert!(!status.connected);
        assert!(status.subscriptions.is_empty());
        assert_eq!(status.total_messages, 0);
    }
}
