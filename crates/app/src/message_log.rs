//! Bounded log of published messages.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use smartfarm_domain::envelope::Envelope;
use smartfarm_domain::time::{Timestamp, now};

/// One published message as it went over the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedMessage {
    pub topic: String,
    /// JSON text of the envelope.
    pub payload: String,
    pub timestamp: Timestamp,
}

/// Ring buffer of the most recent messages; oldest entries are evicted.
pub struct MessageLog {
    capacity: usize,
    entries: Mutex<VecDeque<LoggedMessage>>,
    total: AtomicU64,
}

impl MessageLog {
    /// Create a log keeping at most `capacity` messages.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            total: AtomicU64::new(0),
        }
    }

    /// Append a message, evicting the oldest one when full.
    pub fn record(&self, topic: &str, envelope: &Envelope) {
        let payload = envelope.to_json().unwrap_or_else(|err| {
            tracing::warn!(%err, topic, "failed to serialize envelope for the message log");
            String::new()
        });
        self.total.fetch_add(1, Ordering::Relaxed);
        if self.capacity == 0 {
            return;
        }

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(LoggedMessage {
            topic: topic.to_string(),
            payload,
            timestamp: now(),
        });
    }

    /// The last `limit` messages, oldest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<LoggedMessage> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let skip = entries.len().saturating_sub(limit);
        entries.iter().skip(skip).cloned().collect()
    }

    /// Number of messages ever recorded, including evicted ones.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Number of messages currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartfarm_domain::envelope::SystemQuery;

    fn query(action: &str) -> Envelope {
        SystemQuery::new(action).into()
    }

    #[test]
    fn should_keep_messages_in_publish_order() {
        let log = MessageLog::new(10);
        log.record("system/get_status", &query("get_status"));
        log.record("system/get_farms", &query("get_farms"));

        let recent = log.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].topic, "system/get_status");
        assert_eq!(recent[1].topic, "system/get_farms");
        assert!(recent[1].payload.contains("\"action\":\"get_farms\""));
    }

    #[test]
    fn should_evict_oldest_when_full() {
        let log = MessageLog::new(2);
        log.record("a", &query("one"));
        log.record("b", &query("two"));
        log.record("c", &query("three"));

        let topics: Vec<String> = log.recent(10).into_iter().map(|m| m.topic).collect();
        assert_eq!(topics, ["b", "c"]);
        assert_eq!(log.total(), 3);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn should_return_only_the_last_messages_when_limited() {
        let log = MessageLog::new(5);
        for topic in ["a", "b", "c", "d"] {
            log.record(topic, &query(topic));
        }
        let topics: Vec<String> = log.recent(2).into_iter().map(|m| m.topic).collect();
        assert_eq!(topics, ["c", "d"]);
    }

    #[test]
    fn should_not_preallocate_huge_capacity() {
        let log = MessageLog::new(usize::MAX / 2);
        assert_eq!(log.capacity(), usize::MAX / 2);
        log.record("a", &query("one"));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn should_count_but_not_retain_with_zero_capacity() {
        let log = MessageLog::new(0);
        log.record("a", &query("one"));
        assert!(log.is_empty());
        assert_eq!(log.total(), 1);
    }
}
