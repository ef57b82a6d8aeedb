//! Command history — bounded audit trail of dispatched commands.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use smartfarm_domain::command::CommandRecord;
use smartfarm_domain::id::DeviceId;

/// Ring buffer of [`CommandRecord`]s; the oldest record is evicted once
/// `capacity` is reached. Appends are atomic.
pub struct CommandHistory {
    capacity: usize,
    records: Mutex<VecDeque<CommandRecord>>,
    total: AtomicU64,
}

impl CommandHistory {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            total: AtomicU64::new(0),
        }
    }

    /// Append a record.
    pub fn record(&self, record: CommandRecord) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if self.capacity == 0 {
            return;
        }
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Every retained record, oldest first.
    #[must_use]
    pub fn all(&self) -> Vec<CommandRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// The last `limit` records, oldest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<CommandRecord> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let skip = records.len().saturating_sub(limit);
        records.iter().skip(skip).cloned().collect()
    }

    /// Retained records addressed to `device_id`, oldest first.
    #[must_use]
    pub fn for_device(&self, device_id: &DeviceId) -> Vec<CommandRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|record| &record.device_id == device_id)
            .cloned()
            .collect()
    }

    /// Records ever appended, evicted ones included.
    #[must_use]
    pub fn total_recorded(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(1000)
    }
}
