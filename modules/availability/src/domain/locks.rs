//! In-process mutation locks keyed by `(owner_id, date)`.
//!
//! A mutation holds its key's lock from the first read until the write is
//! persisted. Different keys never contend. Entries are dropped from the map
//! once nobody holds or waits on them.

use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

pub type ScheduleKey = (Uuid, NaiveDate);

#[derive(Default)]
pub struct KeyedLocks {
    slots: DashMap<ScheduleKey, Arc<Mutex<()>>>,
}

/// Held for the duration of one read-modify-write.
pub struct KeyGuard<'a> {
    locks: &'a KeyedLocks,
    key: ScheduleKey,
    _guard: OwnedMutexGuard<()>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, key: ScheduleKey) -> KeyGuard<'_> {
        // Clone the Arc out so the shard lock is released before awaiting.
        let slot = self
            .slots
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = slot.lock_owned().await;
        KeyGuard {
            locks: self,
            key,
            _guard: guard,
        }
    }

    /// Number of keys currently locked or contended.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        // Two references left means the map and this guard; nobody is waiting.
        self.locks
            .slots
            .remove_if(&self.key, |_, slot| Arc::strong_count(slot) <= 2);
    }
}
