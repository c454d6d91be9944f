//! Delivery log for replay detection.
//!
//! Remembers recently delivered exchanges so that a data frame replayed
//! after its exchange completed is acknowledged again but not handed to the
//! application a second time. Entries expire after the retention window, and
//! the oldest entry is evicted once the log is full.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::core::DeliveryLogConfig;

use super::identity::ExchangeId;

/// Bounded map of delivered exchanges.
#[derive(Debug, Clone)]
pub struct DeliveryLog {
    retention: Duration,
    capacity: usize,
    /// Delivery time per exchange.
    entries: HashMap<ExchangeId, Instant>,
    /// Insertion order, oldest first. May hold stale duplicates of
    /// re-recorded ids; those are skipped on eviction.
    order: VecDeque<(ExchangeId, Instant)>,
}

impl DeliveryLog {
    /// Create an empty log.
    pub fn new(config: DeliveryLogConfig) -> Self {
        Self {
            retention: config.retention,
            capacity: config.capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Check whether `id` was delivered within the retention window.
    pub fn contains(&mut self, id: &ExchangeId) -> bool {
        self.contains_at(id, Instant::now())
    }

    /// Same as [`contains`](Self::contains) with an explicit clock.
    pub fn contains_at(&mut self, id: &ExchangeId, now: Instant) -> bool {
        self.expire(now);
        self.entries.contains_key(id)
    }

    /// Remember that `id` was delivered.
    pub fn record(&mut self, id: ExchangeId) {
        self.record_at(id, Instant::now());
    }

    /// Same as [`record`](Self::record) with an explicit clock.
    pub fn record_at(&mut self, id: ExchangeId, now: Instant) {
        self.expire(now);
        self.entries.insert(id, now);
        self.order.push_back((id, now));

        while self.entries.len() > self.capacity {
            let Some((oldest, at)) = self.order.pop_front() else {
                break;
            };
            if self.entries.get(&oldest) == Some(&at) {
                self.entries.remove(&oldest);
            }
        }
    }

    /// Number of remembered exchanges.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is remembered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn expire(&mut self, now: Instant) {
        while let Some(&(id, at)) = self.order.front() {
            if now.saturating_duration_since(at) < self.retention {
                break;
            }
            self.order.pop_front();
            if self.entries.get(&id) == Some(&at) {
                self.entries.remove(&id);
            }
        }
    }
}
