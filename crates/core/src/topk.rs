//! Bounded top-K selection over an ascending stream of key groups.
//!
//! The window is fed one `(key, count)` group at a time in strictly
//! ascending key order. Once the retained counts reach `K`, the oldest
//! (smallest) groups are evicted from the front before the next group is
//! admitted, so memory stays proportional to `K` instead of the number of
//! distinct keys. Draining walks the window from the back and emits each key
//! `count` times until `K` values have been produced.
//!
//! A group straddling the `K` boundary is emitted whole, so the result can
//! hold more than `K` values when that group has a count above one.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Count, CoreError, Key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: Key,
    pub count: Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Fresh,
    Consuming { last_key: Key },
    Drained,
}

#[derive(Debug, Clone)]
pub struct TopKWindow {
    k: Count,
    entries: VecDeque<Entry>,
    running_total: Count,
    phase: Phase,
    consumed: u64,
    evicted: u64,
}

impl TopKWindow {
    pub fn new(k: Count) -> Result<Self, CoreError> {
        if k <= 0 {
            return Err(CoreError::Configuration(format!(
                "top-k bound must be positive, got {k}"
            )));
        }
        Ok(Self {
            k,
            entries: VecDeque::new(),
            running_total: 0,
            phase: Phase::Fresh,
            consumed: 0,
            evicted: 0,
        })
    }

    pub fn bound(&self) -> Count {
        self.k
    }

    /// Sum of the counts currently held.
    pub fn running_total(&self) -> Count {
        self.running_total
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Retained entries, smallest key first.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.entries.iter()
    }

    pub fn groups_consumed(&self) -> u64 {
        self.consumed
    }

    pub fn entries_evicted(&self) -> u64 {
        self.evicted
    }

    pub fn consume(&mut self, key: Key, count: Count) -> Result<(), CoreError> {
        match self.phase {
            Phase::Drained => {
                return Err(CoreError::InvalidState(
                    "consume called after drain".to_string(),
                ))
            }
            Phase::Consuming { last_key } if key <= last_key => {
                return Err(CoreError::InvalidSequence(format!(
                    "key {key} does not follow {last_key}"
                )))
            }
            _ => {}
        }
        if count < 1 {
            return Err(CoreError::InvalidSequence(format!(
                "group {key} has count {count}"
            )));
        }

        // Work out the eviction on a scratch total first so an overflowing
        // group is rejected before anything leaves the window.
        let mut kept_total = self.running_total;
        let mut evict = 0;
        for entry in &self.entries {
            if kept_total < self.k {
                break;
            }
            kept_total -= entry.count;
            evict += 1;
        }
        let total = kept_total.checked_add(count).ok_or_else(|| {
            CoreError::InvalidSequence(format!("group {key} overflows the running total"))
        })?;

        for oldest in self.entries.drain(..evict) {
            debug!(key = oldest.key, count = oldest.count, "evicted from window front");
        }
        self.evicted += evict as u64;

        debug!(key, count, "admitted to window back");
        self.entries.push_back(Entry { key, count });
        self.running_total = total;
        self.consumed += 1;
        self.phase = Phase::Consuming { last_key: key };
        Ok(())
    }

    pub fn drain(&mut self) -> Result<Vec<Key>, CoreError> {
        match self.phase {
            Phase::Fresh => {
                return Err(CoreError::InvalidState(
                    "drain called before any group was consumed".to_string(),
                ))
            }
            Phase::Drained => {
                return Err(CoreError::InvalidState("drain called twice".to_string()))
            }
            Phase::Consuming { .. } => {}
        }

        let mut out = Vec::new();
        let mut remaining = self.k;
        while remaining > 0 {
            let Some(Entry { key, count }) = self.entries.pop_back() else {
                break;
            };
            debug!(key, count, remaining, "draining from window back");
            out.extend(std::iter::repeat(key).take(count as usize));
            remaining -= count;
        }

        self.entries.clear();
        self.running_total = 0;
        self.phase = Phase::Drained;
        Ok(out)
    }

    /// Runs one full pass: consumes every group in order, then drains.
    pub fn select<I>(mut self, groups: I) -> Result<Vec<Key>, CoreError>
    where
        I: IntoIterator<Item = (Key, Count)>,
    {
        for (key, count) in groups {
            self.consume(key, count)?;
        }
        self.drain()
    }
}
