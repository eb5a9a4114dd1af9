use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Job-wide counters shared by every worker of a run.
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    records_read: AtomicU64,
    groups_consumed: AtomicU64,
    entries_evicted: AtomicU64,
    values_emitted: AtomicU64,
    passes_rejected: AtomicU64,
}

impl MetricsRegistry {
    pub fn inc_records_read(&self, delta: u64) {
        self.inner.records_read.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_groups_consumed(&self, delta: u64) {
        self.inner.groups_consumed.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_entries_evicted(&self, delta: u64) {
        self.inner.entries_evicted.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_values_emitted(&self, delta: u64) {
        self.inner.values_emitted.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_passes_rejected(&self, delta: u64) {
        self.inner.passes_rejected.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_read: self.inner.records_read.load(Ordering::Relaxed),
            groups_consumed: self.inner.groups_consumed.load(Ordering::Relaxed),
            entries_evicted: self.inner.entries_evicted.load(Ordering::Relaxed),
            values_emitted: self.inner.values_emitted.load(Ordering::Relaxed),
            passes_rejected: self.inner.passes_rejected.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub records_read: u64,
    pub groups_consumed: u64,
    pub entries_evicted: u64,
    pub values_emitted: u64,
    pub passes_rejected: u64,
}

impl MetricsSnapshot {
    pub fn to_json_line(&self, label: &str, elapsed: Option<Duration>) -> String {
        #[derive(Serialize)]
        struct Snapshot<'a> {
            label: &'a str,
            #[serde(flatten)]
            counters: &'a MetricsSnapshot,
            elapsed_ms: Option<u128>,
        }

        let payload = Snapshot {
            label,
            counters: self,
            elapsed_ms: elapsed.map(|d| d.as_millis()),
        };
        serde_json::to_string(&payload).unwrap_or_else(|_| String::from("{}"))
    }
}

pub struct JobTimer {
    start: Instant,
}

impl JobTimer {
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
