//! Reusable view builders (top-K, secondary sort, word counts) and the job
//! runners that drive them.
//!
//! The builders lean on one property of `reduce`: all values of a key are
//! handed to a single worker in one call, sorted ascending by `Ord`. Mapping
//! every record onto the unit key therefore yields one globally sorted,
//! grouped pass, which is exactly the feed the top-K window expects.

use differential_dataflow::lattice::Lattice;
use differential_dataflow::operators::reduce::Reduce;
use differential_dataflow::Collection;
use serde::{Deserialize, Serialize};
use timely::dataflow::Scope;
use tracing::{debug, error};

use rf_core::{CompositeKey, CoreError, JobConfig, Key, TopKWindow};
use rf_runtime::metrics::MetricsRegistry;

pub mod jobs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopKConfig {
    pub k: i64,
}

impl Default for TopKConfig {
    fn default() -> Self {
        Self { k: 5 }
    }
}

impl From<&JobConfig> for TopKConfig {
    fn from(cfg: &JobConfig) -> Self {
        Self { k: cfg.top_n }
    }
}

impl TopKConfig {
    /// An empty window for one selection pass; fails for a non-positive `k`.
    pub fn window(&self) -> Result<TopKWindow, CoreError> {
        TopKWindow::new(self.k)
    }
}

/// Global top-K over a collection of integers.
///
/// Each evaluation runs a fresh copy of `template` over the distinct values
/// in ascending order, with their multiplicities as group counts. The output
/// holds a single record: the drained values, largest first, or the reason
/// the pass was rejected.
pub fn top_k<G>(
    numbers: &Collection<G, Key>,
    template: &TopKWindow,
    metrics: MetricsRegistry,
) -> Collection<G, Result<Vec<Key>, String>>
where
    G: Scope,
    G::Timestamp: Lattice + Ord,
{
    let template = template.clone();
    numbers
        .map(|n| ((), n))
        .reduce(move |_unit, groups, output| {
            let mut window = template.clone();
            let result = groups
                .iter()
                .try_for_each(|(key, count)| window.consume(**key, *count as i64))
                .and_then(|()| window.drain());
            metrics.inc_groups_consumed(window.groups_consumed());
            metrics.inc_entries_evicted(window.entries_evicted());
            match result {
                Ok(values) => {
                    debug!(
                        groups = groups.len(),
                        evicted = window.entries_evicted(),
                        emitted = values.len(),
                        "top-k pass complete"
                    );
                    metrics.inc_values_emitted(values.len() as u64);
                    output.push((Ok(values), 1isize));
                }
                Err(err) => {
                    metrics.inc_passes_rejected(1);
                    error!(%err, "top-k pass rejected its input");
                    output.push((Err(err.to_string()), 1isize));
                }
            }
        })
        .map(|((), result)| result)
}

/// Distinct keys in `CompositeKey` order, as a single sorted record.
pub fn secondary_sort<G>(keys: &Collection<G, CompositeKey>) -> Collection<G, Vec<CompositeKey>>
where
    G: Scope,
    G::Timestamp: Lattice + Ord,
{
    keys.map(|key| ((), key))
        .reduce(|_unit, keys, output| {
            let ordered: Vec<CompositeKey> = keys.iter().map(|(key, _)| **key).collect();
            output.push((ordered, 1isize));
        })
        .map(|((), ordered)| ordered)
}

/// Occurrences per word.
pub fn word_count<G>(words: &Collection<G, String>) -> Collection<G, (String, i64)>
where
    G: Scope,
    G::Timestamp: Lattice + Ord,
{
    words
        .map(|word| (word, ()))
        .reduce(|_word, occurrences, output| {
            let total: isize = occurrences.iter().map(|(_, count)| *count).sum();
            output.push((total as i64, 1isize));
        })
}
