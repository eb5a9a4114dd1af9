//! Job runners: feed parsed records through a view on a fresh timely runtime
//! and collect the sink output from whichever worker produced it.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use differential_dataflow::input::InputSession;
use timely::dataflow::operators::probe::Handle as ProbeHandle;
use tracing::info;

use rf_core::{CompositeKey, Key};
use rf_runtime::metrics::MetricsRegistry;
use rf_runtime::{run_single_epoch, run_single_epoch_updates, start_runtime};

use crate::{secondary_sort, top_k, word_count, TopKConfig};

/// Keeps the newest inserted record of a single-record collection.
struct Latest<T> {
    slot: Option<(u64, T)>,
}

impl<T: Clone> Latest<T> {
    fn new() -> Self {
        Self { slot: None }
    }

    fn observe(&mut self, value: &T, time: u64, diff: isize) {
        if diff <= 0 {
            return;
        }
        match &self.slot {
            Some((seen, _)) if *seen > time => {}
            _ => self.slot = Some((time, value.clone())),
        }
    }

    fn take(&mut self) -> Option<T> {
        self.slot.take().map(|(_, value)| value)
    }
}

pub fn run_top_n(
    numbers: Vec<Key>,
    cfg: &TopKConfig,
    workers: usize,
    metrics: &MetricsRegistry,
) -> Result<Vec<Key>> {
    let updates = numbers.into_iter().map(|n| (n, 1)).collect();
    run_top_k_updates(updates, cfg, workers, metrics)
}

/// Top-K over raw `(value, diff)` updates. A pass the window rejects fails
/// the whole run.
fn run_top_k_updates(
    updates: Vec<(Key, isize)>,
    cfg: &TopKConfig,
    workers: usize,
    metrics: &MetricsRegistry,
) -> Result<Vec<Key>> {
    let template = cfg.window()?;
    let updates = Arc::new(updates);
    let metrics = metrics.clone();
    info!(k = cfg.k, records = updates.len(), "running top-n job");

    let per_worker = start_runtime(workers, move |_index, worker| {
        let mut input: InputSession<u64, Key, isize> = InputSession::new();
        let mut probe = ProbeHandle::new();
        let sink = Rc::new(RefCell::new(Latest::new()));

        worker.dataflow::<u64, _, _>(|scope| {
            let numbers = input.to_collection(scope);
            let sink = sink.clone();
            top_k(&numbers, &template, metrics.clone())
                .inspect(move |(result, time, diff)| sink.borrow_mut().observe(result, *time, *diff))
                .probe_with(&mut probe);
        });

        let fed = run_single_epoch_updates(worker, &mut input, &probe, updates.as_slice());
        metrics.inc_records_read(fed as u64);
        let result = sink.borrow_mut().take();
        result
    })?;

    match per_worker.into_iter().flatten().next() {
        Some(Ok(values)) => Ok(values),
        Some(Err(reason)) => Err(anyhow!("top-k pass rejected: {reason}")),
        None => Ok(Vec::new()),
    }
}

pub fn run_secondary_sort(
    keys: Vec<CompositeKey>,
    workers: usize,
    metrics: &MetricsRegistry,
) -> Result<Vec<CompositeKey>> {
    let keys = Arc::new(keys);
    let worker_metrics = metrics.clone();
    info!(records = keys.len(), "running secondary sort job");

    let per_worker = start_runtime(workers, move |_index, worker| {
        let mut input: InputSession<u64, CompositeKey, isize> = InputSession::new();
        let mut probe = ProbeHandle::new();
        let sink = Rc::new(RefCell::new(Latest::new()));

        worker.dataflow::<u64, _, _>(|scope| {
            let keys = input.to_collection(scope);
            let sink = sink.clone();
            secondary_sort(&keys)
                .inspect(move |(ordered, time, diff)| sink.borrow_mut().observe(ordered, *time, *diff))
                .probe_with(&mut probe);
        });

        let fed = run_single_epoch(worker, &mut input, &probe, keys.as_slice());
        worker_metrics.inc_records_read(fed as u64);
        let result = sink.borrow_mut().take();
        result
    })?;

    let ordered = per_worker.into_iter().flatten().next().unwrap_or_default();
    metrics.inc_values_emitted(ordered.len() as u64);
    Ok(ordered)
}

pub fn run_word_count(
    words: Vec<String>,
    workers: usize,
    metrics: &MetricsRegistry,
) -> Result<Vec<(String, i64)>> {
    let words = Arc::new(words);
    let worker_metrics = metrics.clone();
    info!(records = words.len(), "running word count job");

    let per_worker = start_runtime(workers, move |_index, worker| {
        let mut input: InputSession<u64, String, isize> = InputSession::new();
        let mut probe = ProbeHandle::new();
        let sink = Rc::new(RefCell::new(BTreeMap::<String, i64>::new()));

        worker.dataflow::<u64, _, _>(|scope| {
            let words = input.to_collection(scope);
            let sink = sink.clone();
            word_count(&words)
                .inspect(move |((word, total), _time, diff)| {
                    let mut counts = sink.borrow_mut();
                    if *diff > 0 {
                        counts.insert(word.clone(), *total);
                    } else if counts.get(word) == Some(total) {
                        counts.remove(word);
                    }
                })
                .probe_with(&mut probe);
        });

        let fed = run_single_epoch(worker, &mut input, &probe, words.as_slice());
        worker_metrics.inc_records_read(fed as u64);
        let counts = std::mem::take(&mut *sink.borrow_mut());
        counts
    })?;

    // Words are partitioned by hash, so each worker owns a disjoint slice.
    let merged: BTreeMap<String, i64> = per_worker.into_iter().flatten().collect();
    metrics.inc_values_emitted(merged.len() as u64);
    Ok(merged.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_ignores_retractions_and_older_times() {
        let mut latest = Latest::new();
        latest.observe(&vec![1], 1, 1);
        latest.observe(&vec![1], 1, -1);
        latest.observe(&vec![2], 0, 1);
        assert_eq!(latest.take(), Some(vec![1]));
        assert_eq!(latest.take(), None);
    }

    #[test]
    fn rejected_pass_fails_the_run() {
        // a net retraction reaches the window as a group with count -1
        let metrics = MetricsRegistry::default();
        let result = run_top_k_updates(vec![(3, 1), (5, -1)], &TopKConfig { k: 2 }, 1, &metrics);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("top-k pass rejected"), "{err}");
        assert_eq!(metrics.snapshot().passes_rejected, 1);
    }

    #[test]
    fn retractions_cancel_before_selection() {
        let updates = vec![(3, 1), (5, 1), (9, 1), (9, -1)];
        let out = run_top_k_updates(updates, &TopKConfig { k: 2 }, 2, &MetricsRegistry::default())
            .unwrap();
        assert_eq!(out, vec![5, 3]);
    }
}
