//! Runtime bootstrap for Timely/Differential dataflows.

use anyhow::Result;
use differential_dataflow::input::InputSession;
use timely::communication::allocator::Generic;
use timely::communication::Allocate;
use timely::dataflow::operators::probe::Handle as ProbeHandle;
use timely::worker::Worker;
use tracing::{debug, info, Level};

pub mod metrics;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_max_level(Level::INFO)
        .try_init();
}

/// Start a single-process timely runtime with `workers` threads, execute the
/// provided closure once per worker and collect what each worker returns,
/// in worker index order.
pub fn start_runtime<T, F>(workers: usize, f: F) -> Result<Vec<T>>
where
    T: Send + 'static,
    F: Fn(usize, &mut Worker<Generic>) -> T + Send + Sync + 'static,
{
    info!(%workers, "starting timely runtime");
    let guards = timely::execute(timely::Config::process(workers), move |worker| {
        let index = worker.index();
        f(index, worker)
    })
    .map_err(anyhow::Error::msg)?;

    guards
        .join()
        .into_iter()
        .map(|result| result.map_err(anyhow::Error::msg))
        .collect()
}

/// Feed this worker's share of `records` as a single epoch and step the
/// worker until `probe` has seen the epoch complete.
///
/// Records are dealt round-robin by position, so every worker must be handed
/// the same slice.
pub fn run_single_epoch<A, D>(
    worker: &mut Worker<A>,
    input: &mut InputSession<u64, D, isize>,
    probe: &ProbeHandle<u64>,
    records: &[D],
) -> usize
where
    A: Allocate,
    D: differential_dataflow::Data,
{
    let (index, peers) = (worker.index(), worker.peers());
    let mut fed = 0;
    for record in records.iter().skip(index).step_by(peers) {
        input.insert(record.clone());
        fed += 1;
    }
    settle(worker, input, probe, fed);
    fed
}

/// Like [`run_single_epoch`], but each record carries its own diff, so
/// retractions can be fed alongside insertions.
pub fn run_single_epoch_updates<A, D>(
    worker: &mut Worker<A>,
    input: &mut InputSession<u64, D, isize>,
    probe: &ProbeHandle<u64>,
    updates: &[(D, isize)],
) -> usize
where
    A: Allocate,
    D: differential_dataflow::Data,
{
    let (index, peers) = (worker.index(), worker.peers());
    let mut fed = 0;
    for (record, diff) in updates.iter().skip(index).step_by(peers) {
        input.update(record.clone(), *diff);
        fed += 1;
    }
    settle(worker, input, probe, fed);
    fed
}

fn settle<A, D>(
    worker: &mut Worker<A>,
    input: &mut InputSession<u64, D, isize>,
    probe: &ProbeHandle<u64>,
    fed: usize,
) where
    A: Allocate,
    D: differential_dataflow::Data,
{
    debug!(worker = worker.index(), fed, "input fed");
    input.advance_to(1);
    input.flush();
    while probe.less_than(input.time()) {
        worker.step();
    }
}
