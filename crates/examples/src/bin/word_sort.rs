use std::io::Write;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use rf_core::records::parse_composite_keys;
use rf_examples::{report_metrics, JobArgs};
use rf_runtime::init_tracing;
use rf_runtime::metrics::{JobTimer, MetricsRegistry};
use rf_views::jobs::run_secondary_sort;

/// Sort `primary secondary` pairs: primary ascending, secondary descending.
#[derive(Debug, Parser)]
#[command(name = "word_sort")]
struct Cli {
    #[command(flatten)]
    job: JobArgs,
    /// Write 8-byte big-endian keys instead of `primary->secondary` lines.
    #[arg(long)]
    binary: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = cli.job.job_config()?;
    info!(?cfg, binary = cli.binary, "word_sort starting");

    let timer = JobTimer::start();
    let metrics = MetricsRegistry::default();
    let keys = cli.job.parse_inputs(parse_composite_keys)?;
    let ordered = run_secondary_sort(keys, cfg.workers, &metrics)?;

    let mut out = cli.job.open_output()?;
    for key in &ordered {
        if cli.binary {
            key.write_to(&mut out)?;
        } else {
            writeln!(out, "{key}")?;
        }
    }
    out.flush()?;

    report_metrics(&cfg, "word_sort", &metrics, &timer);
    Ok(())
}
