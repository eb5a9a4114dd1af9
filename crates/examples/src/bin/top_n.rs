use std::io::Write;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use rf_core::records::parse_numbers;
use rf_examples::{report_metrics, JobArgs};
use rf_runtime::init_tracing;
use rf_runtime::metrics::{JobTimer, MetricsRegistry};
use rf_views::jobs::run_top_n;
use rf_views::TopKConfig;

/// Emit the N largest integers found in the input files, largest first.
#[derive(Debug, Parser)]
#[command(name = "top_n")]
struct Cli {
    #[command(flatten)]
    job: JobArgs,
    /// How many values to keep, overriding the config file.
    #[arg(short = 'n', long)]
    top_n: Option<i64>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut cfg = cli.job.job_config()?;
    if let Some(n) = cli.top_n {
        cfg.top_n = n;
    }
    cfg.validate()?;
    info!(?cfg, "top_n starting");

    let timer = JobTimer::start();
    let metrics = MetricsRegistry::default();
    let numbers = cli.job.parse_inputs(parse_numbers)?;
    let values = run_top_n(numbers, &TopKConfig::from(&cfg), cfg.workers, &metrics)?;

    let mut out = cli.job.open_output()?;
    for value in &values {
        writeln!(out, "{value}")?;
    }
    out.flush()?;

    report_metrics(&cfg, "top_n", &metrics, &timer);
    Ok(())
}
