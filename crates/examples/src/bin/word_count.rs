use std::io::Write;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use rf_core::records::split_words;
use rf_examples::{report_metrics, JobArgs};
use rf_runtime::init_tracing;
use rf_runtime::metrics::{JobTimer, MetricsRegistry};
use rf_views::jobs::run_word_count;

/// Count how often each space-separated word occurs.
#[derive(Debug, Parser)]
#[command(name = "word_count")]
struct Cli {
    #[command(flatten)]
    job: JobArgs,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = cli.job.job_config()?;
    info!(?cfg, "word_count starting");

    let timer = JobTimer::start();
    let metrics = MetricsRegistry::default();
    let words = cli.job.parse_inputs(|text| Ok(split_words(text)))?;
    let counts = run_word_count(words, cfg.workers, &metrics)?;

    let mut out = cli.job.open_output()?;
    for (word, count) in &counts {
        writeln!(out, "{word}\t{count}")?;
    }
    out.flush()?;

    report_metrics(&cfg, "word_count", &metrics, &timer);
    Ok(())
}
