//! Argument handling and file plumbing shared by the job binaries.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use rf_core::{CoreError, JobConfig};
use rf_runtime::metrics::{JobTimer, MetricsRegistry};

#[derive(Debug, Args)]
pub struct JobArgs {
    /// Input files, read in the order given.
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,
    /// Output file; stdout when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Worker threads, overriding the config file.
    #[arg(short, long)]
    pub workers: Option<usize>,
    /// JSON job config.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl JobArgs {
    /// The config file (or defaults) with command-line overrides applied.
    pub fn job_config(&self) -> Result<JobConfig> {
        let mut cfg = match &self.config {
            Some(path) => JobConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => JobConfig::default(),
        };
        if let Some(workers) = self.workers {
            cfg.workers = workers;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse every input file with `parse`, concatenating the records.
    pub fn parse_inputs<T, F>(&self, parse: F) -> Result<Vec<T>>
    where
        F: Fn(&str) -> Result<Vec<T>, CoreError>,
    {
        let mut records = Vec::new();
        for path in &self.input {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let parsed = parse(&text).with_context(|| format!("parsing {}", path.display()))?;
            info!(path = %path.display(), records = parsed.len(), "input loaded");
            records.extend(parsed);
        }
        Ok(records)
    }

    pub fn open_output(&self) -> Result<Box<dyn Write>> {
        match &self.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("creating {}", path.display()))?;
                Ok(Box::new(BufWriter::new(file)))
            }
            None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
        }
    }
}

pub fn report_metrics(cfg: &JobConfig, label: &str, metrics: &MetricsRegistry, timer: &JobTimer) {
    if !cfg.report_metrics {
        return;
    }
    let snapshot = metrics.snapshot();
    info!(
        metrics = %snapshot.to_json_line(label, Some(timer.elapsed())),
        "job complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(flatten)]
        job: JobArgs,
    }

    #[test]
    fn workers_flag_overrides_defaults() {
        let cli = Cli::parse_from(["job", "--input", "a.txt", "b.txt", "--workers", "4"]);
        assert_eq!(cli.job.input.len(), 2);
        let cfg = cli.job.job_config().unwrap();
        assert_eq!(cfg.workers, 4);
        assert_eq!(cfg.top_n, 5);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let cli = Cli::parse_from(["job", "-i", "a.txt", "-w", "0"]);
        assert!(cli.job.job_config().is_err());
    }

    #[test]
    fn input_is_required() {
        assert!(Cli::try_parse_from(["job"]).is_err());
    }
}
