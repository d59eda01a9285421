use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use crate::reduce::{MissingInput, ReduceConfig, Strategy};

#[derive(Parser, Debug)]
#[command(version, about = "Run one reduce task of a MapReduce job", long_about = None)]
pub struct Args {
    /// Name of the MapReduce job
    #[clap(short, long)]
    pub job: Option<String>,
    /// Which reduce partition to run
    #[clap(short, long)]
    pub reduce_task: Option<usize>,
    /// Number of map tasks that ran
    #[clap(short = 'm', long)]
    pub n_map: Option<usize>,
    /// Directory holding the intermediate and output files (default ".")
    #[clap(short, long)]
    pub dir: Option<PathBuf>,
    /// Name of the reduce workload (default "wc")
    #[clap(short, long)]
    pub workload: Option<String>,
    /// How to bring records into key order (default "sort")
    #[clap(short, long, value_enum)]
    pub strategy: Option<Strategy>,
    /// Treat missing intermediate files as empty instead of failing
    #[clap(long)]
    pub allow_missing: bool,
    /// JSON file supplying any of the settings above; flags take precedence
    #[clap(short, long)]
    pub config: Option<PathBuf>,
    /// Increase log verbosity (-v, -vv)
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Settings read from a `--config` file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub job: Option<String>,
    pub reduce_task: Option<usize>,
    pub n_map: Option<usize>,
    pub dir: Option<PathBuf>,
    pub workload: Option<String>,
    pub strategy: Option<Strategy>,
    pub missing_input: Option<MissingInput>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }
}

/// A fully resolved reduce job.
#[derive(Debug, Clone)]
pub struct Job {
    pub config: ReduceConfig,
    pub dir: PathBuf,
    pub workload: String,
}

impl Args {
    /// Merges the flags over the config file (if any) and fills in defaults.
    pub fn resolve(self) -> Result<Job> {
        let file = match &self.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        let job = self
            .job
            .or(file.job)
            .context("no job name given (use --job or the config file)")?;
        let reduce_task = self
            .reduce_task
            .or(file.reduce_task)
            .context("no reduce task given (use --reduce-task or the config file)")?;
        let n_map = self
            .n_map
            .or(file.n_map)
            .context("no map task count given (use --n-map or the config file)")?;
        let missing_input = if self.allow_missing {
            MissingInput::TreatAsEmpty
        } else {
            file.missing_input.unwrap_or_default()
        };

        let config = ReduceConfig::new(job, reduce_task, n_map)
            .with_strategy(self.strategy.or(file.strategy).unwrap_or_default())
            .with_missing_input(missing_input);

        Ok(Job {
            config,
            dir: self.dir.or(file.dir).unwrap_or_else(|| PathBuf::from(".")),
            workload: self.workload.or(file.workload).unwrap_or_else(|| "wc".to_string()),
        })
    }
}
