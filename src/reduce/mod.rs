//! Running one reduce task.
//!
//! A task moves through `Idle → Loading → Sorting → Reducing → Writing →
//! Done`, or to `Failed` from any phase. Both strategies pass through every
//! phase. Nothing is retried here; a failed task is re-run from scratch by
//! whoever scheduled it.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::ReduceResult;
use crate::naming::Locator;

pub mod engine;
pub mod group;
pub mod merge;

use group::for_each_group;
use merge::KWayMerge;

/// How records are brought into key order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Load every record into memory and sort. Inputs may be in any order.
    #[default]
    Sort,
    /// Stream a k-way merge. Every input must already be sorted by key.
    Merge,
}

/// What to do when a map task's intermediate file does not exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingInput {
    /// Fail the task.
    #[default]
    Fail,
    /// Treat the file as an empty input and log a warning.
    TreatAsEmpty,
}

/// Where a [`ReduceTask`] is in its run.
///
/// Under [`Strategy::Merge`] the phases overlap in time: `Loading` opens the
/// sources, `Sorting` primes the merge heap with each source's first record,
/// `Reducing` streams merged groups into the temporary output and `Writing`
/// flushes and commits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Sorting,
    Reducing,
    Writing,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Loading => "loading",
            Phase::Sorting => "sorting",
            Phase::Reducing => "reducing",
            Phase::Writing => "writing",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Identifies a reduce task and the policies it runs under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReduceConfig {
    /// Name of the whole MapReduce job.
    pub job: String,
    /// Which reduce partition this task handles.
    pub reduce_task: usize,
    /// Number of map tasks that ran.
    pub n_map: usize,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    pub missing_input: MissingInput,
}

impl ReduceConfig {
    pub fn new(job: impl Into<String>, reduce_task: usize, n_map: usize) -> Self {
        Self {
            job: job.into(),
            reduce_task,
            n_map,
            strategy: Strategy::default(),
            missing_input: MissingInput::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_missing_input(mut self, missing_input: MissingInput) -> Self {
        self.missing_input = missing_input;
        self
    }
}

/// What a completed task produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceSummary {
    /// Records read across all intermediate inputs.
    pub records_in: usize,
    /// Records written, one per distinct key.
    pub keys_out: usize,
    pub output: PathBuf,
}

pub struct ReduceTask<L: Locator> {
    config: ReduceConfig,
    locator: L,
    phase: Phase,
    history: Vec<Phase>,
}

impl<L: Locator> ReduceTask<L> {
    pub fn new(config: ReduceConfig, locator: L) -> Self {
        Self {
            config,
            locator,
            phase: Phase::Idle,
            history: vec![Phase::Idle],
        }
    }

    pub fn config(&self) -> &ReduceConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Every phase the latest run passed through, starting with `Idle`.
    pub fn history(&self) -> &[Phase] {
        &self.history
    }

    pub fn output_path(&self) -> PathBuf {
        self.locator.output(&self.config.job, self.config.reduce_task)
    }

    fn enter(&mut self, phase: Phase) {
        debug!(
            job = %self.config.job,
            reduce_task = self.config.reduce_task,
            from = %self.phase,
            to = %phase,
            "reduce task phase change"
        );
        self.phase = phase;
        self.history.push(phase);
    }

    /// Runs the task to completion, calling `reduce_fn` once per distinct key.
    pub fn run<F>(&mut self, reduce_fn: F) -> ReduceResult<ReduceSummary>
    where
        F: Fn(&str, &[String]) -> anyhow::Result<String>,
    {
        self.phase = Phase::Idle;
        self.history = vec![Phase::Idle];
        info!(
            job = %self.config.job,
            reduce_task = self.config.reduce_task,
            n_map = self.config.n_map,
            strategy = ?self.config.strategy,
            "starting reduce task"
        );
        let result = match self.config.strategy {
            Strategy::Sort => self.run_sorted(&reduce_fn),
            Strategy::Merge => self.run_merged(&reduce_fn),
        };
        match &result {
            Ok(summary) => {
                self.enter(Phase::Done);
                info!(
                    job = %self.config.job,
                    reduce_task = self.config.reduce_task,
                    records_in = summary.records_in,
                    keys_out = summary.keys_out,
                    output = %summary.output.display(),
                    "reduce task done"
                );
            }
            Err(err) => {
                error!(
                    job = %self.config.job,
                    reduce_task = self.config.reduce_task,
                    phase = %self.phase,
                    "reduce task failed: {}",
                    err
                );
                self.enter(Phase::Failed);
            }
        }
        result
    }

    fn run_sorted<F>(&mut self, reduce_fn: &F) -> ReduceResult<ReduceSummary>
    where
        F: Fn(&str, &[String]) -> anyhow::Result<String>,
    {
        self.enter(Phase::Loading);
        let sources = engine::open_sources(&self.config, &self.locator)?;
        let mut records = engine::load(sources)?;
        let records_in = records.len();

        self.enter(Phase::Sorting);
        merge::sort_by_key(&mut records);

        self.enter(Phase::Reducing);
        let mut reduced = Vec::new();
        for_each_group(records.into_iter().map(Ok), |group| {
            reduced.push(engine::reduce_group(reduce_fn, group)?);
            Ok(())
        })?;

        self.enter(Phase::Writing);
        let output = self.output_path();
        let keys_out = engine::write_output(&output, reduced.into_iter().map(Ok))?;

        Ok(ReduceSummary {
            records_in,
            keys_out,
            output,
        })
    }

    /// Streams the merge straight into the temporary output, so memory holds
    /// one record per source plus the current key group. `Writing` covers
    /// flushing and committing the output.
    fn run_merged<F>(&mut self, reduce_fn: &F) -> ReduceResult<ReduceSummary>
    where
        F: Fn(&str, &[String]) -> anyhow::Result<String>,
    {
        self.enter(Phase::Loading);
        let sources = engine::open_sources(&self.config, &self.locator)?;

        self.enter(Phase::Sorting);
        let merged = KWayMerge::new(sources)?;

        self.enter(Phase::Reducing);
        let output = self.output_path();
        let mut pending = engine::PendingOutput::create(&output)?;
        let records_in = for_each_group(merged, |group| {
            pending.write(&engine::reduce_group(reduce_fn, group)?)
        })?;

        self.enter(Phase::Writing);
        let keys_out = pending.commit()?;

        Ok(ReduceSummary {
            records_in,
            keys_out,
            output,
        })
    }
}

/// Runs reduce task `reduce_task` of `job` over `n_map` map outputs with the
/// default policies: sort in memory, fail on missing inputs.
pub fn do_reduce<F>(
    job: &str,
    reduce_task: usize,
    n_map: usize,
    locator: impl Locator,
    reduce_fn: F,
) -> ReduceResult<ReduceSummary>
where
    F: Fn(&str, &[String]) -> anyhow::Result<String>,
{
    ReduceTask::new(ReduceConfig::new(job, reduce_task, n_map), locator).run(reduce_fn)
}
