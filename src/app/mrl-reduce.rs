use anyhow::*;
use clap::Parser;
use mrmerge::cmd::reduce::{Args, Job};
use mrmerge::*;

fn run_reduce_job(job: Job, engine: Workload) -> Result<()> {
    let locator = DirLocator::new(&job.dir);
    let mut task = ReduceTask::new(job.config, locator);
    let summary = task
        .run(engine.reduce_fn)
        .with_context(|| format!("reduce task ended in phase {}", task.phase()))?;
    println!("{}", summary.output.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    utils::init_logging(args.verbose);
    let job = args.resolve()?;
    let engine = workload::named(&job.workload)?;

    run_reduce_job(job, engine)
}
