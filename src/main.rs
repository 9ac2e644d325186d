use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing::info;
use wlgen::config::Args;
use wlgen::util::clock::Timer;
use wlgen::util::logging;
use wlgen::workloads::context::Context;
use wlgen::workloads::context::format_seconds;
use wlgen::workloads::params::WorkerKind;

fn main() -> Result<()> {
    // Log timestamps are relative to this instant.
    let timer = Timer::new();

    // Parse command line arguments. Invalid configurations exit here, with usage.
    let spec = Args::parse().into_spec();
    logging::init(timer, spec.verbose())?;

    info!(
        "Running for {} [s] with (B,I,P,Y) workers: ({},{},{},{})",
        spec.duration().as_secs(),
        spec.count(WorkerKind::Batch),
        spec.count(WorkerKind::Interactive),
        spec.count(WorkerKind::Periodic),
        spec.count(WorkerKind::Yield),
    );

    let mut context = Context::from_spec(&spec);
    let summary = context.run().inspect_err(|err| error!("{err:#}"))?;
    info!("Time: {}", format_seconds(summary.elapsed()));
    Ok(())
}
