//! Dispatch from worker parameters to the workload that implements them.

use crate::workloads::batch::Batch;
use crate::workloads::interactive::Interactive;
use crate::workloads::params::WorkerParams;
use crate::workloads::periodic::Periodic;
use crate::workloads::spinner::Spinner;
use crate::workloads::yielding::Yield;

/// One worker's load shape, with its private state.
pub enum WorkerModel {
    Batch(Batch),
    Interactive(Interactive),
    Periodic(Periodic),
    Yield(Yield),
}

impl WorkerModel {
    /// Build the model for `params`; `seed` seeds any random state.
    pub fn new(params: &WorkerParams, seed: u64) -> Self {
        match *params {
            WorkerParams::Batch => WorkerModel::Batch(Batch),
            WorkerParams::Interactive {
                interval_max,
                duration_max,
            } => WorkerModel::Interactive(Interactive::new(interval_max, duration_max, seed)),
            WorkerParams::Periodic { period, duty_cycle } => {
                WorkerModel::Periodic(Periodic::new(period, duty_cycle))
            }
            WorkerParams::Yield {
                burst_period,
                yield_interval,
            } => WorkerModel::Yield(Yield::new(burst_period, yield_interval)),
        }
    }

    /// Run one iteration of the workload.
    pub fn run_once(&mut self, spinner: &Spinner) {
        match self {
            WorkerModel::Batch(model) => model.run_once(),
            WorkerModel::Interactive(model) => model.run_once(spinner),
            WorkerModel::Periodic(model) => model.run_once(spinner),
            WorkerModel::Yield(model) => model.run_once(spinner),
        }
    }
}
