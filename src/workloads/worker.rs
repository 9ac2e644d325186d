//! Per-worker identity and driver loop.

use std::sync::Arc;
use std::time::Duration;

use nix::unistd::Pid;
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::util::clock::Timestamp;
use crate::util::sched::Sched;
use crate::workloads::barrier::StartBarrier;
use crate::workloads::model::WorkerModel;
use crate::workloads::params::WorkerKind;
use crate::workloads::params::WorkerParams;
use crate::workloads::spinner::Spinner;

/// Who a worker is: kind, ordinal and the thread running it.
#[derive(Debug)]
pub struct WorkerIdentity {
    kind: WorkerKind,
    /// 1-based index within its kind.
    ordinal: u32,
    /// `<kind letter><3 digit ordinal>`, e.g. `I007`.
    name: String,
    /// Kernel thread id, written once by the worker thread when it starts.
    tid: OnceCell<Pid>,
}

impl WorkerIdentity {
    pub fn new(kind: WorkerKind, ordinal: u32) -> Self {
        Self {
            kind,
            ordinal,
            name: format!("{}{:03}", kind.letter(), ordinal),
            tid: OnceCell::new(),
        }
    }

    pub fn kind(&self) -> WorkerKind {
        self.kind
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The worker's thread id, once the thread has started.
    pub fn tid(&self) -> Option<Pid> {
        self.tid.get().copied()
    }

    /// Record the thread id. Only the first call has an effect.
    fn mark_started(&self, tid: Pid) {
        let _ = self.tid.set(tid);
    }
}

/// What a worker reports back when it terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    /// Workload iterations run.
    pub iterations: u64,
    /// The CPU the worker was last seen on.
    pub last_cpu: u32,
}

/// A worker ready to be moved onto its own thread.
pub struct Worker {
    identity: Arc<WorkerIdentity>,
    params: WorkerParams,
}

impl Worker {
    pub fn new(identity: Arc<WorkerIdentity>, params: WorkerParams) -> Self {
        Self { identity, params }
    }

    pub fn identity(&self) -> &Arc<WorkerIdentity> {
        &self.identity
    }

    pub fn params(&self) -> &WorkerParams {
        &self.params
    }

    /// Drive the workload: wait at the barrier, then iterate until
    /// `test_duration` after the release instant.
    ///
    /// A running iteration is never interrupted, so a worker may overrun the
    /// deadline by up to one iteration.
    pub fn run(self, barrier: &StartBarrier, test_duration: Duration) -> WorkerReport {
        let tid = Sched::current_tid();
        self.identity.mark_started(tid);
        debug!("worker created");

        let mut model = WorkerModel::new(&self.params, tid.as_raw() as u64);
        let spinner = Spinner::default();

        let released = barrier.wait();
        debug!("started");

        let end = released + test_duration;
        let mut iterations = 0u64;
        while !Timestamp::now().is_at_or_after(end) {
            model.run_once(&spinner);
            iterations += 1;
        }

        let report = WorkerReport {
            iterations,
            last_cpu: spinner.last_cpu(),
        };
        debug!(
            "terminated after {} iterations, last cpu {}",
            report.iterations, report.last_cpu
        );
        report
    }
}
