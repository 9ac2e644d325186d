//! Context for running a workload mix.
//!
//! The context owns the whole test lifecycle: it creates one thread per worker,
//! waits until every worker sits at the start barrier, releases them all at the
//! same instant and joins them when their shared deadline has passed.

use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::Context as _;
use anyhow::Result;
use anyhow::anyhow;
use tracing::debug;
use tracing::error;
use tracing::info;

use crate::config::WorkloadSpec;
use crate::util::clock::Timestamp;
use crate::workloads::barrier::StartBarrier;
use crate::workloads::params::WorkerKind;
use crate::workloads::params::WorkerParams;
use crate::workloads::worker::Worker;
use crate::workloads::worker::WorkerIdentity;
use crate::workloads::worker::WorkerReport;

/// A launched worker.
struct Running {
    identity: Arc<WorkerIdentity>,
    handle: JoinHandle<WorkerReport>,
}

/// The outcome of a complete run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// The instant the barrier was released.
    pub released: Timestamp,
    /// The instant the last worker was joined.
    pub terminated: Timestamp,
    /// One report per worker, in launch order.
    pub reports: Vec<(String, WorkerReport)>,
}

impl RunSummary {
    /// Measured test duration.
    pub fn elapsed(&self) -> Duration {
        self.terminated - self.released
    }
}

/// Format a duration as `seconds.milliseconds`.
pub fn format_seconds(duration: Duration) -> String {
    format!("{}.{:03}", duration.as_secs(), duration.subsec_millis())
}

/// A context for running workers.
pub struct Context {
    /// Length of the timed part of the test.
    duration: Duration,

    /// Workers added but not yet started.
    pending: Vec<Worker>,

    /// Next ordinal per kind, indexed by [`WorkerKind::index`].
    ordinals: [u32; 4],

    /// The start barrier, created by `start`.
    barrier: Option<Arc<StartBarrier>>,

    /// Started workers.
    running: Vec<Running>,
}

impl Context {
    /// Create an empty context.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            pending: vec![],
            ordinals: [0; 4],
            barrier: None,
            running: vec![],
        }
    }

    /// Create a context holding every worker requested by `spec`.
    pub fn from_spec(spec: &WorkloadSpec) -> Self {
        info!("Setup workers..");
        let mut context = Self::new(spec.duration());
        for params in spec.workers() {
            context.add(*params);
        }
        context
    }

    /// Adds a worker to the context.
    pub fn add(&mut self, params: WorkerParams) -> Arc<WorkerIdentity> {
        let kind = params.kind();
        self.ordinals[kind.index()] += 1;
        let identity = Arc::new(WorkerIdentity::new(kind, self.ordinals[kind.index()]));
        info!("{}: {}", identity.name(), params);
        self.pending.push(Worker::new(identity.clone(), params));
        identity
    }

    /// Number of workers of `kind` added so far.
    pub fn count(&self, kind: WorkerKind) -> u32 {
        self.ordinals[kind.index()]
    }

    /// Identities of every started worker, in launch order.
    pub fn identities(&self) -> impl Iterator<Item = &Arc<WorkerIdentity>> {
        self.running.iter().map(|r| &r.identity)
    }

    /// Lock the start barrier and launch one thread per worker.
    ///
    /// Threads block at the barrier until [`Context::release`]. A failure to
    /// create a thread is returned immediately; threads already created stay
    /// blocked and are reclaimed when the process exits.
    pub fn start(&mut self) -> Result<()> {
        if self.barrier.is_some() {
            return Err(anyhow!("workers already started"));
        }
        let barrier = Arc::new(StartBarrier::new(self.pending.len()));
        self.barrier = Some(barrier.clone());

        for worker in self.pending.drain(..) {
            let identity = worker.identity().clone();
            let barrier = barrier.clone();
            let duration = self.duration;
            let handle = thread::Builder::new()
                .name(identity.name().to_string())
                .spawn(move || worker.run(&barrier, duration))
                .with_context(|| format!("unable to create worker {}", identity.name()))?;
            self.running.push(Running { identity, handle });
        }
        Ok(())
    }

    /// Wait until every started worker is blocked at the barrier.
    ///
    /// Fails if a worker exits before reaching it.
    pub fn wait_ready(&self) -> Result<()> {
        let barrier = self
            .barrier
            .as_ref()
            .ok_or_else(|| anyhow!("workers not started"))?;
        debug!("Wait for workers being ready...");
        while !barrier.wait_ready(StartBarrier::POLL_INTERVAL) {
            if let Some(dead) = self.running.iter().find(|r| r.handle.is_finished()) {
                return Err(anyhow!(
                    "worker {} exited before reaching the start barrier",
                    dead.identity.name()
                ));
            }
        }
        for r in &self.running {
            if let Some(tid) = r.identity.tid() {
                debug!("{} ready! (tid {})", r.identity.name(), tid);
            }
        }
        Ok(())
    }

    /// Release all workers.
    ///
    /// # Returns
    ///
    /// The release instant, from which every worker's deadline is computed.
    pub fn release(&self) -> Result<Timestamp> {
        let barrier = self
            .barrier
            .as_ref()
            .ok_or_else(|| anyhow!("workers not started"))?;
        debug!("Start workers...");
        Ok(barrier.release())
    }

    /// Waits for all workers.
    ///
    /// Every worker is joined even if some panicked; any panic is then reported
    /// as an error.
    pub fn wait(&mut self) -> Result<Vec<(String, WorkerReport)>> {
        info!("Wait for workers termination...");
        let mut reports = Vec::with_capacity(self.running.len());
        let mut failed = vec![];
        for r in self.running.drain(..) {
            let name = r.identity.name().to_string();
            match r.handle.join() {
                Ok(report) => {
                    debug!("{} joined!", name);
                    reports.push((name, report));
                }
                Err(_) => {
                    error!("{} panicked", name);
                    failed.push(name);
                }
            }
        }
        if !failed.is_empty() {
            return Err(anyhow!("workers panicked: {}", failed.join(", ")));
        }
        Ok(reports)
    }

    /// Runs the whole test: start, synchronize, release, join.
    pub fn run(&mut self) -> Result<RunSummary> {
        self.start()?;
        self.wait_ready()?;
        let released = self.release()?;
        let reports = self.wait()?;
        let terminated = Timestamp::now();
        Ok(RunSummary {
            released,
            terminated,
            reports,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Mutex;

    use more_asserts::assert_ge;
    use more_asserts::assert_lt;

    use super::*;
    use crate::config::WorkerGroup;

    /// Log sink shared between a test and its subscriber.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn test_ordinals_are_per_kind() {
        let mut context = Context::new(Duration::ZERO);
        let b1 = context.add(WorkerParams::batch());
        let i1 = context.add(WorkerParams::interactive(10, 10));
        let b2 = context.add(WorkerParams::batch());
        assert_eq!(b1.name(), "B001");
        assert_eq!(i1.name(), "I001");
        assert_eq!(b2.name(), "B002");
        assert_eq!(context.count(WorkerKind::Batch), 2);
        assert_eq!(context.count(WorkerKind::Yield), 0);
    }

    #[test]
    fn test_run_mix() -> Result<()> {
        let mut context = Context::new(Duration::from_millis(200));
        context.add(WorkerParams::batch());
        context.add(WorkerParams::interactive(1000, 500));
        context.add(WorkerParams::periodic(1000, 10)?);
        context.add(WorkerParams::yielding(1000, 100)?);

        let summary = context.run()?;
        assert_eq!(summary.reports.len(), 4);
        assert_ge!(summary.elapsed(), Duration::from_millis(200));
        assert_lt!(summary.elapsed(), Duration::from_secs(5));
        for (name, report) in &summary.reports {
            assert!(report.iterations > 0, "{name} never ran");
        }
        Ok(())
    }

    #[test]
    fn test_threads_are_named_and_ready() -> Result<()> {
        let mut context = Context::new(Duration::ZERO);
        context.add(WorkerParams::batch());
        context.add(WorkerParams::batch());
        context.start()?;
        context.wait_ready()?;
        for identity in context.identities() {
            assert!(identity.tid().is_some());
        }
        let names: Vec<String> = context
            .running
            .iter()
            .map(|r| r.handle.thread().name().unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, vec!["B001", "B002"]);
        context.release()?;
        context.wait()?;
        Ok(())
    }

    #[test]
    fn test_empty_context_runs() -> Result<()> {
        let mut context = Context::new(Duration::from_secs(1));
        let summary = context.run()?;
        assert!(summary.reports.is_empty());
        Ok(())
    }

    #[test]
    fn test_start_twice_fails() -> Result<()> {
        let mut context = Context::new(Duration::ZERO);
        context.start()?;
        assert!(context.start().is_err());
        Ok(())
    }

    #[test]
    fn test_setup_is_logged_before_workers() {
        let spec = WorkloadSpec::new(Duration::ZERO, false)
            .with_group(WorkerGroup::uniform(WorkerParams::batch(), 2));
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer({
                let captured = captured.clone();
                move || captured.clone()
            })
            .with_ansi(false)
            .finish();
        let context = tracing::subscriber::with_default(subscriber, || Context::from_spec(&spec));
        assert_eq!(context.pending.len(), 2);

        let log = captured.text();
        let setup = log.find("Setup workers..").expect("no setup line");
        let first = log.find("B001: batch").expect("no B001 line");
        let second = log.find("B002: batch").expect("no B002 line");
        assert_lt!(setup, first);
        assert_lt!(first, second);
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(Duration::from_millis(1005)), "1.005");
        assert_eq!(format_seconds(Duration::from_micros(2_340_999)), "2.340");
    }
}
