//! Command line surface and the validated workload description.
//!
//! Everything is checked here, before any worker exists: a [`WorkloadSpec`]
//! only ever holds runnable parameters.

use std::time::Duration;

use clap::ArgAction;
use clap::Parser;
use thiserror::Error;

use crate::workloads::params::WorkerKind;
use crate::workloads::params::WorkerParams;

/// Configuration errors, reported before anything is launched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("wrong {kind} workload specification: invalid worker count `{value}`")]
    InvalidCount { kind: WorkerKind, value: String },

    #[error("wrong {kind} workload specification: invalid number `{value}`")]
    InvalidNumber { kind: WorkerKind, value: String },

    #[error(
        "wrong {kind} workload specification: {fields} parameters given for {count} workers \
         (expected {expected})"
    )]
    ParamCount {
        kind: WorkerKind,
        count: u32,
        fields: usize,
        expected: &'static str,
    },

    #[error("wrong Periodic workload specification: duty-cycle {duty_cycle} > 100")]
    DutyCycle { duty_cycle: u64 },

    #[error(
        "wrong Yield workload specification: yield interval {yield_interval_us} [us] > \
         burst period {burst_period_us} [us]"
    )]
    YieldInterval {
        burst_period_us: u64,
        yield_interval_us: u64,
    },
}

/// The workers requested for one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerGroup {
    kind: WorkerKind,
    params: Vec<WorkerParams>,
}

impl WorkerGroup {
    /// Largest worker count accepted per kind.
    pub const MAX_WORKERS: u32 = u8::MAX as u32;

    /// A group with no workers.
    pub fn empty(kind: WorkerKind) -> Self {
        Self {
            kind,
            params: Vec::new(),
        }
    }

    /// `count` workers sharing the same parameters.
    pub fn uniform(params: WorkerParams, count: u32) -> Self {
        Self {
            kind: params.kind(),
            params: vec![params; count as usize],
        }
    }

    /// Parse `N[,A,B[,A,B...]]`.
    ///
    /// A single `A,B` pair applies to every worker; otherwise there must be one
    /// pair per worker. Batch workers take no parameters.
    pub fn parse(kind: WorkerKind, value: &str) -> Result<Self, ConfigError> {
        let mut fields = value.split(',').map(str::trim);
        let count_field = fields.next().unwrap_or_default();
        let count = count_field
            .parse::<u32>()
            .ok()
            .filter(|count| *count <= Self::MAX_WORKERS)
            .ok_or_else(|| ConfigError::InvalidCount {
                kind,
                value: count_field.to_string(),
            })?;
        let numbers = fields
            .map(|field| {
                field.parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
                    kind,
                    value: field.to_string(),
                })
            })
            .collect::<Result<Vec<u64>, _>>()?;

        if kind == WorkerKind::Batch {
            if !numbers.is_empty() {
                return Err(ConfigError::ParamCount {
                    kind,
                    count,
                    fields: numbers.len(),
                    expected: "none",
                });
            }
            return Ok(Self::uniform(WorkerParams::batch(), count));
        }

        let per_worker = numbers.len() == 2 * count as usize;
        let shared = numbers.len() == 2;
        if !(per_worker || shared) {
            return Err(ConfigError::ParamCount {
                kind,
                count,
                fields: numbers.len(),
                expected: "one pair, or one pair per worker",
            });
        }

        let params = (0..count as usize)
            .map(|i| {
                let pair = if shared { 0 } else { 2 * i };
                WorkerParams::from_pair(kind, numbers[pair], numbers[pair + 1])
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { kind, params })
    }

    pub fn kind(&self) -> WorkerKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn params(&self) -> &[WorkerParams] {
        &self.params
    }
}

/// A fully validated test description. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadSpec {
    verbose: bool,
    duration: Duration,
    /// Indexed by [`WorkerKind::index`].
    groups: [WorkerGroup; 4],
}

impl WorkloadSpec {
    /// Default test duration.
    pub const DEFAULT_DURATION: Duration = Duration::from_secs(5);

    /// A spec with no workers.
    pub fn new(duration: Duration, verbose: bool) -> Self {
        Self {
            verbose,
            duration,
            groups: WorkerKind::ALL.map(WorkerGroup::empty),
        }
    }

    /// Replace the workers of `group`'s kind.
    pub fn with_group(mut self, group: WorkerGroup) -> Self {
        let index = group.kind().index();
        self.groups[index] = group;
        self
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Length of the timed part of the test.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn group(&self, kind: WorkerKind) -> &WorkerGroup {
        &self.groups[kind.index()]
    }

    pub fn count(&self, kind: WorkerKind) -> usize {
        self.group(kind).len()
    }

    pub fn total_workers(&self) -> usize {
        self.groups.iter().map(WorkerGroup::len).sum()
    }

    /// Every worker's parameters, Batch first, then Interactive, Periodic and Yield.
    pub fn workers(&self) -> impl Iterator<Item = &WorkerParams> {
        self.groups.iter().flat_map(|group| group.params().iter())
    }
}

fn parse_batch(value: &str) -> Result<WorkerGroup, ConfigError> {
    WorkerGroup::parse(WorkerKind::Batch, value)
}

fn parse_interactive(value: &str) -> Result<WorkerGroup, ConfigError> {
    WorkerGroup::parse(WorkerKind::Interactive, value)
}

fn parse_periodic(value: &str) -> Result<WorkerGroup, ConfigError> {
    WorkerGroup::parse(WorkerKind::Periodic, value)
}

fn parse_yield(value: &str) -> Result<WorkerGroup, ConfigError> {
    WorkerGroup::parse(WorkerKind::Yield, value)
}

/// Command line arguments for the wlgen binary.
#[derive(Parser, Debug)]
#[command(
    name = "wlgen",
    about = "Synthetic CPU workload mix generator",
    long_about = "This program spawns a mix of worker threads, each emulating a load shape \
                 (batch, interactive, periodic, yielding), releases them all at the same \
                 instant and runs them for a fixed duration. It is meant to be observed by an \
                 external profiler.\n\n\
                 All durations given to workers are in microseconds."
)]
pub struct Args {
    /// Spawn N BATCH workers.
    #[arg(short = 'b', long = "batch", value_name = "N", value_parser = parse_batch)]
    batch: Option<WorkerGroup>,

    /// Spawn N INTERACTIVE workers: start (at least) once every I [us], run for up to D [us].
    /// I and D are upper bounds for uniformly distributed actual values.
    #[arg(short = 'i', long = "interactive", value_name = "N,I,D", value_parser = parse_interactive)]
    interactive: Option<WorkerGroup>,

    /// Spawn N PERIODIC workers: period of P [us], running D [%] of it.
    #[arg(short = 'p', long = "periodic", value_name = "N,P,D", value_parser = parse_periodic)]
    periodic: Option<WorkerGroup>,

    /// Spawn N YIELD workers: burst/yield period of P [us], yielding every I [us] during
    /// the yield period.
    #[arg(short = 'y', long = "yield", value_name = "N,P,I", value_parser = parse_yield)]
    yielding: Option<WorkerGroup>,

    /// Test duration in seconds.
    #[arg(short = 'd', long = "duration", value_name = "N", default_value_t = 5)]
    duration: u64,

    /// Enable debug output.
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

impl Args {
    /// Build the workload description.
    pub fn into_spec(self) -> WorkloadSpec {
        let groups = [self.batch, self.interactive, self.periodic, self.yielding];
        groups.into_iter().flatten().fold(
            WorkloadSpec::new(Duration::from_secs(self.duration), self.verbose),
            WorkloadSpec::with_group,
        )
    }
}
