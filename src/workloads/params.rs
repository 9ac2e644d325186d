//! Worker kinds and their parameters.

use std::fmt;
use std::time::Duration;

use crate::config::ConfigError;

/// The load shape a worker emulates. Fixed for the worker's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorkerKind {
    /// Continuous CPU saturation.
    Batch,
    /// Random sleeps followed by random bursts of compute.
    Interactive,
    /// Fixed period, fixed duty cycle.
    Periodic,
    /// Compute bursts followed by a window of voluntary yields.
    Yield,
}

impl WorkerKind {
    /// All kinds, in launch order.
    pub const ALL: [WorkerKind; 4] = [
        WorkerKind::Batch,
        WorkerKind::Interactive,
        WorkerKind::Periodic,
        WorkerKind::Yield,
    ];

    /// Single letter prefix used in worker names.
    pub fn letter(self) -> char {
        match self {
            WorkerKind::Batch => 'B',
            WorkerKind::Interactive => 'I',
            WorkerKind::Periodic => 'P',
            WorkerKind::Yield => 'Y',
        }
    }

    /// Position of the kind in [`WorkerKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkerKind::Batch => "Batch",
            WorkerKind::Interactive => "Interactive",
            WorkerKind::Periodic => "Periodic",
            WorkerKind::Yield => "Yield",
        };
        f.write_str(label)
    }
}

/// Per-kind worker parameters.
///
/// Constructors validate their inputs, so a value of this type is always runnable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerParams {
    Batch,
    Interactive {
        /// Upper bound of the uniformly sampled sleep before each burst.
        interval_max: Duration,
        /// Upper bound of the uniformly sampled burst length.
        duration_max: Duration,
    },
    Periodic {
        period: Duration,
        /// Percentage of `period` spent computing, in `[0, 100]`.
        duty_cycle: u32,
    },
    Yield {
        burst_period: Duration,
        /// Never larger than `burst_period`.
        yield_interval: Duration,
    },
}

impl WorkerParams {
    pub fn batch() -> Self {
        WorkerParams::Batch
    }

    pub fn interactive(interval_max_us: u64, duration_max_us: u64) -> Self {
        WorkerParams::Interactive {
            interval_max: Duration::from_micros(interval_max_us),
            duration_max: Duration::from_micros(duration_max_us),
        }
    }

    /// Periodic parameters; rejects a duty cycle above 100%.
    pub fn periodic(period_us: u64, duty_cycle: u64) -> Result<Self, ConfigError> {
        if duty_cycle > 100 {
            return Err(ConfigError::DutyCycle { duty_cycle });
        }
        Ok(WorkerParams::Periodic {
            period: Duration::from_micros(period_us),
            duty_cycle: duty_cycle as u32,
        })
    }

    /// Yield parameters; rejects a yield interval longer than the burst period.
    pub fn yielding(burst_period_us: u64, yield_interval_us: u64) -> Result<Self, ConfigError> {
        if yield_interval_us > burst_period_us {
            return Err(ConfigError::YieldInterval {
                burst_period_us,
                yield_interval_us,
            });
        }
        Ok(WorkerParams::Yield {
            burst_period: Duration::from_micros(burst_period_us),
            yield_interval: Duration::from_micros(yield_interval_us),
        })
    }

    /// Build the parameters of `kind` from the two numbers given on the command line.
    pub fn from_pair(kind: WorkerKind, first: u64, second: u64) -> Result<Self, ConfigError> {
        match kind {
            WorkerKind::Batch => Ok(Self::batch()),
            WorkerKind::Interactive => Ok(Self::interactive(first, second)),
            WorkerKind::Periodic => Self::periodic(first, second),
            WorkerKind::Yield => Self::yielding(first, second),
        }
    }

    pub fn kind(&self) -> WorkerKind {
        match self {
            WorkerParams::Batch => WorkerKind::Batch,
            WorkerParams::Interactive { .. } => WorkerKind::Interactive,
            WorkerParams::Periodic { .. } => WorkerKind::Periodic,
            WorkerParams::Yield { .. } => WorkerKind::Yield,
        }
    }
}

impl fmt::Display for WorkerParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerParams::Batch => write!(f, "batch"),
            WorkerParams::Interactive {
                interval_max,
                duration_max,
            } => write!(
                f,
                "max_interval {:6} [us], max_duration {:6} [us]",
                interval_max.as_micros(),
                duration_max.as_micros()
            ),
            WorkerParams::Periodic { period, duty_cycle } => write!(
                f,
                "    interval {:6} [us], duty-cycle   {:6} [%]",
                period.as_micros(),
                duty_cycle
            ),
            WorkerParams::Yield {
                burst_period,
                yield_interval,
            } => write!(
                f,
                "      period {:6} [us], yield_interval {:6} [us]",
                burst_period.as_micros(),
                yield_interval.as_micros()
            ),
        }
    }
}
