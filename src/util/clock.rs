//! Clock and timer utilities.
//!
//! All readings come from a monotonic clock that is never stepped by NTP or by
//! an administrator, so deadlines computed at the start of a run stay valid for
//! the whole run.

use std::ops::Add;
use std::ops::Sub;
use std::time::Duration;

const NANOS_PER_SEC: u32 = 1_000_000_000;

#[cfg(any(target_os = "linux", target_os = "android"))]
const CLOCK_ID: libc::clockid_t = libc::CLOCK_MONOTONIC_RAW;

#[cfg(not(any(target_os = "linux", target_os = "android")))]
const CLOCK_ID: libc::clockid_t = libc::CLOCK_MONOTONIC;

/// A point in time on the monotonic clock.
///
/// The sub-second component is always normalized into `[0, 1e9)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    secs: i64,
    nanos: u32,
}

impl Timestamp {
    /// Build a timestamp from raw parts, carrying any excess nanoseconds into seconds.
    pub fn new(secs: i64, nanos: u32) -> Self {
        Self {
            secs: secs.saturating_add(i64::from(nanos / NANOS_PER_SEC)),
            nanos: nanos % NANOS_PER_SEC,
        }
    }

    /// Sample the monotonic clock.
    pub fn now() -> Self {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // SAFETY: `ts` is a valid, writable timespec and CLOCK_ID is supported on this target.
        let rc = unsafe { libc::clock_gettime(CLOCK_ID, &mut ts) };
        debug_assert_eq!(rc, 0, "clock_gettime failed");
        Self::new(ts.tv_sec as i64, ts.tv_nsec as u32)
    }

    /// Whole seconds component.
    pub fn secs(&self) -> i64 {
        self.secs
    }

    /// Sub-second component, in `[0, 1e9)`.
    pub fn subsec_nanos(&self) -> u32 {
        self.nanos
    }

    /// Return the timestamp `duration` after this one.
    pub fn add_duration(self, duration: Duration) -> Self {
        let mut secs = self
            .secs
            .saturating_add(i64::try_from(duration.as_secs()).unwrap_or(i64::MAX));
        let mut nanos = self.nanos + duration.subsec_nanos();
        if nanos >= NANOS_PER_SEC {
            nanos -= NANOS_PER_SEC;
            secs = secs.saturating_add(1);
        }
        Self { secs, nanos }
    }

    /// Time elapsed from `earlier` to this timestamp.
    ///
    /// Returns zero if `earlier` is actually later.
    pub fn duration_since(self, earlier: Timestamp) -> Duration {
        if earlier.is_at_or_after(self) {
            return Duration::ZERO;
        }
        let mut secs = self.secs - earlier.secs;
        let nanos = if self.nanos >= earlier.nanos {
            self.nanos - earlier.nanos
        } else {
            // Borrow a second.
            secs -= 1;
            self.nanos + NANOS_PER_SEC - earlier.nanos
        };
        Duration::new(secs as u64, nanos)
    }

    /// Time elapsed since this timestamp was taken.
    pub fn elapsed(self) -> Duration {
        Self::now().duration_since(self)
    }

    /// True when this timestamp is at or after `other`.
    ///
    /// Every deadline check uses this, so a loop exits on the first sample that
    /// reaches the deadline rather than waiting for a strict overshoot.
    pub fn is_at_or_after(self, other: Timestamp) -> bool {
        if self.secs != other.secs {
            return self.secs > other.secs;
        }
        self.nanos >= other.nanos
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        self.add_duration(rhs)
    }
}

impl Sub for Timestamp {
    type Output = Duration;

    fn sub(self, rhs: Timestamp) -> Duration {
        self.duration_since(rhs)
    }
}

/// Measures time elapsed from a fixed origin, such as process start.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    /// The origin of the timer.
    start: Timestamp,
}

impl Timer {
    /// Create a new timer.
    ///
    /// # Returns
    ///
    /// A new `Timer` instance initialized with the current time.
    pub fn new() -> Self {
        Self {
            start: Timestamp::now(),
        }
    }

    /// The origin of the timer.
    pub fn start(&self) -> Timestamp {
        self.start
    }

    /// Get the elapsed time since the timer was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Elapsed microseconds, with sub-microsecond fraction.
    pub fn elapsed_us(&self) -> f64 {
        self.elapsed().as_nanos() as f64 / 1_000.0
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
