//! Yield workload: a compute burst followed by a window of cooperative yields.
//!
//! During the yield window the worker keeps sampling the clock, and gives the
//! processor away every `yield_interval`. It stays runnable the whole time.

use std::time::Duration;

use tracing::debug;

use crate::util::clock::Timestamp;
use crate::util::sched::Sched;
use crate::workloads::spinner::Spinner;

pub struct Yield {
    burst_period: Duration,
    yield_interval: Duration,
    /// Total yields issued so far.
    yields: u64,
}

impl Yield {
    pub fn new(burst_period: Duration, yield_interval: Duration) -> Self {
        Self {
            burst_period,
            yield_interval,
            yields: 0,
        }
    }

    pub fn yields(&self) -> u64 {
        self.yields
    }

    pub fn run_once(&mut self, spinner: &Spinner) {
        debug!("burst  for {:9} [us]", self.burst_period.as_micros());
        spinner.spin(self.burst_period);

        let window_start = Timestamp::now();
        let window_end = window_start + self.burst_period;
        let mut next_yield = window_start + self.yield_interval;

        debug!("yield  for {:9} [us]", self.burst_period.as_micros());
        loop {
            let now = Timestamp::now();
            if now.is_at_or_after(window_end) {
                break;
            }
            if now.is_at_or_after(next_yield) {
                next_yield = next_yield + self.yield_interval;
                self.yields += 1;
                Sched::yield_now();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use more_asserts::assert_ge;
    use more_asserts::assert_gt;
    use more_asserts::assert_lt;

    use super::*;

    #[test]
    fn test_iteration_covers_burst_and_window() {
        let mut model = Yield::new(Duration::from_millis(10), Duration::from_millis(1));
        let start = Timestamp::now();
        model.run_once(&Spinner::default());
        let elapsed = start.elapsed();
        assert_ge!(elapsed, Duration::from_millis(20));
        assert_lt!(elapsed, Duration::from_millis(500));
    }

    #[test]
    fn test_yields_happen_within_window() {
        let mut model = Yield::new(Duration::from_millis(10), Duration::from_millis(1));
        model.run_once(&Spinner::default());
        // Roughly one yield per millisecond of window; allow for descheduling.
        assert_gt!(model.yields(), 0);
        assert_lt!(model.yields(), 11);
    }

    #[test]
    fn test_interval_equal_to_period_yields_at_most_once() {
        let mut model = Yield::new(Duration::from_millis(5), Duration::from_millis(5));
        model.run_once(&Spinner::default());
        assert_lt!(model.yields(), 2);
    }

    #[test]
    fn test_zero_burst_returns() {
        let mut model = Yield::new(Duration::ZERO, Duration::ZERO);
        let start = Timestamp::now();
        model.run_once(&Spinner::default());
        assert_lt!(start.elapsed(), Duration::from_millis(100));
    }
}
