//! Interactive workload: interrupt-driven bursts.
//!
//! Each iteration sleeps for a random delay and then computes for a random
//! amount of time. Both are drawn uniformly from `[0, max]` microseconds.

use std::thread;
use std::time::Duration;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::util::clock::Timestamp;
use crate::workloads::spinner::Spinner;

pub struct Interactive {
    interval_max_us: u64,
    duration_max_us: u64,
    /// Private to this worker; seeded from its thread id.
    rng: StdRng,
}

impl Interactive {
    pub fn new(interval_max: Duration, duration_max: Duration, seed: u64) -> Self {
        Self {
            interval_max_us: interval_max.as_micros() as u64,
            duration_max_us: duration_max.as_micros() as u64,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Sample the sleep before the next burst.
    pub fn next_delay(&mut self) -> Duration {
        Duration::from_micros(self.rng.gen_range(0..=self.interval_max_us))
    }

    /// Sample the length of the next burst.
    pub fn next_process(&mut self) -> Duration {
        Duration::from_micros(self.rng.gen_range(0..=self.duration_max_us))
    }

    pub fn run_once(&mut self, spinner: &Spinner) {
        let delay = self.next_delay();
        debug!("sleeping for {:9} [us]", delay.as_micros());
        thread::sleep(delay);

        let process = self.next_process();
        debug!("process  for {:9} [us]", process.as_micros());
        spinner.spin_until(Timestamp::now() + process);
    }
}
