//! Periodic workload: fixed period, fixed duty cycle.

use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::util::clock::Timestamp;
use crate::workloads::spinner::Spinner;

/// Split `period` into processing and sleeping time.
///
/// Works in whole microseconds and truncates, so `process + sleep == period`.
/// The product is taken in `u128`, so any period accepted on the command line
/// splits without overflow.
pub fn duty_split(period: Duration, duty_cycle: u32) -> (Duration, Duration) {
    let period_us = period.as_micros();
    let process_us = period_us * u128::from(duty_cycle.min(100)) / 100;
    (micros(process_us), micros(period_us - process_us))
}

fn micros(us: u128) -> Duration {
    Duration::from_micros(u64::try_from(us).unwrap_or(u64::MAX))
}

pub struct Periodic {
    process: Duration,
    sleep: Duration,
}

impl Periodic {
    pub fn new(period: Duration, duty_cycle: u32) -> Self {
        let (process, sleep) = duty_split(period, duty_cycle.min(100));
        Self { process, sleep }
    }

    pub fn process(&self) -> Duration {
        self.process
    }

    pub fn sleep(&self) -> Duration {
        self.sleep
    }

    /// Sleep for the idle part of the period, then compute for the rest.
    pub fn run_once(&mut self, spinner: &Spinner) {
        debug!("sleeping for {:9} [us]", self.sleep.as_micros());
        thread::sleep(self.sleep);

        debug!("process  for {:9} [us]", self.process.as_micros());
        spinner.spin_until(Timestamp::now() + self.process);
    }
}
