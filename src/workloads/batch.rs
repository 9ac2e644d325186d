//! Batch workload: saturate the CPU.

use crate::workloads::spinner::busy_loop;

/// A worker that never sleeps.
#[derive(Debug, Default)]
pub struct Batch;

impl Batch {
    /// Run a single busy-spin burst.
    pub fn run_once(&mut self) {
        busy_loop();
    }
}
