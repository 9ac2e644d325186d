//! Spinner workload implementation.
//!
//! This is intentionally CPU-bound: the processor is never relinquished while
//! spinning.

use std::hint::black_box;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::sync::atomic::compiler_fence;
use std::time::Duration;

use crate::util::clock::Timestamp;
use crate::util::sched::Sched;

/// Run one short burst of CPU work.
///
/// Increments a 16 bit counter until it wraps around. The counter goes through
/// `black_box` and a compiler fence so the optimizer cannot elide the loop; the
/// burst takes an uncontrolled, but short, amount of time.
#[inline(never)]
pub fn busy_loop() {
    let mut counter: u16 = 1;
    while black_box(counter) != 0 {
        compiler_fence(Ordering::SeqCst);
        counter = counter.wrapping_add(1);
    }
}

/// A workload that spins until a deadline.
#[derive(Default)]
pub struct Spinner {
    /// The ID of the CPU that the spinner last ran on.
    cpu_id: AtomicU32,
}

impl Spinner {
    /// Poll-spin until `deadline`: sample the clock, and run a burst if the
    /// deadline has not been reached yet.
    ///
    /// # Arguments
    ///
    /// * `deadline` - The instant at which to stop spinning
    pub fn spin_until(&self, deadline: Timestamp) {
        while !Timestamp::now().is_at_or_after(deadline) {
            busy_loop();
        }
        if let Some(cpu) = Sched::current_cpu() {
            self.cpu_id.store(cpu, Ordering::Relaxed);
        }
    }

    /// Spin for the specified duration, starting now.
    ///
    /// # Arguments
    ///
    /// * `duration` - The duration to spin for
    pub fn spin(&self, duration: Duration) {
        self.spin_until(Timestamp::now() + duration);
    }

    /// Get the ID of the CPU that the spinner last ran on.
    ///
    /// # Returns
    ///
    /// The ID of the CPU that the spinner last ran on.
    pub fn last_cpu(&self) -> u32 {
        self.cpu_id.load(Ordering::Relaxed)
    }
}
