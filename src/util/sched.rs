//! Execution-unit helpers: kernel thread ids, CPU placement and voluntary yields.

use nix::unistd::Pid;

/// Scheduler utilities for the calling thread.
pub struct Sched;

impl Sched {
    /// Get the kernel thread id of the calling thread.
    ///
    /// This is the id an external profiler reports for the thread.
    pub fn current_tid() -> Pid {
        nix::unistd::gettid()
    }

    /// Get the ID of the CPU that the current thread is running on.
    ///
    /// # Returns
    ///
    /// The ID of the CPU that the current thread is running on, or None if the
    /// information is not available.
    pub fn current_cpu() -> Option<u32> {
        let cpu = unsafe { libc::sched_getcpu() };
        if cpu >= 0 { Some(cpu as u32) } else { None }
    }

    /// Relinquish the processor while staying runnable.
    ///
    /// There is no guaranteed delay: the scheduler may hand the CPU straight back.
    pub fn yield_now() {
        std::thread::yield_now();
    }
}
