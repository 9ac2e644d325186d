//! One-shot start barrier.
//!
//! Workers block in [`StartBarrier::wait`] until the coordinator calls
//! [`StartBarrier::release`]. Arrivals are counted under the same lock the
//! workers sleep on, so once [`StartBarrier::wait_ready`] reports every worker
//! present, none of them can miss the release broadcast.

use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;

use crate::util::clock::Timestamp;

#[derive(Debug, Default)]
struct BarrierState {
    /// Workers expected at the barrier.
    registered: usize,
    /// Workers currently blocked in `wait`.
    waiting: usize,
    /// Set exactly once, by `release`.
    released: Option<Timestamp>,
}

/// A barrier that releases every waiter at once, exactly once.
pub struct StartBarrier {
    state: Mutex<BarrierState>,
    cond: Condvar,
}

impl StartBarrier {
    /// Interval at which the coordinator re-checks readiness.
    pub const POLL_INTERVAL: Duration = Duration::from_millis(1);

    /// Create a locked barrier expecting `registered` workers.
    pub fn new(registered: usize) -> Self {
        Self {
            state: Mutex::new(BarrierState {
                registered,
                ..Default::default()
            }),
            cond: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of workers expected at the barrier.
    pub fn registered(&self) -> usize {
        self.lock().registered
    }

    /// Number of workers that have reached the barrier.
    pub fn waiting(&self) -> usize {
        self.lock().waiting
    }

    /// The release instant, if the barrier has been released.
    pub fn released(&self) -> Option<Timestamp> {
        self.lock().released
    }

    /// Block until the barrier is released.
    ///
    /// # Returns
    ///
    /// The release instant, shared by every waiter.
    pub fn wait(&self) -> Timestamp {
        let mut state = self.lock();
        state.waiting += 1;
        // Wake the coordinator, which may be waiting for the last arrival.
        self.cond.notify_all();
        loop {
            if let Some(released) = state.released {
                return released;
            }
            state = self
                .cond
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Wait until every registered worker is blocked in `wait`.
    ///
    /// Re-checks at least every [`Self::POLL_INTERVAL`].
    ///
    /// # Arguments
    ///
    /// * `timeout` - How long to wait in total
    ///
    /// # Returns
    ///
    /// Whether all workers were ready before the timeout.
    pub fn wait_ready(&self, timeout: Duration) -> bool {
        let deadline = Timestamp::now() + timeout;
        let mut state = self.lock();
        loop {
            if state.waiting >= state.registered {
                return true;
            }
            let now = Timestamp::now();
            if now.is_at_or_after(deadline) {
                return false;
            }
            let slice = Self::POLL_INTERVAL.min(deadline - now);
            state = self
                .cond
                .wait_timeout(state, slice)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Release every waiter.
    ///
    /// Only the first call has an effect; later calls return the original
    /// release instant.
    ///
    /// # Returns
    ///
    /// The release instant: the canonical start time of the test.
    pub fn release(&self) -> Timestamp {
        let mut state = self.lock();
        if let Some(released) = state.released {
            return released;
        }
        let released = Timestamp::now();
        state.released = Some(released);
        self.cond.notify_all();
        released
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use more_asserts::assert_lt;

    use super::*;

    #[test]
    fn test_release_wakes_all_waiters() {
        let barrier = StartBarrier::new(4);
        thread::scope(|s| {
            let handles: Vec<_> = (0..4).map(|_| s.spawn(|| barrier.wait())).collect();
            assert!(barrier.wait_ready(Duration::from_secs(10)));
            let released = barrier.release();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), released);
            }
        });
    }

    #[test]
    fn test_not_ready_until_all_arrive() {
        let barrier = Arc::new(StartBarrier::new(2));
        let first = {
            let barrier = barrier.clone();
            thread::spawn(move || barrier.wait())
        };
        while barrier.waiting() < 1 {
            thread::sleep(StartBarrier::POLL_INTERVAL);
        }
        assert!(!barrier.wait_ready(Duration::from_millis(20)));
        assert_eq!(barrier.waiting(), 1);
        assert!(barrier.released().is_none());

        let second = {
            let barrier = barrier.clone();
            thread::spawn(move || barrier.wait())
        };
        assert!(barrier.wait_ready(Duration::from_secs(10)));
        let released = barrier.release();
        assert_eq!(first.join().unwrap(), released);
        assert_eq!(second.join().unwrap(), released);
    }

    #[test]
    fn test_release_is_one_shot() {
        let barrier = StartBarrier::new(0);
        let first = barrier.release();
        thread::sleep(Duration::from_millis(2));
        let second = barrier.release();
        assert_eq!(first, second);

        // Late arrivals pass straight through once released.
        assert_eq!(barrier.wait(), first);
    }

    #[test]
    fn test_release_after_last_arrival() {
        let barrier = StartBarrier::new(3);
        thread::scope(|s| {
            let handles: Vec<_> = (0..3)
                .map(|_| {
                    s.spawn(|| {
                        let arrived = Timestamp::now();
                        (arrived, barrier.wait())
                    })
                })
                .collect();
            assert!(barrier.wait_ready(Duration::from_secs(10)));
            barrier.release();
            for handle in handles {
                let (arrived, released) = handle.join().unwrap();
                assert!(released.is_at_or_after(arrived));
                assert_lt!(released.elapsed(), Duration::from_secs(10));
            }
        });
    }

    #[test]
    fn test_waiters_resume_promptly_after_last_arrival() {
        const WORKERS: usize = 4;
        let barrier = StartBarrier::new(WORKERS);
        thread::scope(|s| {
            let handles: Vec<_> = (0..WORKERS)
                .map(|_| {
                    s.spawn(|| {
                        let arrived = Timestamp::now();
                        barrier.wait();
                        (arrived, Timestamp::now())
                    })
                })
                .collect();
            assert!(barrier.wait_ready(Duration::from_secs(10)));
            let released = barrier.release();
            let times: Vec<(Timestamp, Timestamp)> =
                handles.into_iter().map(|h| h.join().unwrap()).collect();

            let last_arrival = times.iter().map(|(arrived, _)| *arrived).max().unwrap();
            assert!(released.is_at_or_after(last_arrival));
            for (_, woke) in times {
                assert!(woke.is_at_or_after(released));
                assert_lt!(woke - released, Duration::from_millis(50));
            }
        });
    }

    #[test]
    fn test_empty_barrier_is_ready() {
        let barrier = StartBarrier::new(0);
        let start = Timestamp::now();
        assert!(barrier.wait_ready(Duration::from_secs(10)));
        assert_lt!(start.elapsed(), Duration::from_millis(100));
        assert_eq!(barrier.registered(), 0);
    }
}
