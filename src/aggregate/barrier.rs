//! Count-down barrier that collects the outcomes of N tasks

use crate::core::{ExecutorError, Result};
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Slots<T> {
    outcomes: Vec<T>,
    remaining: usize,
}

/// A one-shot barrier sized for `expected` successful contributions
///
/// Each contribution appends an outcome and decrements the counter inside a
/// single critical section, so the number of stored outcomes always equals
/// `expected - remaining`. Waiters are released when the counter reaches zero.
///
/// # Example
///
/// ```rust
/// use rust_task_executor::aggregate::ResultBarrier;
/// use std::time::Duration;
///
/// let barrier = ResultBarrier::new(2);
/// barrier.contribute("fox").unwrap();
/// assert!(!barrier.await_timeout(Duration::from_millis(10)));
///
/// barrier.contribute("dog").unwrap();
/// assert!(barrier.await_timeout(Duration::from_millis(10)));
/// assert_eq!(barrier.snapshot(), vec!["fox", "dog"]);
/// ```
#[derive(Debug)]
pub struct ResultBarrier<T> {
    expected: usize,
    slots: Mutex<Slots<T>>,
    zero: Condvar,
}

impl<T> ResultBarrier<T> {
    /// Create a barrier expecting `expected` contributions
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            slots: Mutex::new(Slots {
                outcomes: Vec::with_capacity(expected),
                remaining: expected,
            }),
            zero: Condvar::new(),
        }
    }

    /// Number of contributions the barrier was created for
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Contributions still outstanding
    pub fn remaining(&self) -> usize {
        self.slots.lock().remaining
    }

    /// Contributions received so far
    pub fn completed(&self) -> usize {
        self.slots.lock().outcomes.len()
    }

    /// Whether every expected contribution arrived
    pub fn is_complete(&self) -> bool {
        self.remaining() == 0
    }

    /// Append an outcome and count down, returning the remaining count
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::BarrierOverflow`] when all expected outcomes
    /// were already received; the outcome is not stored.
    pub fn contribute(&self, outcome: T) -> Result<usize> {
        let mut slots = self.slots.lock();
        if slots.remaining == 0 {
            return Err(ExecutorError::barrier_overflow(self.expected));
        }
        slots.outcomes.push(outcome);
        slots.remaining -= 1;
        let remaining = slots.remaining;
        drop(slots);

        if remaining == 0 {
            self.zero.notify_all();
        }
        Ok(remaining)
    }

    /// Wait until the counter reaches zero or `timeout` elapses
    ///
    /// Returns `true` if all contributions arrived, `false` on timeout. A
    /// timeout is an expected outcome; inspect [`remaining`](Self::remaining)
    /// to see how many tasks did not report.
    ///
    /// A timeout too large to represent as a deadline waits without one.
    pub fn await_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait();
            return true;
        };
        let mut slots = self.slots.lock();
        while slots.remaining > 0 {
            if self.zero.wait_until(&mut slots, deadline).timed_out() {
                return slots.remaining == 0;
            }
        }
        true
    }

    /// Wait without a deadline until the counter reaches zero
    pub fn wait(&self) {
        let mut slots = self.slots.lock();
        while slots.remaining > 0 {
            self.zero.wait(&mut slots);
        }
    }
}

impl<T: Clone> ResultBarrier<T> {
    /// Copy of the outcomes received so far, in completion order
    pub fn snapshot(&self) -> Vec<T> {
        self.slots.lock().outcomes.clone()
    }

    /// Outcomes and remaining count read under one lock acquisition
    pub fn view(&self) -> (Vec<T>, usize) {
        let slots = self.slots.lock();
        (slots.outcomes.clone(), slots.remaining)
    }
}
