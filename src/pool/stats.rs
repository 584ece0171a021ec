//! Executor counters and snapshots

use crate::pool::runner::RunOutcome;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lifetime counters shared by all workers of one executor
#[derive(Debug, Default)]
pub struct PoolCounters {
    /// Tasks accepted by the executor
    pub tasks_submitted: AtomicU64,
    /// Tasks that returned `Ok`
    pub tasks_completed: AtomicU64,
    /// Tasks that returned an error
    pub tasks_failed: AtomicU64,
    /// Tasks that panicked
    pub tasks_panicked: AtomicU64,
    /// Submissions refused because the pool was saturated
    pub tasks_rejected: AtomicU64,
}

impl PoolCounters {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment submitted counter
    pub fn increment_submitted(&self) {
        self.tasks_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment rejected counter
    pub fn increment_rejected(&self) {
        self.tasks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one finished execution
    pub fn record(&self, outcome: RunOutcome) {
        let counter = match outcome {
            RunOutcome::Completed => &self.tasks_completed,
            RunOutcome::Failed => &self.tasks_failed,
            RunOutcome::Panicked => &self.tasks_panicked,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total tasks submitted
    pub fn get_submitted(&self) -> u64 {
        self.tasks_submitted.load(Ordering::Relaxed)
    }

    /// Get total tasks completed
    pub fn get_completed(&self) -> u64 {
        self.tasks_completed.load(Ordering::Relaxed)
    }

    /// Get total tasks failed
    pub fn get_failed(&self) -> u64 {
        self.tasks_failed.load(Ordering::Relaxed)
    }

    /// Get total tasks panicked
    pub fn get_panicked(&self) -> u64 {
        self.tasks_panicked.load(Ordering::Relaxed)
    }

    /// Get total submissions rejected
    pub fn get_rejected(&self) -> u64 {
        self.tasks_rejected.load(Ordering::Relaxed)
    }
}

/// Point-in-time view of an executor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Live worker threads
    pub pool_size: usize,
    /// Workers currently running a task
    pub active: usize,
    /// Highest number of live workers seen
    pub largest_pool_size: usize,
    /// Tasks waiting in the backlog queue
    pub queued: usize,
    /// Tasks accepted
    pub submitted: u64,
    /// Tasks that returned `Ok`
    pub completed: u64,
    /// Tasks that returned an error
    pub failed: u64,
    /// Tasks that panicked
    pub panicked: u64,
    /// Submissions refused
    pub rejected: u64,
}

impl PoolStats {
    /// Tasks that finished one way or another
    pub fn finished(&self) -> u64 {
        self.completed + self.failed + self.panicked
    }
}

/// Result of shutting an executor down
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShutdownSummary {
    /// Whether shutdown waited for outstanding tasks
    pub waited: bool,
    /// Queued tasks dropped without running
    pub discarded: usize,
    /// Counters at the end of shutdown
    pub stats: PoolStats,
}
