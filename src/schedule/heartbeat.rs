//! Periodic liveness signal

use crate::schedule::scheduler::ScheduleHandle;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Tick counter owned by one heartbeat
///
/// Only the heartbeat task increments it; everyone else reads.
#[derive(Debug, Default)]
pub struct HeartbeatState {
    count: AtomicU64,
}

impl HeartbeatState {
    /// Create a counter at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn tick(&self) -> u64 {
        self.count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Ticks so far
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }
}

/// Receives each heartbeat tick
pub trait HeartbeatSink: Send + Sync {
    /// Called on the timer thread with the tick number, starting at 1
    fn beat(&self, count: u64);
}

impl<F> HeartbeatSink for F
where
    F: Fn(u64) + Send + Sync,
{
    fn beat(&self, count: u64) {
        self(count)
    }
}

/// Logs every tick at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogHeartbeatSink;

impl HeartbeatSink for LogHeartbeatSink {
    fn beat(&self, count: u64) {
        log::info!("Scheduled message... {}", count);
    }
}

/// Read-only view of a running heartbeat
#[derive(Debug, Clone)]
pub struct HeartbeatHandle {
    state: Arc<HeartbeatState>,
    schedule: ScheduleHandle,
}

impl HeartbeatHandle {
    pub(crate) fn new(state: Arc<HeartbeatState>, schedule: ScheduleHandle) -> Self {
        Self { state, schedule }
    }

    /// Ticks so far
    pub fn count(&self) -> u64 {
        self.state.count()
    }

    /// Stop the heartbeat
    pub fn cancel(&self) {
        self.schedule.cancel();
    }

    /// Check whether the heartbeat was stopped
    pub fn is_cancelled(&self) -> bool {
        self.schedule.is_cancelled()
    }

    /// The underlying schedule
    pub fn schedule(&self) -> &ScheduleHandle {
        &self.schedule
    }
}
