//! Failure reporting for tasks that have no caller to propagate to
//!
//! Fire-and-forget submissions return before the task runs, so a failing task
//! body has nowhere to send its error. The executor hands every such failure
//! to a [`FailureSink`] instead of dropping it.
//!
//! # Example
//!
//! ```rust
//! use rust_task_executor::core::{FailureRecord, FailureSink};
//!
//! struct Alerting;
//!
//! impl FailureSink for Alerting {
//!     fn handle_failure(&self, record: &FailureRecord) {
//!         eprintln!("task {} failed: {}", record.task_id, record.error);
//!     }
//! }
//! ```

use crate::core::error::ExecutorError;
use crate::core::task::TaskId;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// How a task failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The task body returned an error
    Error,
    /// The task body panicked
    Panic,
}

/// A single task failure, passed to the sink and then discarded
#[derive(Debug, Clone)]
pub struct FailureRecord {
    /// Identity of the failed task
    pub task_id: TaskId,
    /// The error the task produced
    pub error: ExecutorError,
    /// Whether the task errored or panicked
    pub kind: FailureKind,
    /// Name of the thread the task ran on
    pub thread_name: Option<String>,
    /// When the failure was observed
    pub failed_at: DateTime<Utc>,
}

impl FailureRecord {
    /// Create a record stamped with the current thread and time
    pub fn new(task_id: TaskId, error: ExecutorError, kind: FailureKind) -> Self {
        Self {
            task_id,
            error,
            kind,
            thread_name: std::thread::current().name().map(str::to_string),
            failed_at: Utc::now(),
        }
    }
}

/// Hook invoked whenever a submitted task fails
///
/// Implementations must not panic; the executor catches and logs a panicking
/// sink, but the failure it was reporting is then lost.
pub trait FailureSink: Send + Sync {
    /// Handle one task failure
    fn handle_failure(&self, record: &FailureRecord);
}

impl<F> FailureSink for F
where
    F: Fn(&FailureRecord) + Send + Sync,
{
    fn handle_failure(&self, record: &FailureRecord) {
        self(record)
    }
}

/// Default sink: logs each failure at warn level
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingFailureSink;

impl FailureSink for LoggingFailureSink {
    fn handle_failure(&self, record: &FailureRecord) {
        match record.kind {
            FailureKind::Error => log::warn!(
                "Exception in async task {} on {}: {}",
                record.task_id,
                record.thread_name.as_deref().unwrap_or("<unnamed>"),
                record.error
            ),
            FailureKind::Panic => log::error!(
                "Async task {} panicked on {}: {}",
                record.task_id,
                record.thread_name.as_deref().unwrap_or("<unnamed>"),
                record.error
            ),
        }
    }
}

/// Sink that keeps every record it receives
#[derive(Debug, Default)]
pub struct RecordingFailureSink {
    records: Mutex<Vec<FailureRecord>>,
}

impl RecordingFailureSink {
    /// Create an empty recording sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all records received so far
    pub fn records(&self) -> Vec<FailureRecord> {
        self.records.lock().clone()
    }

    /// Number of records received so far
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether no failure has been recorded
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Number of records for the given task
    pub fn count_for(&self, task_id: &TaskId) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| &r.task_id == task_id)
            .count()
    }
}

impl FailureSink for RecordingFailureSink {
    fn handle_failure(&self, record: &FailureRecord) {
        self.records.lock().push(record.clone());
    }
}
