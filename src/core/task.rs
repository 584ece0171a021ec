//! Task trait and related types

use crate::core::error::{ExecutorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a submitted task
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    /// Numeric identity
    Seq(u64),
    /// Named identity
    Name(String),
}

impl TaskId {
    /// Allocate the next process-wide sequence id
    pub fn next() -> Self {
        TaskId::Seq(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::Seq(n) => write!(f, "{}", n),
            TaskId::Name(name) => f.write_str(name),
        }
    }
}

impl From<u64> for TaskId {
    fn from(n: u64) -> Self {
        TaskId::Seq(n)
    }
}

impl From<usize> for TaskId {
    fn from(n: usize) -> Self {
        TaskId::Seq(n as u64)
    }
}

impl From<i32> for TaskId {
    fn from(n: i32) -> Self {
        match u64::try_from(n) {
            Ok(seq) => TaskId::Seq(seq),
            Err(_) => TaskId::Name(n.to_string()),
        }
    }
}

impl From<&str> for TaskId {
    fn from(name: &str) -> Self {
        TaskId::Name(name.to_string())
    }
}

impl From<String> for TaskId {
    fn from(name: String) -> Self {
        TaskId::Name(name)
    }
}

/// A unit of deferred work executed by the pool
pub trait Task: Send {
    /// Identity used in logs and failure reports
    fn id(&self) -> &TaskId;

    /// Run the task body
    ///
    /// # Errors
    ///
    /// Returns an error if the task body fails. The error is routed to the
    /// executor's failure sink, never back to the submitter.
    fn run(&mut self) -> Result<()>;
}

impl fmt::Debug for dyn Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task({})", self.id())
    }
}

/// A boxed task that can be sent across threads
pub type BoxedTask = Box<dyn Task>;

/// Helper to create a task from a closure
pub struct ClosureTask<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    id: TaskId,
    closure: Option<F>,
}

impl<F> ClosureTask<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    /// Create a closure task with an auto-assigned id
    pub fn new(closure: F) -> Self {
        Self::with_id(TaskId::next(), closure)
    }

    /// Create a closure task with the given id
    pub fn with_id(id: impl Into<TaskId>, closure: F) -> Self {
        Self {
            id: id.into(),
            closure: Some(closure),
        }
    }
}

impl<F> Task for ClosureTask<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    fn id(&self) -> &TaskId {
        &self.id
    }

    fn run(&mut self) -> Result<()> {
        match self.closure.take() {
            Some(closure) => closure(),
            None => Err(ExecutorError::task_failed(
                &self.id,
                "ClosureTask already executed - cannot execute twice",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_task() {
        let mut task = ClosureTask::with_id("greeting", || Ok(()));

        assert_eq!(task.id(), &TaskId::from("greeting"));
        assert!(task.run().is_ok());
    }

    #[test]
    fn test_closure_task_runs_once() {
        let mut task = ClosureTask::with_id(4u64, || Ok(()));
        task.run().expect("first run succeeds");

        let err = task.run().unwrap_err();
        assert!(matches!(err, ExecutorError::TaskFailed { .. }));
    }

    #[test]
    fn test_sequence_ids_are_unique() {
        let a = TaskId::next();
        let b = TaskId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_negative_ids_stay_distinct() {
        assert_eq!(TaskId::from(7i32), TaskId::Seq(7));
        assert_eq!(TaskId::from(-1i32), TaskId::Name("-1".to_string()));
        assert_ne!(TaskId::from(-1i32), TaskId::from(-2i32));
        assert_eq!(TaskId::from(-3i32).to_string(), "-3");
    }

    #[test]
    fn test_task_id_display_and_serde() {
        assert_eq!(TaskId::from(3u64).to_string(), "3");
        assert_eq!(TaskId::from("heartbeat").to_string(), "heartbeat");

        let json = serde_json::to_string(&TaskId::from(9u64)).unwrap();
        assert_eq!(json, "9");
        let back: TaskId = serde_json::from_str("\"fetch\"").unwrap();
        assert_eq!(back, TaskId::Name("fetch".to_string()));
    }
}
