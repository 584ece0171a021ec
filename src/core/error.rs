//! Error types for the task executor

/// Result type for executor operations
pub type Result<T> = std::result::Result<T, ExecutorError>;

/// Errors that can occur in the task executor
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ExecutorError {
    /// Pool and backlog queue are both full
    #[error(
        "Executor '{pool_name}' saturated: {active}/{max_pool_size} workers busy, \
         {queued}/{queue_capacity} tasks queued"
    )]
    PoolSaturated {
        /// Name (thread prefix) of the pool
        pool_name: String,
        /// Number of busy workers
        active: usize,
        /// Maximum pool size
        max_pool_size: usize,
        /// Current queue length
        queued: usize,
        /// Queue capacity
        queue_capacity: usize,
    },

    /// Executor was shut down
    #[error("Executor '{pool_name}' is not running")]
    NotRunning {
        /// Name (thread prefix) of the pool
        pool_name: String,
    },

    /// Blocking submission timed out waiting for queue space
    #[error("Task submission timed out after {timeout_ms}ms")]
    SubmissionTimeout {
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// Failed to spawn a thread
    #[error("Failed to spawn thread '{thread_name}': {message}")]
    SpawnError {
        /// Name the thread would have had
        thread_name: String,
        /// Error message
        message: String,
    },

    /// Failed to join a thread
    #[error("Failed to join thread '{thread_name}': {message}")]
    JoinError {
        /// Name of the thread
        thread_name: String,
        /// Error message
        message: String,
    },

    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },

    /// Task body returned an error
    #[error("Task {task_id} failed: {message}")]
    TaskFailed {
        /// Identity of the failed task
        task_id: String,
        /// Error message
        message: String,
    },

    /// Task body panicked
    #[error("Task {task_id} panicked: {message}")]
    TaskPanicked {
        /// Identity of the task
        task_id: String,
        /// Panic message
        message: String,
    },

    /// Task finished without delivering a result to its handle
    #[error("Task {task_id} ended without producing a result")]
    TaskLost {
        /// Identity of the task
        task_id: String,
    },

    /// More contributions than the barrier expects
    #[error("Result barrier already received all {expected} expected results")]
    BarrierOverflow {
        /// Number of results the barrier was created for
        expected: usize,
    },

    /// General error
    #[error("{0}")]
    Other(String),
}

impl ExecutorError {
    /// Create a pool saturated error
    pub fn pool_saturated(
        pool_name: impl Into<String>,
        active: usize,
        max_pool_size: usize,
        queued: usize,
        queue_capacity: usize,
    ) -> Self {
        ExecutorError::PoolSaturated {
            pool_name: pool_name.into(),
            active,
            max_pool_size,
            queued,
            queue_capacity,
        }
    }

    /// Create a not running error
    pub fn not_running(pool_name: impl Into<String>) -> Self {
        ExecutorError::NotRunning {
            pool_name: pool_name.into(),
        }
    }

    /// Create a submission timeout error
    pub fn submission_timeout(timeout_ms: u64) -> Self {
        ExecutorError::SubmissionTimeout { timeout_ms }
    }

    /// Create a spawn error
    pub fn spawn(thread_name: impl Into<String>, message: impl Into<String>) -> Self {
        ExecutorError::SpawnError {
            thread_name: thread_name.into(),
            message: message.into(),
        }
    }

    /// Create a join error
    pub fn join(thread_name: impl Into<String>, message: impl Into<String>) -> Self {
        ExecutorError::JoinError {
            thread_name: thread_name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        ExecutorError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a task failure error
    pub fn task_failed(task_id: impl ToString, message: impl Into<String>) -> Self {
        ExecutorError::TaskFailed {
            task_id: task_id.to_string(),
            message: message.into(),
        }
    }

    /// Create a task panic error
    pub fn task_panicked(task_id: impl ToString, message: impl Into<String>) -> Self {
        ExecutorError::TaskPanicked {
            task_id: task_id.to_string(),
            message: message.into(),
        }
    }

    /// Create a lost task error
    pub fn task_lost(task_id: impl ToString) -> Self {
        ExecutorError::TaskLost {
            task_id: task_id.to_string(),
        }
    }

    /// Create a barrier overflow error
    pub fn barrier_overflow(expected: usize) -> Self {
        ExecutorError::BarrierOverflow { expected }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        ExecutorError::Other(msg.into())
    }

    /// Whether this error is the synchronous saturation signal
    pub fn is_saturated(&self) -> bool {
        matches!(self, ExecutorError::PoolSaturated { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ExecutorError::pool_saturated("AnExecutor-", 5, 5, 25, 25);
        assert!(err.is_saturated());

        let err = ExecutorError::task_failed(3, "Not happy!");
        assert!(matches!(err, ExecutorError::TaskFailed { .. }));
        assert!(!err.is_saturated());
    }

    #[test]
    fn test_error_display() {
        let err = ExecutorError::pool_saturated("AnExecutor-", 5, 5, 25, 25);
        assert_eq!(
            err.to_string(),
            "Executor 'AnExecutor-' saturated: 5/5 workers busy, 25/25 tasks queued"
        );

        let err = ExecutorError::task_failed("fetch", "connection reset");
        assert_eq!(err.to_string(), "Task fetch failed: connection reset");

        let err = ExecutorError::barrier_overflow(5);
        assert_eq!(
            err.to_string(),
            "Result barrier already received all 5 expected results"
        );
    }

    #[test]
    fn test_errors_are_cloneable() {
        let err = ExecutorError::task_panicked(7, "boom");
        assert_eq!(err.clone(), err);
    }
}
