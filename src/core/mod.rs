//! Core types and traits for the task executor

pub mod error;
pub mod failure;
pub mod handle;
pub mod task;

pub use error::{ExecutorError, Result};
pub use failure::{FailureKind, FailureRecord, FailureSink, LoggingFailureSink, RecordingFailureSink};
pub use handle::TaskHandle;
pub(crate) use handle::HandleTask;
pub use task::{BoxedTask, ClosureTask, Task, TaskId};
