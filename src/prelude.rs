//! Convenient re-exports for common types and traits

pub use crate::aggregate::{await_all, AggregateResult, AggregateSummary, ResultBarrier};
pub use crate::core::{
    BoxedTask, ClosureTask, ExecutorError, FailureKind, FailureRecord, FailureSink,
    LoggingFailureSink, RecordingFailureSink, Result, Task, TaskHandle, TaskId,
};
pub use crate::pool::{
    ExecutorChoice, PoolConfig, PoolStats, SaturationPolicy, ShutdownSummary, TaskExecutor,
};
pub use crate::schedule::{
    HeartbeatHandle, HeartbeatSink, LogHeartbeatSink, ScheduleHandle, Scheduler,
};
pub use crate::tracing::TracedTask;
