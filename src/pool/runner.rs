//! Failure-isolating task execution

use crate::aggregate::AggregateResult;
use crate::core::{
    BoxedTask, ExecutorError, FailureKind, FailureRecord, FailureSink, LoggingFailureSink, Result,
    Task, TaskId,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::{span, Level};

/// How a single task execution ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The task body returned `Ok`
    Completed,
    /// The task body returned an error, reported to the sink
    Failed,
    /// The task body panicked, reported to the sink
    Panicked,
}

/// Runs tasks so that one task's failure never affects the pool or other tasks
///
/// Errors and panics are converted into [`FailureRecord`]s and handed to the
/// configured [`FailureSink`] exactly once. Nothing is retried.
#[derive(Clone)]
pub struct TaskRunner {
    sink: Arc<dyn FailureSink>,
}

impl std::fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRunner").finish_non_exhaustive()
    }
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::new(Arc::new(LoggingFailureSink))
    }
}

impl TaskRunner {
    /// Create a runner reporting to the given sink
    pub fn new(sink: Arc<dyn FailureSink>) -> Self {
        Self { sink }
    }

    /// The sink failures are reported to
    pub fn sink(&self) -> &Arc<dyn FailureSink> {
        &self.sink
    }

    /// Run a boxed task to completion or failure
    pub fn run(&self, mut task: BoxedTask) -> RunOutcome {
        self.run_task(task.as_mut())
    }

    /// Run a task in place to completion or failure
    pub fn run_task(&self, task: &mut dyn Task) -> RunOutcome {
        #[cfg(feature = "tracing")]
        let task_span = span!(Level::DEBUG, "task_execution", task_id = %task.id());
        #[cfg(feature = "tracing")]
        let _task_guard = task_span.enter();

        let start = Instant::now();
        let result = catch_unwind(AssertUnwindSafe(|| task.run()));
        let elapsed = start.elapsed();

        match result {
            Ok(Ok(())) => {
                log::trace!("Task {} completed in {:?}", task.id(), elapsed);
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_completion(elapsed, true);
                RunOutcome::Completed
            }
            Ok(Err(error)) => {
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_completion(elapsed, false);
                self.report(FailureRecord::new(task.id().clone(), error, FailureKind::Error));
                RunOutcome::Failed
            }
            Err(panic_info) => {
                let message = panic_message(panic_info.as_ref());
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_panic(elapsed);
                let error = ExecutorError::task_panicked(task.id(), message);
                self.report(FailureRecord::new(task.id().clone(), error, FailureKind::Panic));
                RunOutcome::Panicked
            }
        }
    }

    /// Hand a failure to the sink; a panicking sink is logged and swallowed
    pub(crate) fn report(&self, record: FailureRecord) {
        let sink = Arc::clone(&self.sink);
        if let Err(panic_info) = catch_unwind(AssertUnwindSafe(|| sink.handle_failure(&record))) {
            log::error!(
                "Failure sink panicked while reporting task {}: {}",
                record.task_id,
                panic_message(panic_info.as_ref())
            );
        }
    }
}

/// Task adapter that records its closure's value into an aggregate on success
///
/// A failing closure leaves the aggregate untouched: nothing is appended and
/// the counter is not decremented.
pub(crate) struct ContributingTask<T, F>
where
    F: FnOnce() -> Result<T> + Send,
{
    id: TaskId,
    closure: Option<F>,
    aggregate: AggregateResult<T>,
}

impl<T, F> ContributingTask<T, F>
where
    F: FnOnce() -> Result<T> + Send,
{
    pub(crate) fn new(id: TaskId, aggregate: AggregateResult<T>, closure: F) -> Self {
        Self {
            id,
            closure: Some(closure),
            aggregate,
        }
    }
}

impl<T, F> Task for ContributingTask<T, F>
where
    T: Send,
    F: FnOnce() -> Result<T> + Send,
{
    fn id(&self) -> &TaskId {
        &self.id
    }

    fn run(&mut self) -> Result<()> {
        let closure = self.closure.take().ok_or_else(|| {
            ExecutorError::task_failed(&self.id, "ContributingTask already executed")
        })?;
        let outcome = closure()?;
        self.aggregate.record(outcome)?;
        log::info!(
            "{}) Adding results to aggregate {}",
            self.id,
            self.aggregate.id()
        );
        Ok(())
    }
}

pub(crate) fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
