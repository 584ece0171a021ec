//! Tracing integration for observability.
//!
//! With the `tracing` feature enabled, workers and task executions run inside
//! spans and the executor emits counter/gauge events that a subscriber can
//! turn into metrics. Without the feature, [`TracedTask`] is a transparent
//! wrapper and no events are emitted.
//!
//! # Example
//!
//! ```rust,ignore
//! use rust_task_executor::prelude::*;
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env()
//!         .add_directive("rust_task_executor=debug".parse().unwrap()))
//!     .init();
//!
//! let executor = TaskExecutor::new(PoolConfig::default())?;
//!
//! let _request = tracing::info_span!("request", id = 7).entered();
//! executor.submit_traced(ClosureTask::with_id(7u64, || Ok(())))?;
//! ```

use crate::core::{Result, Task, TaskId};
#[cfg(feature = "tracing")]
use std::time::Duration;

/// A task wrapper that links a task's execution to the submitter's span.
///
/// The wrapper opens a `task` span, child of the span current at creation,
/// carrying the task's `task_id`. The worker enters it for the run and records
/// `outcome` as `ok` or `failed` once the task returns.
pub struct TracedTask<T: Task> {
    inner: T,
    #[cfg(feature = "tracing")]
    span: tracing::Span,
}

impl<T: Task> TracedTask<T> {
    /// Wraps `task` under the current span.
    pub fn new(task: T) -> Self {
        #[cfg(feature = "tracing")]
        let span = task_span(&task, &tracing::Span::current());
        Self {
            inner: task,
            #[cfg(feature = "tracing")]
            span,
        }
    }

    /// Wraps `task` under `parent` instead of the current span.
    #[cfg(feature = "tracing")]
    pub fn with_parent(task: T, parent: &tracing::Span) -> Self {
        let span = task_span(&task, parent);
        Self { inner: task, span }
    }

    /// The span the task runs in.
    #[cfg(feature = "tracing")]
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    /// Unwraps the inner task.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(feature = "tracing")]
fn task_span<T: Task>(task: &T, parent: &tracing::Span) -> tracing::Span {
    tracing::info_span!(
        parent: parent,
        "task",
        task_id = %task.id(),
        outcome = tracing::field::Empty
    )
}

impl<T: Task> Task for TracedTask<T> {
    fn id(&self) -> &TaskId {
        self.inner.id()
    }

    #[cfg(not(feature = "tracing"))]
    fn run(&mut self) -> Result<()> {
        self.inner.run()
    }

    #[cfg(feature = "tracing")]
    fn run(&mut self) -> Result<()> {
        let _guard = self.span.enter();
        let result = self.inner.run();
        self.span
            .record("outcome", if result.is_ok() { "ok" } else { "failed" });
        result
    }
}

/// Metrics recording functions for observability.
///
/// Field names follow the `counter.*` / `gauge.*` / `histogram.*` convention
/// understood by tracing-based metrics layers.
#[cfg(feature = "tracing")]
pub mod metrics {
    use super::*;

    /// Records an accepted submission.
    #[inline]
    pub fn record_submission(queue_depth: usize) {
        tracing::trace!(
            counter.tasks_submitted = 1,
            gauge.queue_depth = queue_depth as i64,
            "task submitted"
        );
    }

    /// Records a submission refused by a saturated pool.
    #[inline]
    pub fn record_rejection(queue_depth: usize) {
        tracing::debug!(
            counter.tasks_rejected = 1,
            gauge.queue_depth = queue_depth as i64,
            "task rejected"
        );
    }

    /// Records task completion with timing.
    #[inline]
    pub fn record_completion(duration: Duration, success: bool) {
        let duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        if success {
            tracing::trace!(
                counter.tasks_completed = 1,
                histogram.task_duration_ms = duration_ms,
                "task completed successfully"
            );
        } else {
            tracing::trace!(
                counter.tasks_failed = 1,
                histogram.task_duration_ms = duration_ms,
                "task failed"
            );
        }
    }

    /// Records a task panic.
    #[inline]
    pub fn record_panic(duration: Duration) {
        tracing::trace!(
            counter.tasks_panicked = 1,
            histogram.task_duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            "task panicked"
        );
    }

    /// Records worker becoming busy.
    #[inline]
    pub fn record_worker_busy(worker: usize) {
        tracing::trace!(gauge.workers_busy = 1, worker = worker, "worker busy");
    }

    /// Records worker becoming idle.
    #[inline]
    pub fn record_worker_idle(worker: usize) {
        tracing::trace!(gauge.workers_busy = -1i64, worker = worker, "worker idle");
    }

    /// Records a new worker thread.
    #[inline]
    pub fn record_worker_spawned(pool_size: usize) {
        tracing::debug!(gauge.pool_size = pool_size as i64, "worker spawned");
    }

    /// Records a worker retiring after its keep-alive.
    #[inline]
    pub fn record_worker_retired(pool_size: usize) {
        tracing::debug!(gauge.pool_size = pool_size as i64, "worker retired");
    }

    /// Records one firing of a scheduled task.
    #[inline]
    pub fn record_tick(schedule: &str, lag: Duration) {
        tracing::trace!(
            counter.schedule_ticks = 1,
            histogram.tick_lag_ms = u64::try_from(lag.as_millis()).unwrap_or(u64::MAX),
            schedule = schedule,
            "schedule tick"
        );
    }

    /// Records executor shutdown.
    #[inline]
    pub fn record_pool_shutdown(tasks_completed: u64, tasks_failed: u64) {
        tracing::info!(
            tasks_completed = tasks_completed,
            tasks_failed = tasks_failed,
            "executor shutdown complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ClosureTask;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_traced_task_runs_inner() {
        let executed = Arc::new(AtomicBool::new(false));
        let executed_clone = executed.clone();

        let task = ClosureTask::new(move || {
            executed_clone.store(true, Ordering::SeqCst);
            Ok(())
        });

        let mut traced = TracedTask::new(task);
        traced.run().expect("Task should run");

        assert!(executed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_traced_task_preserves_id() {
        let traced = TracedTask::new(ClosureTask::with_id("report", || Ok(())));
        assert_eq!(traced.id(), &TaskId::from("report"));
    }

    #[test]
    fn test_traced_task_passes_errors_through() {
        let mut traced = TracedTask::new(ClosureTask::with_id(4u64, || {
            Err(crate::core::ExecutorError::task_failed(4u64, "boom"))
        }));
        assert!(traced.run().is_err());
        assert_eq!(traced.into_inner().id(), &TaskId::Seq(4));
    }

    #[cfg(feature = "tracing")]
    #[derive(Clone, Default)]
    struct Capture(Arc<parking_lot::Mutex<Vec<u8>>>);

    #[cfg(feature = "tracing")]
    impl std::io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn test_task_span_carries_id_and_parent() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let request = tracing::info_span!("request", id = 7);
            let mut traced = request.in_scope(|| {
                TracedTask::new(ClosureTask::with_id("report", || {
                    tracing::info!("inside");
                    Ok(())
                }))
            });
            assert!(traced.span().metadata().is_some());
            traced.run().unwrap();
        });

        let output = String::from_utf8(capture.0.lock().clone()).unwrap();
        assert!(
            output.contains("request{id=7}:task{task_id=report}"),
            "{}",
            output
        );
    }
}
