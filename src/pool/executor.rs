//! Bounded task executor

use crate::aggregate::AggregateResult;
use crate::core::{
    BoxedTask, ClosureTask, ExecutorError, FailureSink, HandleTask, Result, Task, TaskHandle,
    TaskId,
};
use crate::pool::config::{ExecutorChoice, PoolConfig, SaturationPolicy};
use crate::pool::runner::{ContributingTask, TaskRunner};
use crate::pool::stats::{PoolCounters, PoolStats, ShutdownSummary};
use crate::pool::worker::{Worker, WorkerSet};
use crate::tracing::TracedTask;
use crossbeam::channel::{self, Receiver, SendTimeoutError, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// State shared between the executor handle and its workers
pub(crate) struct PoolShared {
    pub(crate) config: PoolConfig,
    pub(crate) receiver: Receiver<BoxedTask>,
    pub(crate) runner: TaskRunner,
    pub(crate) workers: Mutex<WorkerSet>,
    pub(crate) counters: PoolCounters,
    pub(crate) active: AtomicUsize,
    /// Held for reading by a worker from dequeue until it decides to run or drop
    pub(crate) intake: RwLock<()>,
    /// Set by a non-waiting shutdown; dequeued tasks are dropped instead of run
    pub(crate) discarding: AtomicBool,
    pub(crate) discarded: AtomicUsize,
    running: AtomicBool,
}

impl PoolShared {
    pub(crate) fn discard(&self, task: BoxedTask) {
        log::debug!("Discarding queued task {}", task.id());
        self.discarded.fetch_add(1, Ordering::AcqRel);
    }
}

/// Builder for [`TaskExecutor`]
#[derive(Debug)]
pub struct TaskExecutorBuilder {
    config: PoolConfig,
    runner: TaskRunner,
}

impl TaskExecutorBuilder {
    /// Report task failures to the given sink instead of the log
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn failure_sink(mut self, sink: Arc<dyn FailureSink>) -> Self {
        self.runner = TaskRunner::new(sink);
        self
    }

    /// Validate the configuration and create the executor
    ///
    /// No thread is started until the first submission (or
    /// [`TaskExecutor::prestart_core_threads`]).
    pub fn build(self) -> Result<TaskExecutor> {
        self.config.validate()?;

        let (sender, receiver) = if self.config.is_queue_bounded() {
            channel::bounded(self.config.queue_capacity)
        } else {
            channel::unbounded()
        };

        log::debug!(
            "Executor '{}' configured: core={}, max={}, queue={}",
            self.config.thread_name_prefix,
            self.config.core_pool_size,
            self.config.max_pool_size,
            self.config.queue_capacity
        );

        Ok(TaskExecutor {
            shared: Arc::new(PoolShared {
                config: self.config,
                receiver,
                runner: self.runner,
                workers: Mutex::new(WorkerSet::default()),
                counters: PoolCounters::new(),
                active: AtomicUsize::new(0),
                intake: RwLock::new(()),
                discarding: AtomicBool::new(false),
                discarded: AtomicUsize::new(0),
                running: AtomicBool::new(true),
            }),
            sender: RwLock::new(Some(sender)),
        })
    }
}

/// A bounded pool executing tasks off the caller's thread
///
/// # Growth
///
/// A submission first starts a new worker while fewer than
/// `core_pool_size` are live. After that tasks go to the backlog queue. When
/// the queue is full the pool grows toward `max_pool_size`, and once both are
/// exhausted the [`SaturationPolicy`] decides.
///
/// # Shutdown
///
/// Shutdown closes the queue. Workers drain what is left and exit; a waiting
/// shutdown joins them, a non-waiting one discards the backlog instead.
pub struct TaskExecutor {
    shared: Arc<PoolShared>,
    sender: RwLock<Option<Sender<BoxedTask>>>,
}

impl std::fmt::Debug for TaskExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskExecutor")
            .field("config", &self.shared.config)
            .field("running", &self.is_running())
            .field("stats", &self.stats())
            .finish()
    }
}

impl TaskExecutor {
    /// Start building an executor with the given configuration
    pub fn builder(config: PoolConfig) -> TaskExecutorBuilder {
        TaskExecutorBuilder {
            config,
            runner: TaskRunner::default(),
        }
    }

    /// Create an executor with the given configuration
    pub fn new(config: PoolConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Create an executor from a provided-or-default choice
    pub fn from_choice(choice: ExecutorChoice) -> Result<Self> {
        Self::new(choice.resolve())
    }

    /// The configuration this executor was built with
    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }

    /// Start all core workers ahead of the first submission
    ///
    /// Returns the number of workers started.
    pub fn prestart_core_threads(&self) -> Result<usize> {
        let mut set = self.shared.workers.lock();
        self.ensure_running()?;
        let mut started = 0;
        while set.live() < self.shared.config.core_pool_size {
            Worker::spawn(&self.shared, &mut set, None)?;
            started += 1;
        }
        Ok(started)
    }

    /// Submit a task without waiting for it
    ///
    /// # Errors
    ///
    /// - `ExecutorError::PoolSaturated` - pool and queue full under `Reject`
    /// - `ExecutorError::SubmissionTimeout` - no space within the timeout
    /// - `ExecutorError::NotRunning` - executor was shut down
    pub fn submit<T: Task + 'static>(&self, task: T) -> Result<()> {
        self.dispatch(Box::new(task))
    }

    /// Submit a task that runs inside the submitter's current tracing span
    pub fn submit_traced<T: Task + 'static>(&self, task: T) -> Result<()> {
        self.submit(TracedTask::new(task))
    }

    /// Submit a closure without waiting for it
    ///
    /// An error returned by the closure goes to the failure sink.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_task_executor::prelude::*;
    ///
    /// # fn main() -> Result<()> {
    /// let executor = TaskExecutor::new(PoolConfig::new(2, 4))?;
    /// for i in 0..10u64 {
    ///     executor.execute(i, move || {
    ///         println!("Hello async {}", i);
    ///         Ok(())
    ///     })?;
    /// }
    /// executor.shutdown(true)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn execute<F>(&self, id: impl Into<TaskId>, f: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.submit(ClosureTask::with_id(id, f))
    }

    /// Submit a closure whose value is recorded into `aggregate` on success
    ///
    /// A failing closure is reported to the failure sink and leaves the
    /// aggregate untouched.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_task_executor::prelude::*;
    /// use std::time::Duration;
    ///
    /// # fn main() -> Result<()> {
    /// let executor = TaskExecutor::new(PoolConfig::new(2, 4))?;
    /// let words: AggregateResult = AggregateResult::new(3);
    /// for i in 0..3u64 {
    ///     executor.submit_to(&words, i, move || Ok(format!("word-{}", i)))?;
    /// }
    ///
    /// assert!(executor.await_all(&words, Duration::from_secs(5)));
    /// assert_eq!(words.snapshot().len(), 3);
    /// # executor.shutdown(true)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn submit_to<T, F>(
        &self,
        aggregate: &AggregateResult<T>,
        id: impl Into<TaskId>,
        f: F,
    ) -> Result<()>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        self.submit(ContributingTask::new(id.into(), aggregate.clone(), f))
    }

    /// Submit a closure and get a handle to its result
    ///
    /// Errors returned by the closure are delivered through the handle, not
    /// to the failure sink.
    pub fn submit_with_handle<T, F>(&self, id: impl Into<TaskId>, f: F) -> Result<TaskHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (task, handle) = HandleTask::new(id.into(), f);
        self.submit(task)?;
        Ok(handle)
    }

    /// Wait for every task of `aggregate` or until `timeout` elapses
    ///
    /// Returns `true` when all expected results arrived. Tasks still running
    /// after a timeout are not stopped.
    pub fn await_all<T>(&self, aggregate: &AggregateResult<T>, timeout: Duration) -> bool {
        let completed = aggregate.await_timeout(timeout);
        if !completed {
            log::debug!(
                "Timed out after {:?} waiting on aggregate {} ({} of {} outstanding)",
                timeout,
                aggregate.id(),
                aggregate.remaining(),
                aggregate.expected()
            );
        }
        completed
    }

    fn ensure_running(&self) -> Result<()> {
        if self.shared.running.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(ExecutorError::not_running(
                &self.shared.config.thread_name_prefix,
            ))
        }
    }

    fn dispatch(&self, task: BoxedTask) -> Result<()> {
        let sender = self
            .sender
            .read()
            .clone()
            .ok_or_else(|| ExecutorError::not_running(&self.shared.config.thread_name_prefix))?;

        let mut set = self.shared.workers.lock();
        self.ensure_running()?;

        if set.live() < self.shared.config.core_pool_size {
            Worker::spawn(&self.shared, &mut set, Some(task))?;
            self.accepted();
            return Ok(());
        }

        let task = match sender.try_send(task) {
            Ok(()) => {
                self.accepted();
                return Ok(());
            }
            Err(TrySendError::Full(task)) => task,
            Err(TrySendError::Disconnected(_)) => {
                return Err(ExecutorError::not_running(
                    &self.shared.config.thread_name_prefix,
                ))
            }
        };

        if set.live() < self.shared.config.max_pool_size {
            Worker::spawn(&self.shared, &mut set, Some(task))?;
            self.accepted();
            return Ok(());
        }
        drop(set);

        self.saturated(sender, task)
    }

    fn saturated(&self, sender: Sender<BoxedTask>, task: BoxedTask) -> Result<()> {
        let config = &self.shared.config;
        match config.saturation_policy {
            SaturationPolicy::Reject => {
                self.shared.counters.increment_rejected();
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_rejection(sender.len());
                log::warn!(
                    "Executor '{}' saturated, rejecting task {}",
                    config.thread_name_prefix,
                    task.id()
                );
                Err(ExecutorError::pool_saturated(
                    &config.thread_name_prefix,
                    self.active_count(),
                    config.max_pool_size,
                    sender.len(),
                    config.queue_capacity,
                ))
            }
            SaturationPolicy::Block => {
                sender
                    .send(task)
                    .map_err(|_| ExecutorError::not_running(&config.thread_name_prefix))?;
                self.accepted();
                Ok(())
            }
            SaturationPolicy::BlockWithTimeout(timeout) => match sender.send_timeout(task, timeout)
            {
                Ok(()) => {
                    self.accepted();
                    Ok(())
                }
                Err(SendTimeoutError::Timeout(_)) => {
                    self.shared.counters.increment_rejected();
                    Err(ExecutorError::submission_timeout(
                        u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    ))
                }
                Err(SendTimeoutError::Disconnected(_)) => {
                    Err(ExecutorError::not_running(&config.thread_name_prefix))
                }
            },
            SaturationPolicy::CallerRuns => {
                drop(sender);
                self.accepted();
                log::debug!(
                    "Executor '{}' saturated, running task {} on the caller",
                    config.thread_name_prefix,
                    task.id()
                );
                let outcome = self.shared.runner.run(task);
                self.shared.counters.record(outcome);
                Ok(())
            }
        }
    }

    fn accepted(&self) {
        self.shared.counters.increment_submitted();
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_submission(self.queue_len());
    }

    /// Check if the executor accepts submissions
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Number of live worker threads
    pub fn pool_size(&self) -> usize {
        self.shared.workers.lock().live()
    }

    /// Number of workers currently running a task
    pub fn active_count(&self) -> usize {
        self.shared.active.load(Ordering::Acquire)
    }

    /// Tasks waiting in the backlog queue (approximate)
    pub fn queue_len(&self) -> usize {
        self.shared.receiver.len()
    }

    /// Snapshot of the executor's counters
    pub fn stats(&self) -> PoolStats {
        let (pool_size, largest_pool_size) = {
            let set = self.shared.workers.lock();
            (set.live(), set.largest())
        };
        let counters = &self.shared.counters;
        PoolStats {
            pool_size,
            active: self.active_count(),
            largest_pool_size,
            queued: self.queue_len(),
            submitted: counters.get_submitted(),
            completed: counters.get_completed(),
            failed: counters.get_failed(),
            panicked: counters.get_panicked(),
            rejected: counters.get_rejected(),
        }
    }

    /// Stop accepting tasks and shut the workers down
    ///
    /// With `wait_for_completion`, blocks until every queued and running task
    /// has finished; there is no deadline. Without it, every task still queued
    /// is discarded, including one a worker dequeued but had not started, and
    /// running tasks are left to finish in the background.
    ///
    /// Calling shutdown again is a no-op.
    pub fn shutdown(&self, wait_for_completion: bool) -> Result<ShutdownSummary> {
        {
            let _set = self.shared.workers.lock();
            if !self.shared.running.swap(false, Ordering::AcqRel) {
                return Ok(ShutdownSummary {
                    waited: false,
                    discarded: 0,
                    stats: self.stats(),
                });
            }
        }

        if !wait_for_completion {
            self.shared.discarding.store(true, Ordering::Release);
        }
        // closing the queue lets workers exit once it is drained
        drop(self.sender.write().take());

        if wait_for_completion {
            let threads = self.shared.workers.lock().take_threads();
            for handle in threads {
                let name = handle.thread().name().unwrap_or("<unnamed>").to_string();
                handle
                    .join()
                    .map_err(|_| ExecutorError::join(name, "Worker panicked"))?;
            }
        } else {
            for task in self.shared.receiver.try_iter() {
                self.shared.discard(task);
            }
            // wait out workers holding a task they dequeued before the drain
            drop(self.shared.intake.write());
        }
        let discarded = self.shared.discarded.load(Ordering::Acquire);

        let stats = self.stats();
        log::info!(
            "Executor '{}' shut down: {} completed, {} failed, {} discarded",
            self.shared.config.thread_name_prefix,
            stats.completed,
            stats.failed + stats.panicked,
            discarded
        );
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_shutdown(stats.completed, stats.failed);

        Ok(ShutdownSummary {
            waited: wait_for_completion,
            discarded,
            stats,
        })
    }

    /// Shut down using the configured `wait_for_tasks_on_shutdown` flag
    pub fn close(&self) -> Result<ShutdownSummary> {
        self.shutdown(self.shared.config.wait_for_tasks_on_shutdown)
    }
}

impl Drop for TaskExecutor {
    fn drop(&mut self) {
        if self.is_running() {
            if let Err(e) = self.close() {
                log::error!(
                    "Failed to shut down executor '{}' during drop: {}",
                    self.shared.config.thread_name_prefix,
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FailureKind, RecordingFailureSink};
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::thread;

    fn small_config() -> PoolConfig {
        PoolConfig::new(2, 4).with_thread_name_prefix("test-")
    }

    #[test]
    fn test_executor_creation() {
        let executor = TaskExecutor::new(small_config()).expect("Failed to create executor");
        assert!(executor.is_running());
        assert_eq!(executor.pool_size(), 0);

        executor.shutdown(true).expect("Failed to shutdown executor");
        assert!(!executor.is_running());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = TaskExecutor::new(PoolConfig::new(4, 2));
        assert!(matches!(result, Err(ExecutorError::InvalidConfig { .. })));
    }

    #[test]
    fn test_task_execution() {
        let executor = TaskExecutor::new(small_config()).expect("Failed to create executor");
        let counter = Arc::new(AtomicUsize::new(0));

        for i in 0..10u64 {
            let counter_clone = Arc::clone(&counter);
            executor
                .execute(i, move || {
                    counter_clone.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                })
                .expect("Failed to submit task");
        }

        executor.shutdown(true).expect("Failed to shutdown executor");

        assert_eq!(counter.load(Ordering::Relaxed), 10);
        let stats = executor.stats();
        assert_eq!(stats.submitted, 10);
        assert_eq!(stats.completed, 10);
    }

    #[test]
    fn test_workers_are_named_with_prefix() {
        let executor = TaskExecutor::new(
            PoolConfig::new(1, 1).with_thread_name_prefix("AnExecutor-"),
        )
        .unwrap();

        let handle = executor
            .submit_with_handle("name", || {
                Ok(thread::current().name().map(str::to_string))
            })
            .unwrap();

        assert_eq!(handle.join().unwrap().as_deref(), Some("AnExecutor-1"));
    }

    #[test]
    fn test_core_threads_start_before_queueing() {
        let executor = TaskExecutor::new(small_config().with_queue_capacity(10)).unwrap();
        let (release_tx, release_rx) = crossbeam::channel::unbounded::<()>();

        for i in 0..5u64 {
            let release_rx = release_rx.clone();
            executor
                .execute(i, move || {
                    let _ = release_rx.recv();
                    Ok(())
                })
                .unwrap();
        }

        // two core workers, the rest queued; no growth while the queue has room
        assert_eq!(executor.pool_size(), 2);
        assert_eq!(executor.queue_len(), 3);

        drop(release_tx);
        executor.shutdown(true).unwrap();
    }

    #[test]
    fn test_pool_grows_when_queue_full() {
        let executor = TaskExecutor::new(small_config().with_queue_capacity(1)).unwrap();
        let (release_tx, release_rx) = crossbeam::channel::unbounded::<()>();

        // 2 core + 1 queued + 2 extra workers
        for i in 0..5u64 {
            let release_rx = release_rx.clone();
            executor
                .execute(i, move || {
                    let _ = release_rx.recv();
                    Ok(())
                })
                .unwrap();
        }

        assert_eq!(executor.pool_size(), 4);
        assert_eq!(executor.stats().largest_pool_size, 4);

        drop(release_tx);
        executor.shutdown(true).unwrap();
        assert_eq!(executor.stats().completed, 5);
    }

    #[test]
    fn test_saturation_rejects() {
        let executor = TaskExecutor::new(small_config().with_queue_capacity(2)).unwrap();
        let (release_tx, release_rx) = crossbeam::channel::unbounded::<()>();

        // capacity: 4 workers + 2 queued
        for i in 0..6u64 {
            let release_rx = release_rx.clone();
            executor
                .execute(i, move || {
                    let _ = release_rx.recv();
                    Ok(())
                })
                .unwrap();
        }

        let result = executor.execute(6u64, || Ok(()));
        assert!(
            matches!(result, Err(ExecutorError::PoolSaturated { max_pool_size: 4, queue_capacity: 2, .. })),
            "Expected PoolSaturated error, got: {:?}",
            result
        );
        assert_eq!(executor.stats().rejected, 1);

        drop(release_tx);
        executor.shutdown(true).unwrap();
        assert_eq!(executor.stats().completed, 6);
    }

    #[test]
    fn test_saturation_blocks_with_timeout() {
        let config = PoolConfig::new(1, 1)
            .with_queue_capacity(1)
            .with_saturation_policy(SaturationPolicy::BlockWithTimeout(Duration::from_millis(50)));
        let executor = TaskExecutor::new(config).unwrap();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        executor
            .execute(0u64, move || {
                started_tx.send(()).unwrap();
                let _ = release_rx.recv();
                Ok(())
            })
            .unwrap();
        started_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("First task should start within 5 seconds");

        executor.execute(1u64, || Ok(())).unwrap();

        let start = std::time::Instant::now();
        let result = executor.execute(2u64, || Ok(()));
        let elapsed = start.elapsed();

        assert!(
            matches!(result, Err(ExecutorError::SubmissionTimeout { .. })),
            "Expected SubmissionTimeout error, got: {:?}",
            result
        );
        assert!(elapsed >= Duration::from_millis(40));

        let _ = release_tx.send(());
        executor.shutdown(true).unwrap();
    }

    #[test]
    fn test_saturation_blocks_until_space() {
        let config = PoolConfig::new(1, 1).with_queue_capacity(1).block_when_saturated();
        let executor = TaskExecutor::new(config).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for i in 0..5u64 {
            let counter = Arc::clone(&counter);
            executor
                .execute(i, move || {
                    thread::sleep(Duration::from_millis(20));
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .expect("blocking submit never rejects");
        }

        executor.shutdown(true).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 5);
        assert_eq!(executor.stats().rejected, 0);
    }

    #[test]
    fn test_caller_runs_when_saturated() {
        let config = PoolConfig::new(1, 1)
            .with_queue_capacity(1)
            .caller_runs_when_saturated();
        let executor = TaskExecutor::new(config).unwrap();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let (started_tx, started_rx) = mpsc::channel();

        executor
            .execute(0u64, move || {
                started_tx.send(()).unwrap();
                let _ = release_rx.recv();
                Ok(())
            })
            .unwrap();
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        executor.execute(1u64, || Ok(())).unwrap();

        let caller = thread::current().id();
        let ran_on = Arc::new(Mutex::new(None));
        let ran_on_clone = Arc::clone(&ran_on);
        executor
            .execute(2u64, move || {
                *ran_on_clone.lock() = Some(thread::current().id());
                Ok(())
            })
            .unwrap();

        assert_eq!(*ran_on.lock(), Some(caller));

        let _ = release_tx.send(());
        executor.shutdown(true).unwrap();
    }

    #[test]
    fn test_failures_go_to_sink() {
        let sink = Arc::new(RecordingFailureSink::new());
        let executor = TaskExecutor::builder(small_config())
            .failure_sink(sink.clone())
            .build()
            .unwrap();

        for i in 0..10u64 {
            executor
                .execute(i, move || {
                    if i % 2 == 0 {
                        Err(ExecutorError::task_failed(i, "Not happy!"))
                    } else {
                        Ok(())
                    }
                })
                .unwrap();
        }
        executor.execute("panics", || panic!("worker must survive")).unwrap();
        executor.shutdown(true).unwrap();

        let stats = executor.stats();
        assert_eq!(stats.completed, 5);
        assert_eq!(stats.failed, 5);
        assert_eq!(stats.panicked, 1);
        assert_eq!(sink.len(), 6);
        assert_eq!(sink.count_for(&TaskId::from(4u64)), 1);
        assert_eq!(sink.count_for(&TaskId::from(5u64)), 0);
        assert_eq!(sink.count_for(&TaskId::from("panics")), 1);
        assert!(sink
            .records()
            .iter()
            .any(|r| r.kind == FailureKind::Panic));
    }

    #[test]
    fn test_handle_delivers_error_not_to_sink() {
        let sink = Arc::new(RecordingFailureSink::new());
        let executor = TaskExecutor::builder(small_config())
            .failure_sink(sink.clone())
            .build()
            .unwrap();

        let ok = executor.submit_with_handle(1u64, || Ok(21 * 2)).unwrap();
        let failed = executor
            .submit_with_handle(2u64, || -> Result<u32> {
                Err(ExecutorError::task_failed(2, "bad input"))
            })
            .unwrap();

        assert_eq!(ok.join().unwrap(), 42);
        assert!(matches!(failed.join(), Err(ExecutorError::TaskFailed { .. })));
        executor.shutdown(true).unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_submit_after_shutdown() {
        let executor = TaskExecutor::new(small_config()).unwrap();
        executor.execute(1u64, || Ok(())).unwrap();
        executor.shutdown(true).unwrap();

        let result = executor.execute(2u64, || Ok(()));
        assert!(matches!(result, Err(ExecutorError::NotRunning { .. })));

        // second shutdown is a no-op
        let summary = executor.shutdown(true).unwrap();
        assert!(!summary.waited);
    }

    #[test]
    fn test_shutdown_without_waiting_discards_backlog() {
        let executor = TaskExecutor::new(PoolConfig::new(1, 1).with_queue_capacity(10)).unwrap();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let ran = Arc::new(AtomicUsize::new(0));

        executor
            .execute(0u64, move || {
                started_tx.send(()).unwrap();
                let _ = release_rx.recv();
                Ok(())
            })
            .unwrap();
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        for i in 1..=3u64 {
            let ran = Arc::clone(&ran);
            executor
                .execute(i, move || {
                    ran.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .unwrap();
        }

        let summary = executor.shutdown(false).unwrap();
        assert!(!summary.waited);
        assert_eq!(summary.discarded, 3);

        let _ = release_tx.send(());
        thread::sleep(Duration::from_millis(50));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_shutdown_without_waiting_accounts_for_every_task() {
        let executor = TaskExecutor::new(PoolConfig::new(4, 4).with_queue_capacity(0)).unwrap();
        let started = Arc::new(AtomicUsize::new(0));

        for i in 0..200u64 {
            let started = Arc::clone(&started);
            executor
                .execute(i, move || {
                    started.fetch_add(1, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(1));
                    Ok(())
                })
                .unwrap();
        }

        let summary = executor.shutdown(false).unwrap();
        thread::sleep(Duration::from_millis(100));
        assert_eq!(started.load(Ordering::SeqCst) + summary.discarded, 200);
    }

    #[test]
    fn test_shutdown_waits_for_running_tasks() {
        let executor = TaskExecutor::new(small_config()).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for i in 0..6u64 {
            let counter = Arc::clone(&counter);
            executor
                .execute(i, move || {
                    thread::sleep(Duration::from_millis(30));
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .unwrap();
        }

        let summary = executor.shutdown(true).unwrap();
        assert!(summary.waited);
        assert_eq!(counter.load(Ordering::SeqCst), 6);
        assert_eq!(summary.stats.pool_size, 0);
    }

    #[test]
    fn test_extra_workers_retire_after_keep_alive() {
        let config = small_config()
            .with_queue_capacity(1)
            .with_keep_alive(Duration::from_millis(50));
        let executor = TaskExecutor::new(config).unwrap();
        let (release_tx, release_rx) = crossbeam::channel::unbounded::<()>();

        for i in 0..5u64 {
            let release_rx = release_rx.clone();
            executor
                .execute(i, move || {
                    let _ = release_rx.recv();
                    Ok(())
                })
                .unwrap();
        }
        assert_eq!(executor.pool_size(), 4);

        drop(release_tx);
        thread::sleep(Duration::from_millis(400));
        assert_eq!(executor.pool_size(), 2);

        executor.shutdown(true).unwrap();
    }

    #[test]
    fn test_prestart_core_threads() {
        let executor = TaskExecutor::new(small_config()).unwrap();
        assert_eq!(executor.prestart_core_threads().unwrap(), 2);
        assert_eq!(executor.pool_size(), 2);
        assert_eq!(executor.prestart_core_threads().unwrap(), 0);
        executor.shutdown(true).unwrap();
    }

    #[test]
    fn test_from_choice_platform_default() {
        let executor = TaskExecutor::from_choice(ExecutorChoice::PlatformDefault).unwrap();
        assert_eq!(executor.config().thread_name_prefix, "task-");
        executor.execute(1u64, || Ok(())).unwrap();
        executor.shutdown(true).unwrap();
        assert_eq!(executor.stats().completed, 1);
    }
}
