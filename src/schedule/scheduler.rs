//! Fixed-rate scheduler backed by one timer thread

use crate::core::{ExecutorError, FailureSink, Result, Task, TaskId};
use crate::pool::TaskRunner;
use crate::schedule::heartbeat::{HeartbeatHandle, HeartbeatSink, HeartbeatState};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use tracing::{span, Level};

/// Handle to a scheduled task
///
/// Dropping the handle does not cancel the task.
#[derive(Debug, Clone)]
pub struct ScheduleHandle {
    task_id: TaskId,
    cancelled: Arc<AtomicBool>,
}

impl ScheduleHandle {
    /// Identity of the scheduled task
    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Stop future firings; a firing already in progress completes
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            log::debug!("Cancelled scheduled task {}", self.task_id);
        }
    }

    /// Check whether the task was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// A repeatable task body
struct PeriodicTask<F>
where
    F: FnMut() -> Result<()> + Send,
{
    id: TaskId,
    body: F,
}

impl<F> Task for PeriodicTask<F>
where
    F: FnMut() -> Result<()> + Send,
{
    fn id(&self) -> &TaskId {
        &self.id
    }

    fn run(&mut self) -> Result<()> {
        (self.body)()
    }
}

/// One entry in the timer's queue
struct Scheduled {
    next_fire: Instant,
    period: Duration,
    sequence: u64,
    task: Box<dyn Task>,
    cancelled: Arc<AtomicBool>,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.next_fire == other.next_fire && self.sequence == other.sequence
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // earliest fire time first; ties keep registration order
        other
            .next_fire
            .cmp(&self.next_fire)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

enum Command {
    Schedule(Scheduled),
    Shutdown,
}

/// Runs registered tasks at a fixed rate on a dedicated timer thread
///
/// Each task's next firing is computed from its previous *scheduled* time,
/// not from when it finished, so the rate does not drift. A firing that
/// overruns its period is followed immediately by the missed ones; nothing is
/// skipped. Tasks share the timer thread and never run concurrently with each
/// other.
///
/// Errors and panics of scheduled tasks are reported to the failure sink and
/// the task stays scheduled.
///
/// # Example
///
/// ```
/// use rust_task_executor::prelude::*;
/// use std::time::Duration;
///
/// # fn main() -> Result<()> {
/// let scheduler = Scheduler::new("demo")?;
/// let heartbeat = scheduler.schedule_heartbeat(Duration::from_millis(20), LogHeartbeatSink)?;
///
/// std::thread::sleep(Duration::from_millis(110));
/// assert!(heartbeat.count() >= 3);
///
/// scheduler.shutdown()?;
/// # Ok(())
/// # }
/// ```
pub struct Scheduler {
    name: String,
    commands: Sender<Command>,
    timer: Mutex<Option<JoinHandle<()>>>,
    running: AtomicBool,
    sequence: std::sync::atomic::AtomicU64,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish()
    }
}

impl Scheduler {
    /// Start a scheduler whose failures go to the log
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Self::with_runner(name, TaskRunner::default())
    }

    /// Start a scheduler reporting task failures to `sink`
    pub fn with_failure_sink(name: impl Into<String>, sink: Arc<dyn FailureSink>) -> Result<Self> {
        Self::with_runner(name, TaskRunner::new(sink))
    }

    fn with_runner(name: impl Into<String>, runner: TaskRunner) -> Result<Self> {
        let name = name.into();
        let thread_name = format!("{}-timer", name);
        let (commands, receiver) = channel::unbounded();

        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || Self::timer_loop(receiver, runner))
            .map_err(|e| ExecutorError::spawn(&thread_name, e.to_string()))?;

        log::debug!("Scheduler '{}' started", name);

        Ok(Self {
            name,
            commands,
            timer: Mutex::new(Some(handle)),
            running: AtomicBool::new(true),
            sequence: std::sync::atomic::AtomicU64::new(0),
        })
    }

    /// Name of this scheduler
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if the scheduler accepts new tasks
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run `task` every `period`, starting one period from now
    ///
    /// # Errors
    ///
    /// - `ExecutorError::InvalidConfig` - `period` is zero, or a firing time
    ///   cannot be represented
    /// - `ExecutorError::NotRunning` - scheduler was shut down
    pub fn schedule_at_fixed_rate<F>(
        &self,
        id: impl Into<TaskId>,
        period: Duration,
        task: F,
    ) -> Result<ScheduleHandle>
    where
        F: FnMut() -> Result<()> + Send + 'static,
    {
        self.schedule_at_fixed_rate_with_delay(id, period, period, task)
    }

    /// Run `task` every `period`, starting after `initial_delay`
    pub fn schedule_at_fixed_rate_with_delay<F>(
        &self,
        id: impl Into<TaskId>,
        initial_delay: Duration,
        period: Duration,
        task: F,
    ) -> Result<ScheduleHandle>
    where
        F: FnMut() -> Result<()> + Send + 'static,
    {
        if period.is_zero() {
            return Err(ExecutorError::invalid_config(
                "period",
                "Schedule period must be non-zero",
            ));
        }
        let now = Instant::now();
        if now.checked_add(period).is_none() {
            return Err(ExecutorError::invalid_config(
                "period",
                format!("Schedule period {:?} is too large", period),
            ));
        }
        let next_fire = now.checked_add(initial_delay).ok_or_else(|| {
            ExecutorError::invalid_config(
                "initial_delay",
                format!("Initial delay {:?} is too large", initial_delay),
            )
        })?;
        if !self.is_running() {
            return Err(ExecutorError::not_running(&self.name));
        }

        let task_id = id.into();
        let cancelled = Arc::new(AtomicBool::new(false));
        let scheduled = Scheduled {
            next_fire,
            period,
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
            task: Box::new(PeriodicTask {
                id: task_id.clone(),
                body: task,
            }),
            cancelled: Arc::clone(&cancelled),
        };

        self.commands
            .send(Command::Schedule(scheduled))
            .map_err(|_| ExecutorError::not_running(&self.name))?;

        log::debug!(
            "Scheduled task {} on '{}' every {:?} after {:?}",
            task_id,
            self.name,
            period,
            initial_delay
        );

        Ok(ScheduleHandle {
            task_id,
            cancelled,
        })
    }

    /// Register a heartbeat that counts its own ticks and reports each to `sink`
    pub fn schedule_heartbeat<S>(&self, period: Duration, sink: S) -> Result<HeartbeatHandle>
    where
        S: HeartbeatSink + 'static,
    {
        let state = Arc::new(HeartbeatState::new());
        let ticking = Arc::clone(&state);
        let schedule = self.schedule_at_fixed_rate("heartbeat", period, move || {
            sink.beat(ticking.tick());
            Ok(())
        })?;
        Ok(HeartbeatHandle::new(state, schedule))
    }

    /// Stop the timer thread and wait for it to exit
    ///
    /// A firing in progress completes first. Calling shutdown again is a
    /// no-op.
    pub fn shutdown(&self) -> Result<()> {
        if !self.running.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        // the timer thread may already be gone if it panicked
        let _ = self.commands.send(Command::Shutdown);

        if let Some(handle) = self.timer.lock().take() {
            if handle.thread().id() == thread::current().id() {
                // shut down from one of our own tasks; the loop exits on its own
                return Ok(());
            }
            handle
                .join()
                .map_err(|_| ExecutorError::join(format!("{}-timer", self.name), "Timer panicked"))?;
        }

        log::debug!("Scheduler '{}' shut down", self.name);
        Ok(())
    }

    fn timer_loop(commands: Receiver<Command>, runner: TaskRunner) {
        #[cfg(feature = "tracing")]
        let timer_span = span!(Level::DEBUG, "scheduler_timer");
        #[cfg(feature = "tracing")]
        let _guard = timer_span.enter();

        let mut queue: BinaryHeap<Scheduled> = BinaryHeap::new();

        loop {
            let command = match queue.peek() {
                Some(next) => commands.recv_deadline(next.next_fire),
                None => commands.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match command {
                Ok(Command::Schedule(scheduled)) => queue.push(scheduled),
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    // one firing per pass so commands are not starved during catch-up
                    if let Some(mut due) = queue.pop() {
                        if due.cancelled.load(Ordering::Acquire) {
                            continue;
                        }
                        if due.next_fire > Instant::now() {
                            queue.push(due);
                            continue;
                        }

                        #[cfg(feature = "tracing")]
                        crate::tracing::metrics::record_tick(
                            &due.task.id().to_string(),
                            Instant::now().saturating_duration_since(due.next_fire),
                        );

                        runner.run_task(due.task.as_mut());

                        if due.cancelled.load(Ordering::Acquire) {
                            continue;
                        }
                        match due.next_fire.checked_add(due.period) {
                            Some(next_fire) => {
                                due.next_fire = next_fire;
                                queue.push(due);
                            }
                            None => log::warn!(
                                "Task {} has no representable next firing, unscheduling",
                                due.task.id()
                            ),
                        }
                    }
                }
            }
        }

        log::trace!("Timer loop exited with {} tasks pending", queue.len());
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!("Failed to shut down scheduler '{}' during drop: {}", self.name, e);
        }
    }
}
