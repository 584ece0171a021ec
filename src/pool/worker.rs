//! Worker thread implementation

use crate::core::{BoxedTask, ExecutorError, Result};
use crate::pool::executor::PoolShared;
use crossbeam::channel::RecvTimeoutError;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

#[cfg(feature = "tracing")]
use tracing::{debug, span, Level};

/// Bookkeeping for the live worker threads of one executor
///
/// Guarded by the executor's growth lock; every spawn and retirement goes
/// through it so the live count is exact.
#[derive(Debug, Default)]
pub(crate) struct WorkerSet {
    threads: HashMap<usize, JoinHandle<()>>,
    live: usize,
    largest: usize,
    next_number: usize,
}

impl WorkerSet {
    pub(crate) fn live(&self) -> usize {
        self.live
    }

    pub(crate) fn largest(&self) -> usize {
        self.largest
    }

    /// Take every join handle still owned by the set
    pub(crate) fn take_threads(&mut self) -> Vec<JoinHandle<()>> {
        self.threads.drain().map(|(_, handle)| handle).collect()
    }

    fn exited(&mut self, number: usize) {
        self.live = self.live.saturating_sub(1);
        // dropping our own handle detaches the finishing thread
        self.threads.remove(&number);
    }
}

/// Spawns and runs pool workers
pub(crate) struct Worker;

impl Worker {
    /// Start a worker, optionally handing it its first task
    ///
    /// Must be called with the executor's growth lock held; `set` is the
    /// guarded state.
    pub(crate) fn spawn(
        shared: &Arc<PoolShared>,
        set: &mut WorkerSet,
        first_task: Option<BoxedTask>,
    ) -> Result<()> {
        set.next_number += 1;
        let number = set.next_number;
        let name = format!("{}{}", shared.config.thread_name_prefix, number);

        let shared_clone = Arc::clone(shared);
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || Self::run(number, shared_clone, first_task))
            .map_err(|e| ExecutorError::spawn(&name, e.to_string()))?;

        set.threads.insert(number, handle);
        set.live += 1;
        set.largest = set.largest.max(set.live);

        log::debug!("Started worker {} ({} live)", name, set.live);
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_worker_spawned(set.live);
        Ok(())
    }

    /// Main worker loop
    ///
    /// Runs the first task, then pulls from the queue until the queue is
    /// closed and drained, or until the worker has been idle for the
    /// keep-alive period while the pool is above its core size.
    fn run(number: usize, shared: Arc<PoolShared>, first_task: Option<BoxedTask>) {
        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", number = number);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        if let Some(task) = first_task {
            Self::execute(number, &shared, task);
        }

        loop {
            let received = {
                let _intake = shared.intake.read();
                match shared.receiver.recv_timeout(shared.config.keep_alive) {
                    Ok(task) if shared.discarding.load(Ordering::Acquire) => {
                        shared.discard(task);
                        continue;
                    }
                    other => other,
                }
            };
            match received {
                Ok(task) => Self::execute(number, &shared, task),
                Err(RecvTimeoutError::Timeout) => {
                    let mut set = shared.workers.lock();
                    if set.live > shared.config.core_pool_size {
                        set.exited(number);
                        log::debug!("Worker {} idle past keep-alive, retiring", number);
                        #[cfg(feature = "tracing")]
                        crate::tracing::metrics::record_worker_retired(set.live);
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    // queue closed and drained
                    shared.workers.lock().exited(number);
                    #[cfg(feature = "tracing")]
                    debug!("worker shutting down");
                    break;
                }
            }
        }
    }

    #[allow(unused_variables)]
    fn execute(number: usize, shared: &PoolShared, task: BoxedTask) {
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_worker_busy(number);

        shared.active.fetch_add(1, Ordering::AcqRel);
        let outcome = shared.runner.run(task);
        shared.active.fetch_sub(1, Ordering::AcqRel);
        shared.counters.record(outcome);

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_worker_idle(number);
    }
}
