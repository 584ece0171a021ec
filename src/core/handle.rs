//! Handles for result-bearing tasks

use crate::core::error::{ExecutorError, Result};
use crate::core::task::{Task, TaskId};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

/// Handle to the eventual result of a task submitted with
/// [`TaskExecutor::submit_with_handle`](crate::pool::TaskExecutor::submit_with_handle)
///
/// The result can be taken once. Errors returned by the task body are
/// delivered here rather than to the failure sink. If the task panics the
/// handle reports [`ExecutorError::TaskLost`].
#[derive(Debug)]
pub struct TaskHandle<T> {
    task_id: TaskId,
    receiver: Receiver<Result<T>>,
}

impl<T> TaskHandle<T> {
    /// Identity of the task behind this handle
    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Block until the task finishes and return its result
    pub fn join(self) -> Result<T> {
        self.receiver
            .recv()
            .unwrap_or_else(|_| Err(ExecutorError::task_lost(&self.task_id)))
    }

    /// Wait up to `timeout` for the result; `None` if it is not ready yet
    pub fn join_timeout(&self, timeout: Duration) -> Option<Result<T>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                Some(Err(ExecutorError::task_lost(&self.task_id)))
            }
        }
    }

    /// Return the result if the task already finished
    pub fn try_join(&self) -> Option<Result<T>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ExecutorError::task_lost(&self.task_id))),
        }
    }

    /// Await the result from async code
    ///
    /// The blocking wait is moved onto tokio's blocking pool so the async
    /// runtime's workers are never parked.
    #[cfg(feature = "async")]
    pub async fn join_async(self) -> Result<T>
    where
        T: Send + 'static,
    {
        let task_id = self.task_id.clone();
        tokio::task::spawn_blocking(move || self.join())
            .await
            .map_err(|e| ExecutorError::task_panicked(task_id, e.to_string()))?
    }
}

/// Task adapter that delivers its closure's result to a [`TaskHandle`]
pub(crate) struct HandleTask<T, F>
where
    F: FnOnce() -> Result<T> + Send,
{
    id: TaskId,
    closure: Option<F>,
    sender: Sender<Result<T>>,
}

impl<T, F> HandleTask<T, F>
where
    T: Send,
    F: FnOnce() -> Result<T> + Send,
{
    pub(crate) fn new(id: TaskId, closure: F) -> (Self, TaskHandle<T>) {
        let (sender, receiver) = channel::bounded(1);
        let handle = TaskHandle {
            task_id: id.clone(),
            receiver,
        };
        let task = Self {
            id,
            closure: Some(closure),
            sender,
        };
        (task, handle)
    }
}

impl<T, F> Task for HandleTask<T, F>
where
    T: Send,
    F: FnOnce() -> Result<T> + Send,
{
    fn id(&self) -> &TaskId {
        &self.id
    }

    fn run(&mut self) -> Result<()> {
        let closure = self.closure.take().ok_or_else(|| {
            ExecutorError::task_failed(&self.id, "HandleTask already executed")
        })?;
        // A dropped handle means nobody is waiting; the result is discarded.
        let _ = self.sender.send(closure());
        Ok(())
    }
}
