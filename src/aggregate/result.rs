//! Shared aggregate handed to every task of a result-bearing batch

use crate::aggregate::barrier::ResultBarrier;
use crate::core::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Partial-failure tolerant collection of task outcomes
///
/// Cloning is cheap and every clone refers to the same barrier. The caller
/// creates the aggregate for N tasks, hands a clone to each of them, then
/// waits with a timeout and reads whatever arrived.
///
/// Tasks still running after a timed-out wait may contribute later; take a
/// [`snapshot`](Self::snapshot) right after the wait to freeze the view.
pub struct AggregateResult<T = String> {
    id: Uuid,
    created_at: DateTime<Utc>,
    barrier: Arc<ResultBarrier<T>>,
}

impl<T> AggregateResult<T> {
    /// Create an aggregate expecting `expected` successful tasks
    pub fn new(expected: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            barrier: Arc::new(ResultBarrier::new(expected)),
        }
    }

    /// Unique identity of this aggregate
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the aggregate was created
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The underlying barrier
    pub fn barrier(&self) -> &ResultBarrier<T> {
        &self.barrier
    }

    /// Number of tasks expected to contribute
    pub fn expected(&self) -> usize {
        self.barrier.expected()
    }

    /// Contributions still outstanding
    pub fn remaining(&self) -> usize {
        self.barrier.remaining()
    }

    /// Contributions received so far
    pub fn completed(&self) -> usize {
        self.barrier.completed()
    }

    /// Record one successful outcome
    pub fn record(&self, outcome: T) -> Result<usize> {
        let remaining = self.barrier.contribute(outcome)?;
        log::debug!(
            "Added result to aggregate {} ({} outstanding)",
            self.id,
            remaining
        );
        Ok(remaining)
    }

    /// Wait for all expected outcomes or until `timeout` elapses
    pub fn await_timeout(&self, timeout: Duration) -> bool {
        self.barrier.await_timeout(timeout)
    }
}

impl<T: Clone> AggregateResult<T> {
    /// Copy of the outcomes in completion order
    pub fn snapshot(&self) -> Vec<T> {
        self.barrier.snapshot()
    }

    /// Serializable summary of the aggregate's current state
    pub fn summary(&self) -> AggregateSummary<T> {
        let (results, missing) = self.barrier.view();
        AggregateSummary {
            id: self.id,
            expected: self.expected(),
            succeeded: results.len(),
            missing,
            results,
        }
    }
}

impl<T> Clone for AggregateResult<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            created_at: self.created_at,
            barrier: Arc::clone(&self.barrier),
        }
    }
}

impl<T> fmt::Debug for AggregateResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateResult")
            .field("id", &self.id)
            .field("expected", &self.expected())
            .field("remaining", &self.remaining())
            .finish()
    }
}

/// Point-in-time view of an [`AggregateResult`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSummary<T> {
    /// Aggregate identity
    pub id: Uuid,
    /// Tasks expected to contribute
    pub expected: usize,
    /// Tasks that contributed
    pub succeeded: usize,
    /// Tasks that failed or had not finished
    pub missing: usize,
    /// Outcomes in completion order
    pub results: Vec<T>,
}

/// Wait on an aggregate with a timeout; `true` when every task reported
pub fn await_all<T>(aggregate: &AggregateResult<T>, timeout: Duration) -> bool {
    aggregate.await_timeout(timeout)
}
