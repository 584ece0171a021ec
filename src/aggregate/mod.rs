//! Result aggregation for batches of tasks
//!
//! [`ResultBarrier`] is the synchronization primitive; [`AggregateResult`] is
//! the shared handle passed into every task of a batch.

pub mod barrier;
pub mod result;

pub use barrier::ResultBarrier;
pub use result::{await_all, AggregateResult, AggregateSummary};
