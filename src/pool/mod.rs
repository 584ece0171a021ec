//! Executor, workers and task running

pub mod config;
pub mod executor;
pub mod runner;
pub mod stats;
mod worker;

pub use config::{ExecutorChoice, PoolConfig, SaturationPolicy};
pub use executor::{TaskExecutor, TaskExecutorBuilder};
pub use runner::{RunOutcome, TaskRunner};
pub use stats::{PoolCounters, PoolStats, ShutdownSummary};
