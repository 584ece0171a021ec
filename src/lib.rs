//! # Rust Task Executor
//!
//! A bounded task executor for fire-and-forget work, with result aggregation,
//! failure isolation and a fixed-rate scheduler.
//!
//! ## Features
//!
//! - **Bounded Pool**: core and maximum worker counts with a capacity-limited backlog
//! - **Saturation Policies**: reject, block, block with timeout, or run on the caller
//! - **Result Aggregation**: wait for N tasks with a timeout and read partial results
//! - **Failure Isolation**: task errors and panics go to a pluggable sink, never to the pool
//! - **Fixed-Rate Scheduling**: periodic tasks and a heartbeat on a dedicated timer thread
//! - **Graceful Shutdown**: drain and join, or discard the backlog
//!
//! ## Quick Start
//!
//! ```rust
//! use rust_task_executor::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let executor = TaskExecutor::new(PoolConfig::new(3, 5))?;
//!
//! for i in 0..10u64 {
//!     executor.execute(i, move || {
//!         println!("Task {} executing", i);
//!         Ok(())
//!     })?;
//! }
//!
//! executor.shutdown(true)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use rust_task_executor::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let config = PoolConfig::new(3, 5)
//!     .with_queue_capacity(25)
//!     .with_thread_name_prefix("AnExecutor-")
//!     .block_when_saturated();
//!
//! let executor = TaskExecutor::new(config)?;
//! # executor.shutdown(true)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Partial Results
//!
//! Tasks that fail are reported to the failure sink and leave no entry in the
//! aggregate, so a bounded wait returns what arrived in time.
//!
//! ```rust
//! use rust_task_executor::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # fn main() -> Result<()> {
//! let failures = Arc::new(RecordingFailureSink::new());
//! let executor = TaskExecutor::builder(PoolConfig::default())
//!     .failure_sink(failures.clone())
//!     .build()?;
//!
//! let words: AggregateResult = AggregateResult::new(5);
//! for i in 0..5u64 {
//!     executor.submit_to(&words, i, move || {
//!         if i % 2 == 0 && i > 0 {
//!             Err(ExecutorError::task_failed(i, "Not happy!"))
//!         } else {
//!             Ok(format!("word-{}", i))
//!         }
//!     })?;
//! }
//!
//! let all_arrived = executor.await_all(&words, Duration::from_millis(500));
//! assert!(!all_arrived);
//! assert_eq!(words.snapshot().len(), 3);
//! # executor.shutdown(true)?;
//! assert_eq!(failures.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Scheduling
//!
//! ```rust
//! use rust_task_executor::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> Result<()> {
//! let scheduler = Scheduler::new("jobs")?;
//! let heartbeat = scheduler.schedule_heartbeat(Duration::from_secs(1), LogHeartbeatSink)?;
//! # heartbeat.cancel();
//! scheduler.shutdown()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregate;
pub mod core;
pub mod pool;
pub mod prelude;
pub mod schedule;
pub mod tracing;

pub use crate::aggregate::{await_all, AggregateResult, ResultBarrier};
pub use crate::core::{ExecutorError, FailureSink, Result, Task, TaskHandle, TaskId};
pub use crate::pool::{PoolConfig, TaskExecutor};
pub use crate::schedule::Scheduler;
