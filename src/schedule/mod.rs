//! Fixed-rate scheduling and the heartbeat task

pub mod heartbeat;
pub mod scheduler;

pub use heartbeat::{HeartbeatHandle, HeartbeatSink, HeartbeatState, LogHeartbeatSink};
pub use scheduler::{ScheduleHandle, Scheduler};
