//! Executor configuration

use crate::core::{ExecutorError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do with a submission when every worker is busy and the queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaturationPolicy {
    /// Return [`ExecutorError::PoolSaturated`] to the submitter (default)
    #[default]
    Reject,

    /// Block the submitter until queue space frees up
    Block,

    /// Block up to the timeout, then return [`ExecutorError::SubmissionTimeout`]
    BlockWithTimeout(#[serde(with = "duration_ms")] Duration),

    /// Run the task on the submitting thread
    CallerRuns,
}

/// Configuration for a [`TaskExecutor`](crate::pool::TaskExecutor)
///
/// Values normally come from an external configuration source; the struct
/// deserializes from JSON with every field optional.
///
/// # Example
///
/// ```rust
/// use rust_task_executor::pool::PoolConfig;
///
/// let config = PoolConfig::new(3, 5)
///     .with_queue_capacity(25)
///     .with_thread_name_prefix("AnExecutor-");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Workers kept alive even when idle
    pub core_pool_size: usize,
    /// Upper bound on workers; extra workers start only when the queue is full
    pub max_pool_size: usize,
    /// Backlog queue capacity (0 = unbounded)
    pub queue_capacity: usize,
    /// Thread name prefix; workers are named `{prefix}{n}`
    pub thread_name_prefix: String,
    /// Whether shutdown waits for queued and running tasks
    pub wait_for_tasks_on_shutdown: bool,
    /// Idle time after which workers above the core size retire
    #[serde(with = "duration_ms", rename = "keep_alive_ms")]
    pub keep_alive: Duration,
    /// Behaviour when pool and queue are both full
    pub saturation_policy: SaturationPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            core_pool_size: 5,
            max_pool_size: 10,
            queue_capacity: 25,
            thread_name_prefix: "MyExecutor-".to_string(),
            wait_for_tasks_on_shutdown: true,
            keep_alive: Duration::from_secs(60),
            saturation_policy: SaturationPolicy::default(),
        }
    }
}

impl PoolConfig {
    /// Create a configuration with the given core and maximum sizes
    #[must_use]
    pub fn new(core_pool_size: usize, max_pool_size: usize) -> Self {
        Self {
            core_pool_size,
            max_pool_size,
            ..Default::default()
        }
    }

    /// Configuration used when no executor is provided
    ///
    /// One worker per available CPU, unbounded queue.
    #[must_use]
    pub fn platform_default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            core_pool_size: cpus,
            max_pool_size: cpus,
            queue_capacity: 0,
            thread_name_prefix: "task-".to_string(),
            ..Default::default()
        }
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ExecutorError::invalid_config("json", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set backlog queue capacity (0 = unbounded)
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set whether shutdown waits for outstanding tasks
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_wait_for_tasks_on_shutdown(mut self, wait: bool) -> Self {
        self.wait_for_tasks_on_shutdown = wait;
        self
    }

    /// Set idle time after which workers above the core size retire
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Set the saturation policy
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_saturation_policy(mut self, policy: SaturationPolicy) -> Self {
        self.saturation_policy = policy;
        self
    }

    /// Block submitters while the pool is saturated.
    ///
    /// Equivalent to `with_saturation_policy(SaturationPolicy::Block)`.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn block_when_saturated(self) -> Self {
        self.with_saturation_policy(SaturationPolicy::Block)
    }

    /// Run tasks on the submitting thread while the pool is saturated.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn caller_runs_when_saturated(self) -> Self {
        self.with_saturation_policy(SaturationPolicy::CallerRuns)
    }

    /// Whether the backlog queue has a capacity limit
    pub fn is_queue_bounded(&self) -> bool {
        self.queue_capacity > 0
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.core_pool_size == 0 {
            return Err(ExecutorError::invalid_config(
                "core_pool_size",
                "Core pool size must be greater than 0",
            ));
        }
        if self.max_pool_size < self.core_pool_size {
            return Err(ExecutorError::invalid_config(
                "max_pool_size",
                format!(
                    "Maximum pool size {} is smaller than core pool size {}",
                    self.max_pool_size, self.core_pool_size
                ),
            ));
        }
        if self.thread_name_prefix.is_empty() {
            return Err(ExecutorError::invalid_config(
                "thread_name_prefix",
                "Thread name prefix must not be empty",
            ));
        }
        if self.keep_alive.is_zero() {
            return Err(ExecutorError::invalid_config(
                "keep_alive",
                "Keep-alive must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Which executor backs asynchronous submissions
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExecutorChoice {
    /// Use an executor built from this configuration
    Provided(PoolConfig),
    /// Use the platform default executor
    #[default]
    PlatformDefault,
}

impl ExecutorChoice {
    /// Choose between a provided configuration and the platform default
    pub fn from_switch(use_default_executor: bool, config: PoolConfig) -> Self {
        if use_default_executor {
            ExecutorChoice::PlatformDefault
        } else {
            ExecutorChoice::Provided(config)
        }
    }

    /// Resolve to a concrete configuration
    pub fn resolve(self) -> PoolConfig {
        match self {
            ExecutorChoice::Provided(config) => config,
            ExecutorChoice::PlatformDefault => PoolConfig::platform_default(),
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PoolConfig::default();
        assert_eq!(config.core_pool_size, 5);
        assert_eq!(config.max_pool_size, 10);
        assert_eq!(config.queue_capacity, 25);
        assert!(config.wait_for_tasks_on_shutdown);
        assert_eq!(config.saturation_policy, SaturationPolicy::Reject);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_sizes() {
        let err = PoolConfig::new(0, 5).validate().unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidConfig { ref parameter, .. } if parameter == "core_pool_size"));

        let err = PoolConfig::new(5, 3).validate().unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidConfig { ref parameter, .. } if parameter == "max_pool_size"));

        let err = PoolConfig::new(1, 1)
            .with_thread_name_prefix("")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidConfig { .. }));
    }

    #[test]
    fn test_from_json_applies_defaults() {
        let config = PoolConfig::from_json(
            r#"{
                "core_pool_size": 3,
                "max_pool_size": 5,
                "thread_name_prefix": "AnExecutor-",
                "keep_alive_ms": 1500,
                "saturation_policy": { "block_with_timeout": 250 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.core_pool_size, 3);
        assert_eq!(config.max_pool_size, 5);
        assert_eq!(config.queue_capacity, 25);
        assert_eq!(config.keep_alive, Duration::from_millis(1500));
        assert_eq!(
            config.saturation_policy,
            SaturationPolicy::BlockWithTimeout(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_from_json_validates() {
        let err = PoolConfig::from_json(r#"{ "core_pool_size": 8, "max_pool_size": 2 }"#)
            .unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidConfig { .. }));

        let err = PoolConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidConfig { ref parameter, .. } if parameter == "json"));
    }

    #[test]
    fn test_executor_choice() {
        let provided = PoolConfig::new(3, 5);
        assert_eq!(
            ExecutorChoice::from_switch(false, provided.clone()).resolve(),
            provided
        );

        let fallback = ExecutorChoice::from_switch(true, provided).resolve();
        assert_eq!(fallback.thread_name_prefix, "task-");
        assert!(!fallback.is_queue_bounded());
        assert_eq!(fallback.core_pool_size, fallback.max_pool_size);
        assert!(fallback.validate().is_ok());
    }

    #[test]
    fn test_huge_durations_saturate_when_serialized() {
        let config = PoolConfig::new(1, 1).with_keep_alive(Duration::MAX);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["keep_alive_ms"], serde_json::json!(u64::MAX));
    }
}
