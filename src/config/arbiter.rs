//! Arbiter and scheduler configuration structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Smallest stack accepted for the scheduler worker.
pub const MIN_STACK_SIZE: usize = 16 * 1024;

/// Runtime adapter selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeConfig {
    /// Dedicated OS thread with a condvar wait loop.
    #[default]
    Native,
    /// Task on a tokio runtime.
    Tokio,
}

/// Scheduler worker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Name given to the worker thread.
    pub thread_name: String,
    /// Worker thread stack size in bytes.
    pub stack_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            thread_name: "arbiter-scheduler".into(),
            stack_size: 256 * 1024,
        }
    }
}

impl SchedulerConfig {
    /// Validate scheduler configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.thread_name.trim().is_empty() {
            return Err("thread_name must not be empty".into());
        }
        if self.stack_size < MIN_STACK_SIZE {
            return Err(format!("stack_size must be at least {MIN_STACK_SIZE} bytes"));
        }
        Ok(())
    }
}

/// Outbound notifier configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Capacity of each channel-backed client queue.
    pub queue_depth: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self { queue_depth: 64 }
    }
}

/// Root arbiter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// Delay between a request and its advice/grant notification.
    pub decision_delay_ms: u64,
    /// Drop notifications superseded by a newer request on the same claim.
    pub supersede_stale: bool,
    /// Scheduler worker settings.
    pub scheduler: SchedulerConfig,
    /// Outbound notifier settings.
    pub notifier: NotifierConfig,
    /// Runtime adapter selection.
    pub runtime: RuntimeConfig,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            decision_delay_ms: 1000,
            supersede_stale: true,
            scheduler: SchedulerConfig::default(),
            notifier: NotifierConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl ArbiterConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the decision delay, rounded up to whole milliseconds.
    #[must_use]
    pub fn with_decision_delay(mut self, delay: Duration) -> Self {
        self.decision_delay_ms =
            u64::try_from(delay.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX);
        self
    }

    /// Enable or disable stale-notification supersession.
    #[must_use]
    pub const fn with_supersede_stale(mut self, supersede: bool) -> Self {
        self.supersede_stale = supersede;
        self
    }

    /// Set the scheduler thread name.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.scheduler.thread_name = name.into();
        self
    }

    /// Select the runtime adapter.
    #[must_use]
    pub const fn with_runtime(mut self, runtime: RuntimeConfig) -> Self {
        self.runtime = runtime;
        self
    }

    /// Decision delay as a [`Duration`].
    #[must_use]
    pub const fn decision_delay(&self) -> Duration {
        Duration::from_millis(self.decision_delay_ms)
    }

    /// Validate all values.
    pub fn validate(&self) -> Result<(), String> {
        if self.decision_delay_ms == 0 {
            return Err("decision_delay_ms must be greater than 0".into());
        }
        if self.notifier.queue_depth == 0 {
            return Err("notifier.queue_depth must be greater than 0".into());
        }
        self.scheduler
            .validate()
            .map_err(|e| format!("scheduler invalid: {e}"))
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `ARBITER_*` environment variables, loading a
    /// `.env` file first when present. Unset variables keep their defaults.
    ///
    /// Recognized: `ARBITER_DECISION_DELAY_MS`, `ARBITER_SUPERSEDE_STALE`,
    /// `ARBITER_THREAD_NAME`, `ARBITER_STACK_SIZE`, `ARBITER_QUEUE_DEPTH`,
    /// `ARBITER_RUNTIME` (`native` or `tokio`).
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ArbiterConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = lookup("ARBITER_DECISION_DELAY_MS") {
            cfg.decision_delay_ms = parse_var("ARBITER_DECISION_DELAY_MS", &v)?;
        }
        if let Some(v) = lookup("ARBITER_SUPERSEDE_STALE") {
            cfg.supersede_stale = parse_var("ARBITER_SUPERSEDE_STALE", &v)?;
        }
        if let Some(v) = lookup("ARBITER_THREAD_NAME") {
            cfg.scheduler.thread_name = v;
        }
        if let Some(v) = lookup("ARBITER_STACK_SIZE") {
            cfg.scheduler.stack_size = parse_var("ARBITER_STACK_SIZE", &v)?;
        }
        if let Some(v) = lookup("ARBITER_QUEUE_DEPTH") {
            cfg.notifier.queue_depth = parse_var("ARBITER_QUEUE_DEPTH", &v)?;
        }
        if let Some(v) = lookup("ARBITER_RUNTIME") {
            cfg.runtime = match v.trim() {
                "native" => RuntimeConfig::Native,
                "tokio" => RuntimeConfig::Tokio,
                other => return Err(format!("ARBITER_RUNTIME: unknown runtime `{other}`")),
            };
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| format!("{key}: invalid value `{value}`: {e}"))
}
