//! # Service Configuration
//!
//! [`ServiceConfig`] gathers the retry policy, idempotency cache bounds,
//! graph limits, deadline defaults, and logging setup of one
//! [`RoutingService`](crate::RoutingService). Every field has a serde
//! default, so an empty YAML document is a valid configuration.
//!
//! ```yaml
//! retry:
//!   max_attempts: 5
//!   initial_backoff_ms: 50
//! cache:
//!   capacity: 1000
//!   ttl_secs: 600
//! default_timeout_ms: 2000
//! logging:
//!   filter: "waypoint_service=debug,info"
//!   json: true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use waypoint_core::GraphLimits;
use waypoint_routing::DEFAULT_CHECK_INTERVAL;

/// Errors loading or validating a [`ServiceConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Retry
// ---------------------------------------------------------------------------

/// Bounded exponential backoff with multiplicative jitter.
///
/// The delay before retry `k` (1-based) is
/// `min(initial_backoff_ms * multiplier^(k-1) * jitter, max_backoff_ms)`
/// with `jitter` drawn uniformly from `[jitter_min, jitter_max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total executions allowed, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_jitter_min")]
    pub jitter_min: f64,
    #[serde(default = "default_jitter_max")]
    pub jitter_max: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    5_000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_jitter_min() -> f64 {
    0.8
}

fn default_jitter_max() -> f64 {
    1.2
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            multiplier: default_multiplier(),
            jitter_min: default_jitter_min(),
            jitter_max: default_jitter_max(),
        }
    }
}

impl RetryConfig {
    /// Check the policy yields strictly increasing delays below the cap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(invalid("retry.max_attempts", "must be at least 1"));
        }
        if self.initial_backoff_ms == 0 {
            return Err(invalid("retry.initial_backoff_ms", "must be positive"));
        }
        if self.max_backoff_ms < self.initial_backoff_ms {
            return Err(invalid(
                "retry.max_backoff_ms",
                format!(
                    "{} is below initial_backoff_ms {}",
                    self.max_backoff_ms, self.initial_backoff_ms
                ),
            ));
        }
        if !self.multiplier.is_finite() || self.multiplier <= 1.0 {
            return Err(invalid(
                "retry.multiplier",
                format!("{} must be a finite value above 1", self.multiplier),
            ));
        }
        if !(self.jitter_min.is_finite() && self.jitter_max.is_finite())
            || self.jitter_min <= 0.0
            || self.jitter_min > self.jitter_max
        {
            return Err(invalid(
                "retry.jitter_min",
                format!(
                    "jitter range [{}, {}] must be positive and ordered",
                    self.jitter_min, self.jitter_max
                ),
            ));
        }
        // The lowest jittered delay of retry k+1 must exceed the highest of
        // retry k.
        if self.multiplier * self.jitter_min <= self.jitter_max {
            return Err(invalid(
                "retry.multiplier",
                format!(
                    "multiplier {} with jitter [{}, {}] does not guarantee increasing delays",
                    self.multiplier, self.jitter_min, self.jitter_max
                ),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Bounds of the in-memory idempotency store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Completed responses kept before the oldest is evicted.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Lifetime of a completed response. `None` keeps entries until evicted.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: Option<u64>,
}

fn default_capacity() -> usize {
    10_000
}

fn default_ttl_secs() -> Option<u64> {
    Some(3_600)
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Subscriber setup applied by [`init_tracing`](crate::telemetry::init_tracing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives. `RUST_LOG` takes precedence when set.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Complete configuration of a routing service instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub limits: GraphLimits,
    /// Deadline applied to requests that carry no timeout of their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_timeout_ms: Option<u64>,
    /// Algorithm iterations between deadline checks.
    #[serde(default = "default_check_interval")]
    pub deadline_check_interval: u32,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_check_interval() -> u32 {
    DEFAULT_CHECK_INTERVAL
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            cache: CacheConfig::default(),
            limits: GraphLimits::default(),
            default_timeout_ms: None,
            deadline_check_interval: default_check_interval(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded service config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.retry.validate()?;
        if self.cache.capacity == 0 {
            return Err(invalid("cache.capacity", "must be at least 1"));
        }
        if self.deadline_check_interval == 0 {
            return Err(invalid("deadline_check_interval", "must be at least 1"));
        }
        if self.limits.max_nodes == 0 {
            return Err(invalid("limits.max_nodes", "must be at least 1"));
        }
        Ok(())
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout_ms.map(Duration::from_millis)
    }
}
