//! Engine configuration
//!
//! [`EngineConfig`] is plain serde data with builder-style setters. It can be
//! loaded from a TOML file; missing keys fall back to defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Hard upper bound on the working set
pub const WORKING_SET_LIMIT: usize = 50;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Working-set cap enforced at registration
    pub max_files: usize,
    /// Concurrent agents per instruction; `None` means one per target
    pub max_concurrency: Option<usize>,
    /// Per-file execution bound, retries included
    pub agent_timeout_ms: u64,
    /// Slack added to the aggregation deadline
    pub aggregation_margin_ms: u64,
    /// Backoff for an unavailable capability
    pub retry: RetryPolicy,
    /// Edits kept per file; 0 disables history
    pub history_limit: usize,
    /// Unwrap replies wrapped in a markdown code fence
    pub strip_code_fences: bool,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text and validate
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file and validate
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_files == 0 || self.max_files > WORKING_SET_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_files must be in 1..={WORKING_SET_LIMIT}, got {}",
                self.max_files
            )));
        }
        if self.max_concurrency == Some(0) {
            return Err(ConfigError::Invalid("max_concurrency must be at least 1".into()));
        }
        if self.agent_timeout_ms == 0 {
            return Err(ConfigError::Invalid("agent_timeout_ms must be positive".into()));
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(ConfigError::Invalid(
                "retry.initial_backoff_ms exceeds retry.max_backoff_ms".into(),
            ));
        }
        Ok(())
    }

    /// With working-set cap
    #[inline]
    #[must_use]
    pub fn with_max_files(mut self, max: usize) -> Self {
        self.max_files = max;
        self
    }

    /// With concurrency cap
    #[inline]
    #[must_use]
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = Some(max);
        self
    }

    /// With per-file timeout
    #[inline]
    #[must_use]
    pub fn with_agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// With history limit
    #[inline]
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Per-file timeout
    #[inline]
    #[must_use]
    pub fn agent_timeout(&self) -> Duration {
        Duration::from_millis(self.agent_timeout_ms)
    }

    /// Aggregation margin
    #[inline]
    #[must_use]
    pub fn aggregation_margin(&self) -> Duration {
        Duration::from_millis(self.aggregation_margin_ms)
    }

    /// Effective parallelism for `targets` tasks, always in `1..=WORKING_SET_LIMIT`
    #[must_use]
    pub fn concurrency_for(&self, targets: usize) -> usize {
        self.max_concurrency
            .unwrap_or(targets)
            .clamp(1, WORKING_SET_LIMIT)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_files: WORKING_SET_LIMIT,
            max_concurrency: None,
            agent_timeout_ms: 60_000,
            aggregation_margin_ms: 250,
            retry: RetryPolicy::default(),
            history_limit: 8,
            strip_code_fences: true,
        }
    }
}

/// Bounded exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff_ms: u64,
    /// Ceiling for any single delay
    pub max_backoff_ms: u64,
}

impl RetryPolicy {
    /// No retries at all
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based), doubling each time
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let shift = retry.saturating_sub(1).min(32);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 200,
            max_backoff_ms: 2_000,
        }
    }
}
