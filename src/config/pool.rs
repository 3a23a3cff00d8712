//! Pool configuration structures.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default drain deadline for graceful close, in seconds.
const DEFAULT_CLOSE_TIMEOUT_SECS: u64 = 3;

/// Configuration for one pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Worker count [`start`](crate::TaskPool::start) brings the pool to.
    pub initial_workers: usize,
    /// Maximum queued items before submission blocks (or fails, for the
    /// nowait variants).
    pub max_queued_tasks: usize,
    /// When set, `pause` is permanent: `resume` is refused and the pool
    /// stays gated until closed.
    pub terminal_pause: bool,
    /// Default drain deadline for graceful close, in seconds.
    pub close_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_workers: num_cpus::get(),
            max_queued_tasks: 1024,
            terminal_pause: false,
            close_timeout_secs: DEFAULT_CLOSE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial worker count.
    #[must_use]
    pub const fn with_initial_workers(mut self, count: usize) -> Self {
        self.initial_workers = count;
        self
    }

    /// Set the queue capacity.
    #[must_use]
    pub const fn with_max_queued_tasks(mut self, capacity: usize) -> Self {
        self.max_queued_tasks = capacity;
        self
    }

    /// Make pausing terminal.
    #[must_use]
    pub const fn with_terminal_pause(mut self, terminal: bool) -> Self {
        self.terminal_pause = terminal;
        self
    }

    /// Set the default close timeout in seconds.
    #[must_use]
    pub const fn with_close_timeout_secs(mut self, secs: u64) -> Self {
        self.close_timeout_secs = secs;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_workers == 0 {
            return Err("initial_workers must be greater than 0".into());
        }
        if self.max_queued_tasks == 0 {
            return Err("max_queued_tasks must be greater than 0".into());
        }
        if self.close_timeout_secs == 0 {
            return Err("close_timeout_secs must be greater than 0".into());
        }
        Ok(())
    }

    /// Default close options derived from this configuration.
    #[must_use]
    pub fn close_options(&self) -> CloseOptions {
        CloseOptions {
            pool_timeout: Duration::from_secs(self.close_timeout_secs),
            ..CloseOptions::default()
        }
    }
}

/// Options controlling graceful close.
#[derive(Debug, Clone)]
pub struct CloseOptions {
    /// Bound on each individual worker exit; unbounded when `None`.
    pub worker_timeout: Option<Duration>,
    /// Bound on the whole drain.
    pub pool_timeout: Duration,
    /// When set, a drain timeout is logged and swallowed instead of
    /// surfaced as `CloseTimeout`.
    pub safe: bool,
}

impl Default for CloseOptions {
    fn default() -> Self {
        Self {
            worker_timeout: None,
            pool_timeout: Duration::from_secs(DEFAULT_CLOSE_TIMEOUT_SECS),
            safe: true,
        }
    }
}

/// Root configuration: a map of pool name to configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolsConfig {
    /// Named pool configurations.
    pub pools: HashMap<String, PoolConfig>,
}

impl PoolsConfig {
    /// Validate all pools and ensure at least one pool exists.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid pool.
    pub fn validate(&self) -> Result<(), String> {
        if self.pools.is_empty() {
            return Err("at least one pool must be defined".into());
        }
        for (name, pool) in &self.pools {
            pool.validate()
                .map_err(|e| format!("pool `{name}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation error description.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PoolConfig::new().validate().is_ok());
    }

    #[test]
    fn test_zero_values_rejected() {
        assert!(PoolConfig::new().with_initial_workers(0).validate().is_err());
        assert!(PoolConfig::new()
            .with_max_queued_tasks(0)
            .validate()
            .is_err());
        assert!(PoolConfig::new()
            .with_close_timeout_secs(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_close_options_from_config() {
        let opts = PoolConfig::new().with_close_timeout_secs(7).close_options();
        assert_eq!(opts.pool_timeout, Duration::from_secs(7));
        assert!(opts.safe);
        assert!(opts.worker_timeout.is_none());
    }

    #[test]
    fn test_pools_config_from_json() {
        let cfg = PoolsConfig::from_json_str(
            r#"{
                "pools": {
                    "default": {
                        "initial_workers": 2,
                        "max_queued_tasks": 64,
                        "terminal_pause": false,
                        "close_timeout_secs": 3
                    }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.pools["default"].initial_workers, 2);

        assert!(PoolsConfig::from_json_str(r#"{"pools": {}}"#).is_err());
    }
}
