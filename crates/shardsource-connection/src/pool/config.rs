//! Pool configuration types

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shardsource_core::{DataSourceError, Result};

/// Datasource property keys that tune the pool
pub mod keys {
    pub const MIN_SIZE: &[&str] = &["minIdle", "initialSize"];
    pub const MAX_SIZE: &[&str] = &["maxTotal", "maxActive"];
    pub const ACQUIRE_TIMEOUT_MS: &[&str] = &["maxWaitMillis", "maxWait"];
    pub const IDLE_TIMEOUT_MS: &[&str] = &["minEvictableIdleTimeMillis"];
    pub const MAX_LIFETIME_MS: &[&str] = &["maxConnLifetimeMillis"];
}

/// Configuration for a connection pool
///
/// Controls pool sizing, timeouts, and connection lifecycle. `min_size`
/// connections are opened when the pool is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    min_size: usize,
    max_size: usize,
    acquire_timeout_ms: u64,
    idle_timeout_ms: u64,
    max_lifetime_ms: Option<u64>,
}

impl PoolConfig {
    /// Create a new pool configuration with the given min and max sizes
    ///
    /// Sizes are checked by [`PoolConfig::validate`], which pool construction
    /// calls.
    pub fn new(min_size: usize, max_size: usize) -> Self {
        Self {
            min_size,
            max_size,
            acquire_timeout_ms: 30_000,
            idle_timeout_ms: 600_000,
            max_lifetime_ms: None,
        }
    }

    /// Read pool settings from a datasource property bag
    ///
    /// Unknown keys are ignored; absent keys keep their defaults.
    pub fn from_properties(properties: &HashMap<String, String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(min) = parse_property::<usize>(properties, keys::MIN_SIZE)? {
            config.min_size = min;
        }
        if let Some(max) = parse_property::<usize>(properties, keys::MAX_SIZE)? {
            config.max_size = max;
        }
        if let Some(ms) = parse_property(properties, keys::ACQUIRE_TIMEOUT_MS)? {
            config.acquire_timeout_ms = ms;
        }
        if let Some(ms) = parse_property(properties, keys::IDLE_TIMEOUT_MS)? {
            config.idle_timeout_ms = ms;
        }
        config.max_lifetime_ms = parse_property(properties, keys::MAX_LIFETIME_MS)?;

        config.validate()?;
        Ok(config)
    }

    /// Check sizing constraints
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(DataSourceError::Configuration(
                "max_size must be greater than 0".into(),
            ));
        }
        if self.min_size > self.max_size {
            return Err(DataSourceError::Configuration(format!(
                "min_size ({}) cannot exceed max_size ({})",
                self.min_size, self.max_size
            )));
        }
        Ok(())
    }

    /// Set the acquire timeout in milliseconds
    pub fn with_acquire_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.acquire_timeout_ms = timeout_ms;
        self
    }

    /// Set the idle timeout in milliseconds
    pub fn with_idle_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.idle_timeout_ms = timeout_ms;
        self
    }

    /// Set the maximum connection lifetime in milliseconds
    pub fn with_max_lifetime_ms(mut self, lifetime_ms: u64) -> Self {
        self.max_lifetime_ms = Some(lifetime_ms);
        self
    }

    pub fn min_size(&self) -> usize {
        self.min_size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn max_lifetime(&self) -> Option<Duration> {
        self.max_lifetime_ms.map(Duration::from_millis)
    }
}

impl Default for PoolConfig {
    /// Defaults:
    /// - min_size: 1
    /// - max_size: 10
    /// - acquire_timeout: 30 seconds
    /// - idle_timeout: 10 minutes
    /// - max_lifetime: None
    fn default() -> Self {
        Self::new(1, 10)
    }
}

fn parse_property<T: FromStr>(
    properties: &HashMap<String, String>,
    aliases: &[&str],
) -> Result<Option<T>> {
    let Some((key, raw)) = aliases
        .iter()
        .find_map(|key| properties.get(*key).map(|value| (*key, value)))
    else {
        return Ok(None);
    };

    raw.trim().parse::<T>().map(Some).map_err(|_| {
        DataSourceError::Configuration(format!(
            "pool property '{}' must be a non-negative integer in range, got '{}'",
            key, raw
        ))
    })
}
