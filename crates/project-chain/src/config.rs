//! Chain configuration
//!
//! Tuning for the append protocol. Loaded from the environment by binaries,
//! constructed directly in tests.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Append protocol settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Stale answers tolerated per append before giving up.
    pub max_stale_retries: u32,
    /// Backoff before the first resync, doubled per attempt.
    pub retry_backoff_ms: u64,
    /// Upper bound for a single backoff.
    pub max_backoff_ms: u64,
    /// Log sync progress at info level.
    pub verbose_sync: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            max_stale_retries: 8,
            retry_backoff_ms: 25,
            max_backoff_ms: 1_000,
            verbose_sync: true,
        }
    }
}

/// Invalid configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_backoff_ms ({max}) must be >= retry_backoff_ms ({base})")]
    BackoffBounds { base: u64, max: u64 },
}

impl ChainConfig {
    /// Load from environment variables, falling back to defaults.
    ///
    /// - `PC_MAX_STALE_RETRIES`
    /// - `PC_RETRY_BACKOFF_MS`
    /// - `PC_MAX_BACKOFF_MS`
    /// - `PC_VERBOSE_SYNC`
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_stale_retries: env_or("PC_MAX_STALE_RETRIES", defaults.max_stale_retries),
            retry_backoff_ms: env_or("PC_RETRY_BACKOFF_MS", defaults.retry_backoff_ms),
            max_backoff_ms: env_or("PC_MAX_BACKOFF_MS", defaults.max_backoff_ms),
            verbose_sync: env::var("PC_VERBOSE_SYNC")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.verbose_sync),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_backoff_ms < self.retry_backoff_ms {
            return Err(ConfigError::BackoffBounds {
                base: self.retry_backoff_ms,
                max: self.max_backoff_ms,
            });
        }
        Ok(())
    }

    /// Sleep before resync number `attempt` (0-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let millis = self
            .retry_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }

    /// No backoff, for tests driving the retry loop.
    pub fn immediate(max_stale_retries: u32) -> Self {
        Self {
            max_stale_retries,
            retry_backoff_ms: 0,
            max_backoff_ms: 0,
            verbose_sync: false,
        }
    }
}

fn env_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(
                "[project-chain] ignoring invalid {}={:?}, using {}",
                key, raw, default
            );
            default
        }),
        Err(_) => default,
    }
}
