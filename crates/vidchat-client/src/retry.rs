//! Bounded retry with exponential backoff.

use std::time::Duration;

use crate::config::RetrievalConfig;

/// Backoff schedule: `base * 2^attempt`, capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base: Duration,
    pub max: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base: config.backoff_base,
            max: config.backoff_max,
        }
    }

    /// Delay before retry number `retry` (0-based).
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.base.checked_mul(factor).unwrap_or(self.max).min(self.max)
    }

    /// Whether another retry is allowed after `retries` have been made.
    pub fn allows(&self, retries: u32) -> bool {
        retries < self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetrievalConfig::default())
    }
}
