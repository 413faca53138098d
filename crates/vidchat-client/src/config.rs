//! Retrieval settings.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Settings for one retrieval call.
///
/// Durations are written in seconds in TOML:
///
/// ```toml
/// request_timeout = 15
/// poll_interval = 2.5
/// end_time = 600
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Per-request timeout for every endpoint.
    #[serde(with = "seconds")]
    pub request_timeout: Duration,

    /// Minimum delay between two live polls.
    #[serde(with = "seconds")]
    pub poll_interval: Duration,

    /// Retries per step after the first attempt.
    pub max_retries: u32,

    /// First backoff delay; doubled on every retry.
    #[serde(with = "seconds")]
    pub backoff_base: Duration,

    #[serde(with = "seconds")]
    pub backoff_max: Duration,

    /// Number of recent ids remembered for live dedup.
    pub dedup_capacity: usize,

    /// Replay window length in seconds.
    pub window_secs: f64,

    /// Maximum reply nesting depth.
    pub max_reply_depth: usize,

    /// Replay start offset in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,

    /// Replay end offset in seconds. Defaults to the video duration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,

    /// Stop after this many messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_messages: Option<usize>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(2),
            max_retries: 5,
            backoff_base: Duration::from_secs(1),
            backoff_max: Duration::from_secs(30),
            dedup_capacity: 25,
            window_secs: 60.0,
            max_reply_depth: vidchat_normalize::DEFAULT_MAX_DEPTH,
            start_time: None,
            end_time: None,
            max_messages: None,
        }
    }
}

impl RetrievalConfig {
    /// Parse settings from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Whether the caller asked for a specific time range.
    pub fn has_time_range(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.window_secs.is_finite() && self.window_secs > 0.0) {
            return Err(ClientError::Config(format!(
                "window_secs must be positive, got {}",
                self.window_secs
            )));
        }
        if self.dedup_capacity == 0 {
            return Err(ClientError::Config(
                "dedup_capacity must be at least 1".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ClientError::Config(
                "request_timeout must be positive".to_string(),
            ));
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time)
            && end < start
        {
            return Err(ClientError::Config(format!(
                "end_time {end} is before start_time {start}"
            )));
        }
        Ok(())
    }
}

/// Serialize a [`Duration`] as (fractional) seconds.
mod seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(de::Error::custom)
    }
}
