//! Error types for chat retrieval.

use thiserror::Error;
use vidchat_normalize::RuleError;

/// Errors that can occur while retrieving chat.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// A required session token or cookie could not be obtained.
    #[error("session bootstrap failed: {0}")]
    Bootstrap(String),

    /// The platform reported errors or left out an expected container.
    #[error("unexpected API response: {0}")]
    ApiResponse(String),

    /// Network request failed.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse a JSON response.
    #[error("JSON parse error: {0}")]
    Json(String),

    /// The media presentation manifest could not be read.
    #[error("invalid manifest: {0}")]
    Manifest(String),

    /// Input is neither a recognised video URL nor a video id.
    #[error("not a video URL or id: {0}")]
    InvalidUrl(String),

    /// A retryable step kept failing.
    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Attempts made, including the first.
        attempts: u32,
        /// Error from the final attempt.
        last: Box<ClientError>,
    },

    /// Rule tables failed validation.
    #[error(transparent)]
    Rules(#[from] RuleError),

    /// Invalid retrieval configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Returns a short message suitable for end users.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Bootstrap(_) => "Could not start a session. The site may have changed its login page.",
            Self::Network(_) => "Could not reach the site. Please check your internet connection.",
            Self::InvalidUrl(_) => "That does not look like a video URL.",
            Self::RetriesExhausted { .. } => "The site kept returning errors. Please try again later.",
            Self::Rules(_) | Self::Config(_) => "The configuration is invalid.",
            Self::ApiResponse(_) | Self::Json(_) | Self::Manifest(_) => {
                "The site returned an unexpected response."
            }
        }
    }

    /// Returns whether retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ApiResponse(_) | Self::Network(_) | Self::Json(_))
    }

    /// Returns whether this error ends the whole retrieval. Anything else
    /// only costs the current poll or window.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Bootstrap(_) | Self::Config(_) | Self::Rules(_) | Self::InvalidUrl(_)
        )
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(ClientError::ApiResponse("no feedback".to_string()).is_retryable());
        assert!(ClientError::Network("timeout".to_string()).is_retryable());
        assert!(!ClientError::Bootstrap("no lsd".to_string()).is_retryable());
        assert!(ClientError::Bootstrap("no lsd".to_string()).is_fatal());
        let exhausted = ClientError::RetriesExhausted {
            attempts: 6,
            last: Box::new(ClientError::Network("timeout".to_string())),
        };
        assert!(!exhausted.is_fatal());
        assert!(!exhausted.is_retryable());
        assert!(ClientError::Config("bad range".to_string()).is_fatal());
        assert!(!ClientError::Manifest("no MPD".to_string()).is_fatal());
        assert!(exhausted.to_string().contains("6 attempts"));
    }

    #[test]
    fn test_user_messages() {
        let err = ClientError::Network("connection refused".to_string());
        assert!(err.user_message().contains("internet connection"));
        let err = ClientError::InvalidUrl("https://example.com".to_string());
        assert!(err.user_message().contains("video URL"));
    }
}
