//! Video URL recognition.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ClientError, Result};

static VIDEO_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://(?:[\w-]+\.)?facebook\.com/(?:[^#]*?#!/)?[^/]+/videos/(?:[^/]+/)?(?P<id>[0-9]+)",
    )
    .expect("Invalid video URL regex")
});

/// Extract the numeric video id from a video URL, or accept a bare id.
///
/// ```
/// use vidchat_client::video_id_from_url;
///
/// let id = video_id_from_url("https://www.facebook.com/gaming/videos/382024729792892/").unwrap();
/// assert_eq!(id, "382024729792892");
/// ```
pub fn video_id_from_url(input: &str) -> Result<String> {
    let input = input.trim();
    if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(input.to_string());
    }
    VIDEO_URL_REGEX
        .captures(input)
        .and_then(|caps| caps.name("id"))
        .map(|id| id.as_str().to_string())
        .ok_or_else(|| ClientError::InvalidUrl(input.to_string()))
}
