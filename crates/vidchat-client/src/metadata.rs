//! Initial video metadata and endpoint payload extraction.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{ClientError, Result};
use crate::manifest;

/// What the retrieval needs to know about a video before it starts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoMetadata {
    pub video_id: String,
    /// The stream is broadcasting right now.
    pub is_live: bool,
    /// Total length in seconds, known once the stream has finished.
    pub duration: Option<f64>,
}

impl VideoMetadata {
    pub fn live(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            is_live: true,
            duration: None,
        }
    }

    pub fn recorded(video_id: impl Into<String>, duration: f64) -> Self {
        Self {
            video_id: video_id.into(),
            is_live: false,
            duration: Some(duration),
        }
    }
}

/// Find the `VideoConfig` module instance in a page payload and read the
/// live flag and manifest duration from it.
pub fn parse_video_metadata(payload: &Value, video_id: &str) -> Result<VideoMetadata> {
    let instances = payload
        .get("jsmods")
        .and_then(|jsmods| jsmods.get("instances"))
        .and_then(Value::as_array)
        .ok_or_else(|| ClientError::ApiResponse("missing jsmods.instances".to_string()))?;

    let video_data = instances
        .iter()
        .filter(|item| item.pointer("/1/0").and_then(Value::as_str) == Some("VideoConfig"))
        .filter_map(|item| item.pointer("/2/0"))
        .filter(|config| config.get("video_id").is_some_and(is_truthy))
        .find_map(|config| config.pointer("/videoData/0"))
        .ok_or_else(|| ClientError::ApiResponse("video configuration not found".to_string()))?;

    let is_live = video_data
        .get("is_live_stream")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    // A live manifest is dynamic and carries no presentation duration.
    let duration = match video_data.get("dash_manifest").and_then(Value::as_str) {
        Some(xml) if !is_live && !xml.is_empty() => match manifest::presentation_duration(xml) {
            Ok(duration) => Some(duration),
            Err(error) => {
                warn!(video_id, %error, "manifest duration unavailable");
                None
            }
        },
        _ => None,
    };

    Ok(VideoMetadata {
        video_id: video_data
            .get("video_id")
            .and_then(Value::as_str)
            .unwrap_or(video_id)
            .to_string(),
        is_live,
        duration,
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Comment nodes of one live poll, newest first as sent.
///
/// An edge without a node is passed through as `null` so it is counted as a
/// failed record rather than silently lost.
pub fn parse_live_page(response: &Value) -> Result<Vec<Value>> {
    if let Some(errors) = response
        .get("errors")
        .and_then(Value::as_array)
        .filter(|errors| !errors.is_empty())
    {
        let first = errors[0]
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unspecified error");
        return Err(ClientError::ApiResponse(format!(
            "{} error(s) reported, first: {first}",
            errors.len()
        )));
    }

    let feedback = response
        .pointer("/data/video/feedback")
        .filter(|feedback| is_truthy(feedback))
        .ok_or_else(|| ClientError::ApiResponse("missing data.video.feedback".to_string()))?;

    let edges = feedback
        .pointer("/top_level_comments/edges")
        .and_then(Value::as_array)
        .ok_or_else(|| ClientError::ApiResponse("missing top_level_comments.edges".to_string()))?;

    Ok(edges
        .iter()
        .map(|edge| edge.get("node").cloned().unwrap_or(Value::Null))
        .collect())
}

/// Replay entries of one window. An absent list means no comments.
pub fn parse_replay_window(response: &Value) -> Result<Vec<Value>> {
    if let Some(error) = response.get("error").filter(|error| is_truthy(error)) {
        let summary = response
            .get("errorSummary")
            .and_then(Value::as_str)
            .map_or_else(|| error.to_string(), str::to_string);
        return Err(ClientError::ApiResponse(summary));
    }
    let payload = response
        .get("payload")
        .ok_or_else(|| ClientError::ApiResponse("missing payload".to_string()))?;
    Ok(payload
        .get("ufipayloads")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default())
}
