use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attachment::{Attachment, Reactions};
use crate::author::Author;
use crate::lenient::{
    opt_bool, opt_f64, opt_i64, opt_string_or_number, opt_u64, string_or_number,
};

/// Kind of chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Message carries body text.
    #[default]
    TextMessage,
    /// Message carries no text, only attachments (stickers, star gifts, ...).
    AttachmentMessage,
}

/// A normalized chat message.
///
/// Constructed once by the normalizer and immutable afterwards. Optional
/// containers are absent rather than empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(deserialize_with = "string_or_number")]
    pub message_id: String,
    /// Creation time in microseconds since the Unix epoch.
    #[serde(
        default,
        deserialize_with = "opt_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub message_type: MessageType,
    /// Offset into the video, in seconds.
    #[serde(
        default,
        deserialize_with = "opt_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_in_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reactions: Option<Reactions>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<Box<ChatMessage>>,

    #[serde(
        default,
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub message_url: Option<String>,
    /// Source dialect reported by the translation service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_dialect: Option<String>,
    #[serde(
        default,
        deserialize_with = "opt_u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub number_of_edits: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community_moderation_state: Option<Value>,
    #[serde(
        default,
        deserialize_with = "opt_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub upvote_downvote_total: Option<i64>,
    #[serde(
        default,
        deserialize_with = "opt_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub written_while_video_was_live: Option<bool>,
}

impl ChatMessage {
    /// Creates a bare text message, mostly useful for tests and fixtures.
    pub fn text(message_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            timestamp: None,
            message: Some(text.into()),
            message_type: MessageType::TextMessage,
            time_in_seconds: None,
            time_text: None,
            author: None,
            reactions: None,
            attachments: Vec::new(),
            in_reply_to: None,
            message_url: None,
            message_dialect: None,
            number_of_edits: None,
            community_moderation_state: None,
            upvote_downvote_total: None,
            written_while_video_was_live: None,
        }
    }

    /// Number of ancestors in the reply chain.
    pub fn reply_depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.in_reply_to.as_deref();
        while let Some(parent) = current {
            depth += 1;
            current = parent.in_reply_to.as_deref();
        }
        depth
    }
}
