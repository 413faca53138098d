//! Message normalization, including recursive reply parents.

use serde_json::{Map, Value};
use vidchat_model::ChatMessage;

use super::text::{id_string, seconds_to_time};
use crate::engine::{NormalizeContext, prune_empty, remap_node};
use crate::error::{RecordError, TransformError, json_kind};
use crate::types::Entity;

/// Message-level output fields that belong to the author: (message key,
/// author key).
const AUTHOR_FIELDS: [(&str, &str); 5] = [
    ("is_author_banned", "is_banned"),
    ("is_author_original_poster", "is_original_poster"),
    ("is_author_bot", "is_bot"),
    ("is_author_non_coworker", "is_non_coworker"),
    ("author_badges", "badges"),
];

/// Normalize a reply parent.
///
/// An empty parent means "not a reply". Nesting is capped at the context's
/// maximum depth and a parent that repeats an ancestor id is rejected.
pub fn parse_reply(
    value: &Value,
    ctx: &mut NormalizeContext<'_>,
) -> Result<Option<Value>, TransformError> {
    let node = value.as_object().ok_or(TransformError::TypeMismatch {
        expected: "object",
        found: json_kind(value),
    })?;
    if node.is_empty() {
        return Ok(None);
    }
    if ctx.depth() > ctx.max_depth() {
        return Err(TransformError::DepthExceeded(ctx.max_depth()));
    }
    let id = node
        .get("id")
        .and_then(id_string)
        .ok_or(TransformError::MissingField("id"))?;
    if ctx.is_ancestor(&id) {
        return Err(TransformError::Cycle(id));
    }
    Ok(Some(Value::Object(normalize_message_map(node, ctx))))
}

/// Rebuild a raw message node into the output shape.
pub fn normalize_message_map(
    node: &Map<String, Value>,
    ctx: &mut NormalizeContext<'_>,
) -> Map<String, Value> {
    let id = node.get("id").and_then(id_string).unwrap_or_default();
    ctx.enter(id);
    let mut info = remap_node(node, ctx.table(Entity::Message), &[], ctx);
    ctx.leave();

    fold_author(&mut info);

    let seconds = info.get("time_in_seconds").and_then(|value| match value {
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|s| s.is_finite()),
        other => other.as_f64(),
    });
    if let Some(seconds) = seconds {
        info.insert("time_text".to_string(), Value::String(seconds_to_time(seconds)));
    }

    let has_text = info
        .get("message")
        .and_then(Value::as_str)
        .is_some_and(|text| !text.is_empty());
    if !has_text {
        info.remove("message");
    }
    let message_type = if has_text {
        "text_message"
    } else {
        "attachment_message"
    };
    info.insert(
        "message_type".to_string(),
        Value::String(message_type.to_string()),
    );

    prune_empty(&mut info, Entity::Message);
    info
}

/// Move moderation flags and badges into the nested author object.
fn fold_author(info: &mut Map<String, Value>) {
    let mut author = match info.remove("author") {
        Some(Value::Object(author)) => author,
        _ => Map::new(),
    };
    for (source, target) in AUTHOR_FIELDS {
        if let Some(value) = info.remove(source) {
            author.insert(target.to_string(), value);
        }
    }
    prune_empty(&mut author, Entity::Author);
    if !author.is_empty() {
        info.insert("author".to_string(), Value::Object(author));
    }
}

/// Normalize one raw message node into a typed [`ChatMessage`].
pub fn normalize_message(
    raw: &Value,
    ctx: &mut NormalizeContext<'_>,
) -> Result<ChatMessage, RecordError> {
    let node = raw.as_object().ok_or(RecordError::NotAnObject(json_kind(raw)))?;
    let id = node
        .get("id")
        .and_then(id_string)
        .ok_or(RecordError::MissingId)?;
    let info = normalize_message_map(node, ctx);
    serde_json::from_value(Value::Object(info)).map_err(|source| RecordError::Model { id, source })
}
