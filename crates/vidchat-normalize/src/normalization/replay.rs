//! Replay (VOD) payload expansion.
//!
//! A replay window returns entries shaped like
//! `{timeoffset, ufipayload: {comments: [..], profiles: {id: {..}}}}`.
//! Comments reference their author by id; the matching profile is joined in
//! so every comment can go through the regular message pipeline.

use serde_json::{Map, Value};

use super::text::id_string;
use crate::error::RecordError;

/// Expand one replay entry into self-contained raw message nodes.
pub fn expand_replay_entry(entry: &Value) -> Result<Vec<Value>, RecordError> {
    let ufi = entry
        .get("ufipayload")
        .and_then(Value::as_object)
        .ok_or(RecordError::MissingContainer("ufipayload"))?;
    let comments = ufi
        .get("comments")
        .and_then(Value::as_array)
        .ok_or(RecordError::MissingContainer("comments"))?;
    let profiles = ufi.get("profiles").and_then(Value::as_object);
    let offset = entry.get("timeoffset").filter(|v| v.is_number());

    Ok(comments
        .iter()
        .map(|comment| join_comment(comment, profiles, offset))
        .collect())
}

fn join_comment(
    comment: &Value,
    profiles: Option<&Map<String, Value>>,
    offset: Option<&Value>,
) -> Value {
    let Some(node) = comment.as_object() else {
        return comment.clone();
    };
    let mut node = node.clone();

    if let Some(author_id) = node.get("author").and_then(id_string) {
        let mut author = profiles
            .and_then(|profiles| profiles.get(&author_id))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        author
            .entry("id")
            .or_insert_with(|| Value::String(author_id));
        node.insert("author".to_string(), Value::Object(author));
    }

    if let Some(offset) = offset {
        node.entry("timestamp_in_video")
            .or_insert_with(|| offset.clone());
    }
    Value::Object(node)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn joins_profiles_and_offsets() {
        let entry = json!({
            "timeoffset": 42,
            "ufipayload": {
                "comments": [
                    {"id": "c1", "author": "100", "body": {"text": "first"}},
                    {"id": "c2", "author": "200", "body": {"text": "second"}, "timestamp_in_video": 43}
                ],
                "profiles": {"100": {"id": "100", "name": "Ann", "type": "user"}}
            }
        });
        let nodes = expand_replay_entry(&entry).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0]["author"], json!({"id": "100", "name": "Ann", "type": "user"}));
        assert_eq!(nodes[0]["timestamp_in_video"], 42);
        assert_eq!(nodes[1]["author"], json!({"id": "200"}));
        assert_eq!(nodes[1]["timestamp_in_video"], 43);
    }

    #[test]
    fn missing_payload_is_a_record_error() {
        let err = expand_replay_entry(&json!({"timeoffset": 1})).unwrap_err();
        assert!(matches!(err, RecordError::MissingContainer("ufipayload")));
        let err = expand_replay_entry(&json!({"ufipayload": {}})).unwrap_err();
        assert!(matches!(err, RecordError::MissingContainer("comments")));
    }
}
