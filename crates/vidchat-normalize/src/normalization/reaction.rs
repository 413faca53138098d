//! Reaction aggregates from a feedback node.

use serde_json::{Map, Value};

use crate::engine::NormalizeContext;
use crate::error::{TransformError, json_kind};

/// Build `{reaction_types, total_count, total_count_reduced}`.
///
/// Returns nothing when the node has no reaction edges.
pub fn parse_feedback(
    value: &Value,
    ctx: &mut NormalizeContext<'_>,
) -> Result<Option<Value>, TransformError> {
    let feedback = value.as_object().ok_or(TransformError::TypeMismatch {
        expected: "object",
        found: json_kind(value),
    })?;

    let Some(edges) = feedback
        .get("top_reactions")
        .and_then(|top| top.get("edges"))
        .and_then(Value::as_array)
        .filter(|edges| !edges.is_empty())
    else {
        return Ok(None);
    };

    let mut reaction_types = Vec::with_capacity(edges.len());
    for edge in edges {
        let Some(node) = edge.get("node").and_then(Value::as_object) else {
            ctx.diagnostics().record_missing_field("feedback.edge", "node");
            continue;
        };
        let mut reaction = Map::new();
        copy(&mut reaction, "key", node.get("key"));
        copy(&mut reaction, "id", node.get("id"));
        copy(&mut reaction, "name", node.get("reaction_type"));
        copy(&mut reaction, "count", edge.get("reaction_count"));
        reaction_types.push(Value::Object(reaction));
    }

    let mut reactions = Map::new();
    reactions.insert("reaction_types".to_string(), Value::Array(reaction_types));
    let reactors = feedback.get("reactors");
    copy(
        &mut reactions,
        "total_count",
        reactors.and_then(|r| r.get("count")),
    );
    copy(
        &mut reactions,
        "total_count_reduced",
        reactors.and_then(|r| r.get("count_reduced")),
    );
    Ok(Some(Value::Object(reactions)))
}

fn copy(target: &mut Map<String, Value>, key: &str, value: Option<&Value>) {
    if let Some(value) = value.filter(|v| !v.is_null()) {
        target.insert(key.to_string(), value.clone());
    }
}
