//! Attachment style wrappers and their target/media nodes.

use serde_json::{Map, Value};

use super::text::{as_count, star_gift_text};
use crate::engine::{NormalizeContext, prune_empty, remap_node};
use crate::error::{TransformError, json_kind};
use crate::types::Entity;

/// Target type names with dedicated rules. Anything else is kept as a
/// partial record and counted.
pub const KNOWN_TARGET_TYPES: [&str; 3] = ["Sticker", "VideoTipJarPayment", "Page"];

/// Normalize a list of attachment style wrappers.
///
/// Wrappers without an inner `style_type_renderer.attachment` are skipped.
pub fn parse_attachment_styles(
    value: &Value,
    ctx: &mut NormalizeContext<'_>,
) -> Result<Option<Value>, TransformError> {
    let items = value.as_array().ok_or(TransformError::TypeMismatch {
        expected: "array",
        found: json_kind(value),
    })?;

    let mut attachments = Vec::with_capacity(items.len());
    for item in items {
        let Some(inner) = item
            .get("style_type_renderer")
            .and_then(|renderer| renderer.get("attachment"))
            .and_then(Value::as_object)
        else {
            ctx.diagnostics()
                .record_missing_field("attachment", "style_type_renderer.attachment");
            continue;
        };
        let mut attachment = remap_node(inner, ctx.table(Entity::Attachment), &[], ctx);
        prune_empty(&mut attachment, Entity::Attachment);
        if !attachment.is_empty() {
            attachments.push(Value::Object(attachment));
        }
    }
    Ok(Some(Value::Array(attachments)))
}

/// Normalize an attachment `target` or `media` node.
pub fn parse_attachment_info(
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

    let mut info = remap_node(node, ctx.table(Entity::AttachmentTarget), &[], ctx);
    add_gift_text(&mut info);

    let type_name = node.get("__typename").and_then(Value::as_str);
    if !type_name.is_some_and(|name| KNOWN_TARGET_TYPES.contains(&name)) {
        ctx.diagnostics()
            .record_unknown_variant(type_name.unwrap_or("<untyped>"));
    }

    prune_empty(&mut info, Entity::AttachmentTarget);
    Ok((!info.is_empty()).then_some(Value::Object(info)))
}

fn add_gift_text(info: &mut Map<String, Value>) {
    if let Some(quantity) = info.get("quantity").and_then(as_count).filter(|q| *q > 0) {
        info.insert("text".to_string(), Value::String(star_gift_text(quantity)));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::registry::TransformRegistry;
    use crate::types::RuleSet;

    fn run(
        f: fn(&Value, &mut NormalizeContext<'_>) -> Result<Option<Value>, TransformError>,
        value: Value,
    ) -> (Option<Value>, Diagnostics) {
        let rules = RuleSet::builtin();
        let registry = TransformRegistry::standard();
        let mut diagnostics = Diagnostics::new();
        let result = {
            let mut ctx = NormalizeContext::new(&rules, &registry, &mut diagnostics);
            f(&value, &mut ctx).unwrap()
        };
        (result, diagnostics)
    }

    #[test]
    fn sticker_target() {
        let (info, diagnostics) = run(
            parse_attachment_info,
            json!({
                "__typename": "Sticker",
                "id": "369239263222822",
                "label": "Like",
                "pack": {"id": "227877430692340"},
                "image": {"uri": "https://cdn/sticker.png", "width": 120, "height": 120}
            }),
        );
        assert_eq!(
            info,
            Some(json!({
                "type": "sticker",
                "id": "369239263222822",
                "label": "Like",
                "pack": {"id": "227877430692340"},
                "image": {"url": "https://cdn/sticker.png", "width": 120, "height": 120}
            }))
        );
        assert!(diagnostics.is_clean());
    }

    #[test]
    fn star_gift_gets_summary_text() {
        let (info, _) = run(
            parse_attachment_info,
            json!({"__typename": "VideoTipJarPayment", "spark_quantity": 3}),
        );
        let info = info.unwrap();
        assert_eq!(info["type"], "video_tip_jar_payment");
        assert_eq!(info["quantity"], 3);
        assert_eq!(info["text"], "Sent 3 Stars");
    }

    #[test]
    fn unknown_variant_is_partial_and_counted() {
        let (info, diagnostics) = run(
            parse_attachment_info,
            json!({"__typename": "ExternalUrl", "url": "https://l.example/x", "id": "1:2", "tracking": "{}"}),
        );
        assert_eq!(
            info,
            Some(json!({"type": "external_url", "url": "https://l.example/x", "id": "1:2"}))
        );
        assert_eq!(diagnostics.unknown_variants["ExternalUrl"], 1);
        assert_eq!(diagnostics.unknown_keys["attachment_target.tracking"], 1);
    }

    #[test]
    fn styles_unwrap_renderer_and_skip_bare_items() {
        let (attachments, diagnostics) = run(
            parse_attachment_styles,
            json!([
                {"style_type_renderer": {"attachment": {
                    "url": "https://l.example/x",
                    "source": {"text": "example.com"},
                    "media": null,
                    "target": {}
                }}},
                {"style_list": ["fallback"]}
            ]),
        );
        assert_eq!(
            attachments,
            Some(json!([{"url": "https://l.example/x", "source": "example.com"}]))
        );
        assert_eq!(
            diagnostics.missing_fields["attachment.style_type_renderer.attachment"],
            1
        );
    }
}
