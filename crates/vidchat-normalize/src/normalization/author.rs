//! Author and identity badge normalization.

use serde_json::{Map, Value};

use super::text::{asset_url, image_value};
use crate::engine::{NormalizeContext, prune_empty, remap_node};
use crate::error::{TransformError, json_kind};
use crate::types::Entity;

/// Profile picture fields and the square size each one is rendered at,
/// largest first.
const PROFILE_PICTURES: [(&str, u64); 2] =
    [("profile_picture_depth_0", 32), ("profile_picture_depth_1", 24)];

/// Badge asset fields: (field, size, name).
const BADGE_ICONS: [(&str, u64, &str); 3] = [
    ("badge_asset", 24, "small"),
    ("information_asset", 24, "colour"),
    ("multiple_badge_asset", 36, "large"),
];

/// Run an author node through the author table and attach profile images.
pub fn parse_author(
    value: &Value,
    ctx: &mut NormalizeContext<'_>,
) -> Result<Option<Value>, TransformError> {
    let node = value.as_object().ok_or(TransformError::TypeMismatch {
        expected: "object",
        found: json_kind(value),
    })?;
    let handled: Vec<&str> = PROFILE_PICTURES.iter().map(|(key, _)| *key).collect();
    let mut author = remap_node(node, ctx.table(Entity::Author), &handled, ctx);

    let images: Vec<Value> = PROFILE_PICTURES
        .iter()
        .filter_map(|(key, size)| {
            let url = node.get(*key)?.get("uri")?.as_str()?;
            Some(image_value(url, Some(*size), Some(*size), None))
        })
        .collect();
    if !images.is_empty() {
        author.insert("images".to_string(), Value::Array(images));
    }

    prune_empty(&mut author, Entity::Author);
    Ok((!author.is_empty()).then_some(Value::Object(author)))
}

/// Identity badges with synthesized icon descriptors.
pub fn parse_badges(
    value: &Value,
    ctx: &mut NormalizeContext<'_>,
) -> Result<Option<Value>, TransformError> {
    let items = value.as_array().ok_or(TransformError::TypeMismatch {
        expected: "array",
        found: json_kind(value),
    })?;

    let mut badges = Vec::with_capacity(items.len());
    for item in items {
        let Some(item) = item.as_object() else {
            ctx.diagnostics().record_missing_field("author_badges", "badge");
            continue;
        };
        badges.push(Value::Object(parse_badge(item)));
    }
    Ok(Some(Value::Array(badges)))
}

fn parse_badge(item: &Map<String, Value>) -> Map<String, Value> {
    let mut badge = Map::new();
    for (source, target) in [
        ("text", "title"),
        ("information_title", "alternative_title"),
        ("information_description", "description"),
    ] {
        if let Some(text) = item.get(source).filter(|v| v.is_string()) {
            badge.insert(target.to_string(), text.clone());
        }
    }

    let icons: Vec<Value> = BADGE_ICONS
        .iter()
        .filter_map(|(key, size, name)| {
            let path = item.get(*key)?.as_str()?;
            Some(image_value(&asset_url(path), Some(*size), Some(*size), Some(name)))
        })
        .collect();
    if !icons.is_empty() {
        badge.insert("icons".to_string(), Value::Array(icons));
    }

    if let Some(kind) = item.get("identity_badge_type").filter(|v| v.is_string()) {
        badge.insert("type".to_string(), kind.clone());
    }
    badge
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
    fn author_images_in_fixed_order() {
        let (author, diagnostics) = run(
            parse_author,
            json!({
                "id": "100",
                "name": "Ann Example",
                "__typename": "User",
                "gender": "FEMALE",
                "profile_picture_depth_1": {"uri": "https://cdn/24.jpg"},
                "profile_picture_depth_0": {"uri": "https://cdn/32.jpg"}
            }),
        );
        assert_eq!(
            author,
            Some(json!({
                "id": "100",
                "name": "Ann Example",
                "type": "user",
                "gender": "female",
                "images": [
                    {"url": "https://cdn/32.jpg", "width": 32, "height": 32},
                    {"url": "https://cdn/24.jpg", "width": 24, "height": 24}
                ]
            }))
        );
        assert!(diagnostics.is_clean());
    }

    #[test]
    fn author_without_pictures_has_no_images() {
        let (author, _) = run(parse_author, json!({"id": "7", "name": "Bo"}));
        assert_eq!(author, Some(json!({"id": "7", "name": "Bo"})));
    }

    #[test]
    fn badge_icons_are_synthesized() {
        let (badges, _) = run(
            parse_badges,
            json!([{
                "text": "Top fan",
                "information_title": "Top fans",
                "information_description": "One of the most engaged",
                "badge_asset": "/rsrc.php/small.png",
                "information_asset": "/rsrc.php/colour.png",
                "multiple_badge_asset": "https://static.example/large.png",
                "identity_badge_type": "TOP_FAN"
            }]),
        );
        assert_eq!(
            badges,
            Some(json!([{
                "title": "Top fan",
                "alternative_title": "Top fans",
                "description": "One of the most engaged",
                "icons": [
                    {"url": "https://www.facebook.com/rsrc.php/small.png", "width": 24, "height": 24, "name": "small"},
                    {"url": "https://www.facebook.com/rsrc.php/colour.png", "width": 24, "height": 24, "name": "colour"},
                    {"url": "https://static.example/large.png", "width": 36, "height": 36, "name": "large"}
                ],
                "type": "TOP_FAN"
            }]))
        );
    }

    #[test]
    fn badge_missing_assets_keeps_the_rest() {
        let (badges, _) = run(parse_badges, json!([{"text": "Supporter"}, "bogus"]));
        assert_eq!(badges, Some(json!([{"title": "Supporter"}])));
    }
}
