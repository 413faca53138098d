//! Leaf transforms: unit conversion, case folding and small extractions.

use serde_json::Value;

use super::text::{self, image_value};
use crate::engine::NormalizeContext;
use crate::error::{TransformError, json_kind};

type Outcome = Result<Option<Value>, TransformError>;

const MICROS_PER_SECOND: i64 = 1_000_000;

fn mismatch(expected: &'static str, found: &Value) -> TransformError {
    TransformError::TypeMismatch {
        expected,
        found: json_kind(found),
    }
}

fn expect_object<'v>(
    value: &'v Value,
) -> Result<&'v serde_json::Map<String, Value>, TransformError> {
    value.as_object().ok_or_else(|| mismatch("object", value))
}

/// Seconds to microseconds. Accepts integers, floats and numeric strings.
pub fn multiply_by_million(value: &Value, _ctx: &mut NormalizeContext<'_>) -> Outcome {
    to_micros(value).map(|micros| Some(Value::from(micros)))
}

fn to_micros(value: &Value) -> Result<i64, TransformError> {
    match value {
        Value::Number(n) => {
            if let Some(seconds) = n.as_i64() {
                seconds
                    .checked_mul(MICROS_PER_SECOND)
                    .ok_or(TransformError::Overflow)
            } else {
                let seconds = n.as_f64().ok_or(TransformError::Overflow)?;
                float_micros(seconds)
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(seconds) = trimmed.parse::<i64>() {
                seconds
                    .checked_mul(MICROS_PER_SECOND)
                    .ok_or(TransformError::Overflow)
            } else {
                let seconds = trimmed
                    .parse::<f64>()
                    .map_err(|_| mismatch("number", value))?;
                float_micros(seconds)
            }
        }
        other => Err(mismatch("number", other)),
    }
}

fn float_micros(seconds: f64) -> Result<i64, TransformError> {
    let micros = (seconds * 1_000_000.0).round();
    if micros.is_finite() && micros >= i64::MIN as f64 && micros < i64::MAX as f64 {
        Ok(micros as i64)
    } else {
        Err(TransformError::Overflow)
    }
}

/// `count` of an edit-history node.
pub fn edit_count(value: &Value, _ctx: &mut NormalizeContext<'_>) -> Outcome {
    let node = expect_object(value)?;
    Ok(node.get("count").and_then(text::as_count).map(Value::from))
}

/// `source_dialect_name` of a translatability node.
pub fn dialect_name(value: &Value, _ctx: &mut NormalizeContext<'_>) -> Outcome {
    let node = expect_object(value)?;
    Ok(node
        .get("source_dialect_name")
        .filter(|name| name.is_string())
        .cloned())
}

/// Text of a body node. Plain strings pass through.
pub fn body_text(value: &Value, _ctx: &mut NormalizeContext<'_>) -> Outcome {
    match value {
        Value::String(_) => Ok(Some(value.clone())),
        Value::Object(node) => Ok(node.get("text").filter(|t| t.is_string()).cloned()),
        other => Err(mismatch("text node", other)),
    }
}

pub fn lowercase(value: &Value, _ctx: &mut NormalizeContext<'_>) -> Outcome {
    let s = value.as_str().ok_or_else(|| mismatch("string", value))?;
    Ok(Some(Value::String(s.to_lowercase())))
}

pub fn camel_case_split(value: &Value, _ctx: &mut NormalizeContext<'_>) -> Outcome {
    let s = value.as_str().ok_or_else(|| mismatch("string", value))?;
    Ok(Some(Value::String(text::camel_case_split(s))))
}

/// `{uri, width, height}` to an image descriptor.
pub fn image(value: &Value, _ctx: &mut NormalizeContext<'_>) -> Outcome {
    let node = expect_object(value)?;
    let url = node
        .get("uri")
        .and_then(Value::as_str)
        .ok_or(TransformError::MissingField("uri"))?;
    let width = node.get("width").and_then(text::as_count);
    let height = node.get("height").and_then(text::as_count);
    Ok(Some(image_value(url, width, height, None)))
}

/// `uri` of a picture node.
pub fn uri(value: &Value, _ctx: &mut NormalizeContext<'_>) -> Outcome {
    let node = expect_object(value)?;
    Ok(node
        .get("uri")
        .and_then(Value::as_str)
        .map(|url| Value::String(text::absolute_url(url))))
}

/// Replay comments carry `{time, text}` timestamp nodes in seconds.
pub fn legacy_timestamp(value: &Value, _ctx: &mut NormalizeContext<'_>) -> Outcome {
    match value {
        Value::Object(node) => {
            let time = node.get("time").ok_or(TransformError::MissingField("time"))?;
            to_micros(time).map(|micros| Some(Value::from(micros)))
        }
        other => to_micros(other).map(|micros| Some(Value::from(micros))),
    }
}

/// A single thumbnail URL as a one-element image list.
pub fn thumbnail(value: &Value, _ctx: &mut NormalizeContext<'_>) -> Outcome {
    let url = value.as_str().ok_or_else(|| mismatch("string", value))?;
    if url.is_empty() {
        return Ok(None);
    }
    Ok(Some(Value::Array(vec![image_value(url, None, None, None)])))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::registry::TransformRegistry;
    use crate::types::RuleSet;

    fn apply(
        f: fn(&Value, &mut NormalizeContext<'_>) -> Outcome,
        value: Value,
    ) -> Outcome {
        let rules = RuleSet::builtin();
        let registry = TransformRegistry::standard();
        let mut diagnostics = Diagnostics::new();
        let mut ctx = NormalizeContext::new(&rules, &registry, &mut diagnostics);
        f(&value, &mut ctx)
    }

    #[test]
    fn converts_seconds_to_micros() {
        assert_eq!(
            apply(multiply_by_million, json!(1_600_000_000)),
            Ok(Some(json!(1_600_000_000_000_000i64)))
        );
        assert_eq!(apply(multiply_by_million, json!(1.5)), Ok(Some(json!(1_500_000))));
        assert_eq!(apply(multiply_by_million, json!("12")), Ok(Some(json!(12_000_000))));
        assert_eq!(
            apply(multiply_by_million, json!(i64::MAX)),
            Err(TransformError::Overflow)
        );
        assert!(matches!(
            apply(multiply_by_million, json!(true)),
            Err(TransformError::TypeMismatch { expected: "number", found: "bool" })
        ));
    }

    #[test]
    fn extracts_nested_scalars() {
        assert_eq!(apply(edit_count, json!({"count": 2})), Ok(Some(json!(2))));
        assert_eq!(apply(edit_count, json!({})), Ok(None));
        assert_eq!(
            apply(dialect_name, json!({"source_dialect_name": "English"})),
            Ok(Some(json!("English")))
        );
        assert_eq!(apply(body_text, json!({"text": "hi"})), Ok(Some(json!("hi"))));
        assert_eq!(apply(body_text, json!("plain")), Ok(Some(json!("plain"))));
        assert_eq!(apply(uri, json!({"uri": "//cdn/p.jpg"})), Ok(Some(json!("https://cdn/p.jpg"))));
    }

    #[test]
    fn folds_case() {
        assert_eq!(apply(lowercase, json!("FEMALE")), Ok(Some(json!("female"))));
        assert_eq!(
            apply(camel_case_split, json!("VideoTipJarPayment")),
            Ok(Some(json!("video_tip_jar_payment")))
        );
        assert!(apply(lowercase, json!(2)).is_err());
    }

    #[test]
    fn builds_images() {
        assert_eq!(
            apply(image, json!({"uri": "https://cdn/s.png", "width": 120, "height": 120})),
            Ok(Some(json!({"url": "https://cdn/s.png", "width": 120, "height": 120})))
        );
        assert_eq!(apply(image, json!({"width": 1})), Err(TransformError::MissingField("uri")));
        assert_eq!(
            apply(thumbnail, json!("https://cdn/t.jpg")),
            Ok(Some(json!([{"url": "https://cdn/t.jpg"}])))
        );
    }

    #[test]
    fn reads_legacy_timestamps() {
        assert_eq!(
            apply(legacy_timestamp, json!({"time": 1_500_000_000, "text": "June"})),
            Ok(Some(json!(1_500_000_000_000_000i64)))
        );
        assert_eq!(apply(legacy_timestamp, json!(3)), Ok(Some(json!(3_000_000))));
    }
}
