//! Tolerant field deserializers.
//!
//! The platform sends identifiers and counters as strings in one payload
//! and as numbers in the next, and flags as `0`/`1` as often as booleans.
//! These helpers accept either form and map anything unusable to `None`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize a value that could be either a string or a number into a String.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Ok(String::new()),
    }
}

/// Deserialize an optional string or number, mapping anything else to `None`.
pub(crate) fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        _ => Ok(None),
    }
}

/// Deserialize an optional unsigned counter that may arrive as a numeric string.
pub(crate) fn opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        Some(Value::Number(n)) => Ok(n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))),
        Some(Value::String(s)) => Ok(s.trim().parse().ok()),
        _ => Ok(None),
    }
}

/// Deserialize an optional signed integer that may arrive as a numeric string.
pub(crate) fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        Some(Value::Number(n)) => Ok(n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.round() as i64)
        })),
        Some(Value::String(s)) => {
            let s = s.trim();
            Ok(s.parse().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.round() as i64)
            }))
        }
        _ => Ok(None),
    }
}

/// Deserialize an optional float that may arrive as a numeric string.
pub(crate) fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => Ok(s.trim().parse::<f64>().ok().filter(|f| f.is_finite())),
        _ => Ok(None),
    }
}

/// Deserialize an optional flag sent as a bool, `0`/`1`, or their string forms.
pub(crate) fn opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(Value::Number(n)) => Ok(match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        }),
        Some(Value::String(s)) => Ok(match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "super::string_or_number")]
        id: String,
        #[serde(default, deserialize_with = "super::opt_u64")]
        count: Option<u64>,
        #[serde(default, deserialize_with = "super::opt_i64")]
        score: Option<i64>,
        #[serde(default, deserialize_with = "super::opt_f64")]
        offset: Option<f64>,
        #[serde(default, deserialize_with = "super::opt_bool")]
        flag: Option<bool>,
    }

    #[test]
    fn accepts_numeric_ids() {
        let sample: Sample = serde_json::from_str(r#"{"id": 42, "count": "7"}"#).unwrap();
        assert_eq!(sample.id, "42");
        assert_eq!(sample.count, Some(7));
    }

    #[test]
    fn rejects_nothing_on_odd_counters() {
        let sample: Sample = serde_json::from_str(r#"{"id": "a", "count": {"x": 1}}"#).unwrap();
        assert_eq!(sample.id, "a");
        assert_eq!(sample.count, None);
    }

    #[test]
    fn scalars_accept_string_and_numeric_forms() {
        let sample: Sample = serde_json::from_str(
            r#"{"id": "a", "score": "-3", "offset": "12.5", "flag": 1}"#,
        )
        .unwrap();
        assert_eq!(sample.score, Some(-3));
        assert_eq!(sample.offset, Some(12.5));
        assert_eq!(sample.flag, Some(true));

        let sample: Sample =
            serde_json::from_str(r#"{"id": "a", "score": 4.0, "flag": "false"}"#).unwrap();
        assert_eq!(sample.score, Some(4));
        assert_eq!(sample.flag, Some(false));
    }

    #[test]
    fn unusable_scalars_become_none() {
        let sample: Sample = serde_json::from_str(
            r#"{"id": "a", "score": "lots", "offset": [1], "flag": "maybe"}"#,
        )
        .unwrap();
        assert_eq!(sample.score, None);
        assert_eq!(sample.offset, None);
        assert_eq!(sample.flag, None);

        let sample: Sample = serde_json::from_str(r#"{"id": "a", "flag": 2}"#).unwrap();
        assert_eq!(sample.flag, None);
    }
}
