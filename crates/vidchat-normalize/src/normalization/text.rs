//! Text and image helpers shared by the normalizers.

use serde_json::{Map, Value};

/// Base URL for site-relative asset paths.
pub const HOMEPAGE: &str = "https://www.facebook.com";

/// Convert a `CamelCase` type name to `snake_case`.
///
/// Runs of capitals are kept together, so `HTTPLink` becomes `http_link`.
///
/// # Examples
///
/// ```
/// use vidchat_normalize::camel_case_split;
///
/// assert_eq!(camel_case_split("VideoTipJarPayment"), "video_tip_jar_payment");
/// assert_eq!(camel_case_split("User"), "user");
/// ```
pub fn camel_case_split(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// Render an offset in seconds as `m:ss` or `h:mm:ss`.
///
/// Fractions are truncated. Negative offsets get a leading `-`.
pub fn seconds_to_time(seconds: f64) -> String {
    if !seconds.is_finite() {
        return String::new();
    }
    let total = seconds.abs().trunc() as u64;
    let sign = if seconds < 0.0 && total > 0 { "-" } else { "" };
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{sign}{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{sign}{minutes}:{secs:02}")
    }
}

/// Summary line for a star gift.
pub fn star_gift_text(quantity: u64) -> String {
    let plural = if quantity == 1 { "" } else { "s" };
    format!("Sent {quantity} Star{plural}")
}

/// Upgrade protocol-relative URLs to `https:`.
pub fn absolute_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url.to_string()
    }
}

/// Resolve a site asset path against [`HOMEPAGE`].
pub fn asset_url(path: &str) -> String {
    if path.starts_with("http") || path.starts_with("//") {
        absolute_url(path)
    } else if path.starts_with('/') {
        format!("{HOMEPAGE}{path}")
    } else {
        format!("{HOMEPAGE}/{path}")
    }
}

/// Build an image descriptor object. Unknown dimensions are left out.
pub fn image_value(url: &str, width: Option<u64>, height: Option<u64>, name: Option<&str>) -> Value {
    let mut image = Map::new();
    image.insert("url".to_string(), Value::String(absolute_url(url)));
    if let Some(width) = width {
        image.insert("width".to_string(), Value::from(width));
    }
    if let Some(height) = height {
        image.insert("height".to_string(), Value::from(height));
    }
    if let Some(name) = name {
        image.insert("name".to_string(), Value::String(name.to_string()));
    }
    Value::Object(image)
}

/// Read an id that may arrive as a string or a number.
pub(crate) fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a non-negative counter that may arrive as a string or a number.
pub(crate) fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
