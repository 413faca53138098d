//! DASH manifest duration.
//!
//! Finished streams carry an MPD manifest whose root element declares the
//! total length as an ISO 8601 duration:
//!
//! ```xml
//! <MPD mediaPresentationDuration="PT1H2M3.5S" ...>
//! ```

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{ClientError, Result};

const SECONDS_PER_MINUTE: f64 = 60.0;
const SECONDS_PER_HOUR: f64 = 3600.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Total presentation duration in seconds.
pub fn presentation_duration(xml: &str) -> Result<f64> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(element) | Event::Empty(element)) => {
                if element.local_name().as_ref() != b"MPD" {
                    continue;
                }
                for attr in element.attributes() {
                    let attr = attr.map_err(|e| ClientError::Manifest(e.to_string()))?;
                    if attr.key.local_name().as_ref() == b"mediaPresentationDuration" {
                        let value = std::str::from_utf8(&attr.value)
                            .map_err(|e| ClientError::Manifest(e.to_string()))?;
                        return parse_iso8601_duration(value).ok_or_else(|| {
                            ClientError::Manifest(format!("invalid duration '{value}'"))
                        });
                    }
                }
                return Err(ClientError::Manifest(
                    "MPD has no mediaPresentationDuration".to_string(),
                ));
            }
            Ok(Event::Eof) => {
                return Err(ClientError::Manifest("no MPD element".to_string()));
            }
            Err(e) => return Err(ClientError::Manifest(e.to_string())),
            Ok(_) => {}
        }
    }
}

/// Parse an ISO 8601 duration (`PnDTnHnMnS`, `PnW`) into seconds.
///
/// Years and months are not accepted; their length is ambiguous.
pub fn parse_iso8601_duration(value: &str) -> Option<f64> {
    let rest = value.trim().strip_prefix('P')?;
    if rest.is_empty() {
        return None;
    }

    let mut total = 0.0;
    let mut in_time = false;
    let mut number = String::new();
    let mut saw_component = false;

    for c in rest.chars() {
        match c {
            'T' if !in_time && number.is_empty() => in_time = true,
            '0'..='9' | '.' | ',' => number.push(if c == ',' { '.' } else { c }),
            unit => {
                let amount: f64 = number.parse().ok()?;
                number.clear();
                let scale = match (in_time, unit) {
                    (false, 'W') => 7.0 * SECONDS_PER_DAY,
                    (false, 'D') => SECONDS_PER_DAY,
                    (true, 'H') => SECONDS_PER_HOUR,
                    (true, 'M') => SECONDS_PER_MINUTE,
                    (true, 'S') => 1.0,
                    _ => return None,
                };
                total += amount * scale;
                saw_component = true;
            }
        }
    }

    (number.is_empty() && saw_component).then_some(total)
}
