//! Normalizes parsed values into the closed scalar set of [`CellValue`].
//!
//! Sanitizing never fails. Unknown shapes degrade to text, and the UI-element
//! marker degrades to a fixed placeholder (table and export) or to null (chart).

use serde_json::Value as JsonValue;

use crate::data::{CellValue, RawRecord, Record};

pub const ELEMENT_PLACEHOLDER: &str = "[React Element]";

const ELEMENT_MARKER_KEY: &str = "$$typeof";

/// Which consumer the sanitized record is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SanitizeTarget {
    #[default]
    Display,
    Chart,
}

pub fn sanitize(raw: RawRecord, target: SanitizeTarget) -> Record {
    raw.into_iter()
        .map(|(key, value)| (key, sanitize_value(value, target)))
        .collect()
}

pub fn sanitize_value(value: JsonValue, target: SanitizeTarget) -> CellValue {
    match value {
        JsonValue::Null => CellValue::Null,
        JsonValue::String(s) if s.is_empty() => CellValue::Null,
        JsonValue::String(s) => CellValue::Text(s),
        JsonValue::Bool(b) => CellValue::Text(b.to_string()),
        JsonValue::Number(n) => match n.as_f64() {
            Some(f) if f.is_finite() => CellValue::Number(f),
            _ => CellValue::Text(n.to_string()),
        },
        JsonValue::Object(map) if map.contains_key(ELEMENT_MARKER_KEY) => match target {
            SanitizeTarget::Display => CellValue::Text(ELEMENT_PLACEHOLDER.to_string()),
            SanitizeTarget::Chart => CellValue::Null,
        },
        other => CellValue::Text(other.to_string()),
    }
}
