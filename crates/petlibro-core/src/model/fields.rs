// Lenient readers over the raw property bag. The vendor is inconsistent
// about types (numbers arrive as strings, flags as 0/1), so each reader
// accepts the shapes seen in practice and yields `None` otherwise.

use petlibro_api::RawFields;
use serde_json::Value;

pub(crate) fn string(fields: &RawFields, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn int(fields: &RawFields, key: &str) -> Option<i64> {
    match fields.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(float_to_int)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn float(fields: &RawFields, key: &str) -> Option<f64> {
    match fields.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn flag(fields: &RawFields, key: &str) -> Option<bool> {
    match fields.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Nested object under `key`, if present.
pub(crate) fn object<'a>(fields: &'a RawFields, key: &str) -> Option<&'a RawFields> {
    fields.get(key).and_then(Value::as_object)
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn float_to_int(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
}
