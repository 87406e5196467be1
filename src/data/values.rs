//! Loose comparison of submitted and bound values
//!
//! Submitted form data is text while bound data keeps its native types, so a
//! checkbox whose checked value is `"1"` must match a bound `true` or `1`.

use std::cmp::Ordering;

use serde_json::Value;

/// Text form of a scalar as a transport would submit it
///
/// Containers have no scalar text and yield `None`.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some(String::new()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Scalar equality after text normalisation
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (scalar_text(a), scalar_text(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a == b,
    }
}

/// Whether `needle` is selected by `haystack`
///
/// A sequence selects each of its members, an object selects its values and a
/// scalar selects only itself.
pub fn loosely_contains(haystack: &Value, needle: &Value) -> bool {
    match haystack {
        Value::Array(items) => items.iter().any(|item| loose_eq(item, needle)),
        Value::Object(map) => map.values().any(|item| loose_eq(item, needle)),
        scalar => loose_eq(scalar, needle),
    }
}

/// Ordering used when sorting records by a property
pub fn compare(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => scalar_text(a)
            .unwrap_or_default()
            .cmp(&scalar_text(b).unwrap_or_default()),
    }
}
