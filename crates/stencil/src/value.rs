//! Shared value semantics: output conversion, truthiness, loose
//! comparison, and member lookup over `serde_json::Value`.

use std::cmp::Ordering;

use serde_json::Value;

/// Converts a value to its output string.
///
/// Null and `false` print nothing, `true` prints `1`, arrays and objects
/// print their JSON representation.
pub(crate) fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Truthiness used by `if` conditions and the `default` filter: null,
/// false, numeric zero, the empty string, `"0"`, and empty collections are
/// falsy.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(a) => !a.is_empty(),
        Value::Object(m) => !m.is_empty(),
    }
}

/// Numeric view of a value: numbers directly, numeric strings by parsing.
pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Wraps an arithmetic result, collapsing whole floats back to integers.
pub(crate) fn number(f: f64) -> Value {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Value::from(f as i64)
    } else {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Loose equality: booleans compare by truthiness, numbers numerically
/// (numeric strings included), everything else structurally.
pub(crate) fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Bool(_), _) | (_, Value::Bool(_)) => is_truthy(a) == is_truthy(b),
        (Value::Number(_), _) | (_, Value::Number(_)) => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
        _ => a == b,
    }
}

/// Ordering for comparisons and `sort`: numeric when both sides read as
/// numbers, otherwise by output string.
pub(crate) fn compare(a: &Value, b: &Value) -> Ordering {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => display(a).cmp(&display(b)),
    }
}

/// Member access: object key lookup, or array index when the name parses
/// as one.
pub(crate) fn member<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(name),
        Value::Array(arr) => name.parse::<usize>().ok().and_then(|i| arr.get(i)),
        _ => None,
    }
}
