//! Missing-value sanitization for outbound JSON documents.
//!
//! Trial annotations arrive from a merged tabular export and submission
//! bodies are client-controlled, so any document headed for the wire or the
//! canonical log passes through [`json_safe`] first: every non-finite
//! number anywhere in the structure becomes an explicit `null`.

use serde_json::Value;

/// Replace non-finite numbers with `null`, recursively.
///
/// Pure and total: containers are rebuilt with the same shape and ordering,
/// every other scalar passes through unchanged. Applying it twice is the
/// same as applying it once.
pub fn json_safe(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            Value::Object(map.into_iter().map(|(k, v)| (k, json_safe(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(json_safe).collect()),
        Value::Number(n) => {
            // Integer numbers are always finite; only float-backed numbers
            // can carry a NaN/infinity from upstream arithmetic.
            if n.as_f64().is_some_and(|f| !f.is_finite()) {
                Value::Null
            } else {
                Value::Number(n)
            }
        }
        other => other,
    }
}
