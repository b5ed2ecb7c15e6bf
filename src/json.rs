// Lenient field access for printing API objects.
//
// The API documents its objects loosely and fields come and go between
// content types, so the printer never trusts a field to be present. Every
// accessor here returns a placeholder naming the field path instead of
// failing.

use serde_json::{Map, Value};

/// Placeholder printed in place of a field that is missing or not a scalar.
pub fn empty_marker(path: &str) -> String {
    format!("<no proper {}>", path)
}

/// Renders a scalar JSON value the way it should appear in printed output.
/// Returns `None` for `null`, objects and arrays.
pub fn scalar_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Gets `object[field]` as a string, or the empty marker for `field`.
pub fn field_as_string(object: &Map<String, Value>, field: &str) -> String {
    object
        .get(field)
        .and_then(scalar_as_string)
        .unwrap_or_else(|| empty_marker(field))
}

/// Gets `object[field][subfield]` as a string, or the empty marker for
/// `field->subfield`.
pub fn nested_field_as_string(object: &Map<String, Value>, field: &str, subfield: &str) -> String {
    object
        .get(field)
        .and_then(Value::as_object)
        .and_then(|inner| inner.get(subfield))
        .and_then(scalar_as_string)
        .unwrap_or_else(|| empty_marker(&format!("{}->{}", field, subfield)))
}
