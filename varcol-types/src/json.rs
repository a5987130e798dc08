//! Adapter from parsed `serde_json` values to [`Field`]s.
//!
//! This is the field-parser seam: text parsing stays in `serde_json`, and the
//! column crates only ever see [`Field`]s. Integers that fit `i64` map to
//! `Int64`; larger positive integers map to `UInt64`; everything else numeric
//! maps to `Float64`.

use serde_json::Value;

use crate::field::Field;

/// Converts a parsed JSON value into a [`Field`].
pub fn field_from_json(value: &Value) -> Field {
    match value {
        Value::Null => Field::Null,
        Value::Bool(v) => Field::Bool(*v),
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Field::Int64(v)
            } else if let Some(v) = n.as_u64() {
                Field::UInt64(v)
            } else {
                Field::Float64(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => Field::String(s.clone()),
        Value::Array(items) => Field::Array(items.iter().map(field_from_json).collect()),
        Value::Object(entries) => Field::Object(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), field_from_json(value)))
                .collect(),
        ),
    }
}

impl From<&Value> for Field {
    fn from(value: &Value) -> Self {
        field_from_json(value)
    }
}
