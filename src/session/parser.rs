//! Record decoding
//!
//! Each framed record is expected to be a flat JSON object mapping channel
//! names to values, e.g. `{"temp":20.5,"rpm":1200}`. Parsing never aborts the
//! stream: a record that fails to decode is reported to the caller, logged,
//! and ingestion proceeds with the next record.

use crate::error::{Result, SerialVisError};
use serde_json::Value;

/// A decoded record: field names to raw JSON values
///
/// Iteration order is the textual order of the keys in the record, which is
/// what first-appearance channel indexing is derived from (serde_json's
/// `preserve_order` feature).
pub type ParsedRecord = serde_json::Map<String, Value>;

/// Decode one record as a JSON object
///
/// Surrounding whitespace is tolerated, so CRLF payloads framed on `"\n"`
/// still decode. Anything that is not a JSON object is an error.
pub fn parse_record(text: &str) -> Result<ParsedRecord> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| SerialVisError::Record(format!("invalid JSON: {}", e)))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(SerialVisError::Record(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

/// Coerce one field value to a sample value
///
/// Numbers map to their f64 value, booleans to 1.0/0.0, and numeric strings
/// (after trimming whitespace) to their parsed value. Everything else maps
/// to NaN, which registers the channel but is excluded from statistics.
pub fn numeric_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::Bool(true) => 1.0,
        Value::Bool(false) => 0.0,
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
