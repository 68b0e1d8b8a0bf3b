//! Test data builders for creating record streams

use serde_json::{Map, Number, Value};

/// Builder for one JSON record line
#[derive(Default)]
pub struct RecordBuilder {
    fields: Map<String, Value>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, value: f64) -> Self {
        let number = Number::from_f64(value).unwrap_or_else(|| Number::from(0));
        self.fields.insert(name.to_string(), Value::Number(number));
        self
    }

    pub fn text_field(mut self, name: &str, value: &str) -> Self {
        self.fields
            .insert(name.to_string(), Value::String(value.to_string()));
        self
    }

    pub fn bool_field(mut self, name: &str, value: bool) -> Self {
        self.fields.insert(name.to_string(), Value::Bool(value));
        self
    }

    /// Render as one newline-delimited record
    pub fn build(self) -> String {
        format!("{}\n", Value::Object(self.fields))
    }
}

/// Render a whole stream of single-channel records
pub fn single_channel_stream(name: &str, values: &[f64]) -> String {
    values
        .iter()
        .map(|v| RecordBuilder::new().field(name, *v).build())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = RecordBuilder::new()
            .field("temp", 21.5)
            .text_field("state", "armed")
            .build();

        assert_eq!(record, "{\"temp\":21.5,\"state\":\"armed\"}\n");
    }

    #[test]
    fn test_single_channel_stream() {
        let stream = single_channel_stream("v", &[1.0, 2.0]);
        assert_eq!(stream, "{\"v\":1.0}\n{\"v\":2.0}\n");
    }
}
