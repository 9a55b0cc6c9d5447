//! Output records and response shaping.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// One output record: always a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputRecord(Map<String, Value>);

impl OutputRecord {
    /// Wrap an API value. Objects are kept as-is; anything else is stored
    /// under `"value"`.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                Self(map)
            }
        }
    }

    /// `{ "success": true }`
    pub fn success() -> Self {
        Self::from_value(json!({ "success": true }))
    }

    /// `{ "error": <message> }`
    pub fn error(message: impl Into<String>) -> Self {
        Self::from_value(json!({ "error": message.into() }))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for OutputRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// One record per array element, or a single record for anything else.
pub fn records_from_response(response: Value) -> Vec<OutputRecord> {
    match response {
        Value::Array(items) => items.into_iter().map(OutputRecord::from_value).collect(),
        other => vec![OutputRecord::from_value(other)],
    }
}

/// Search endpoints wrap results as `{ "ok": .., "data": [..] }`.
///
/// Returns the `data` array when there is one, else the response unchanged.
pub fn unwrap_data_envelope(response: Value) -> Value {
    match response {
        Value::Object(mut map) if map.get("data").is_some_and(Value::is_array) => {
            map.remove("data").unwrap_or_default()
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_object_values_are_wrapped() {
        assert_eq!(
            OutputRecord::from_value(json!("text")).into_value(),
            json!({ "value": "text" })
        );
        assert_eq!(
            OutputRecord::from_value(Value::Null).into_value(),
            json!({ "value": null })
        );
    }

    #[test]
    fn test_array_response_yields_one_record_per_element() {
        let records = records_from_response(json!([{ "id": 1 }, { "id": 2 }]));
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("id"), Some(&json!(2)));

        assert!(records_from_response(json!([])).is_empty());
        assert_eq!(records_from_response(json!({ "id": 3 })).len(), 1);
    }

    #[test]
    fn test_unwrap_data_envelope() {
        assert_eq!(
            unwrap_data_envelope(json!({ "ok": true, "data": [{ "id": 1 }] })),
            json!([{ "id": 1 }])
        );
        assert_eq!(unwrap_data_envelope(json!([{ "id": 1 }])), json!([{ "id": 1 }]));
        assert_eq!(
            unwrap_data_envelope(json!({ "ok": false, "data": null })),
            json!({ "ok": false, "data": null })
        );
        assert_eq!(
            unwrap_data_envelope(json!({ "data": { "id": 1 } })),
            json!({ "data": { "id": 1 } })
        );
    }

    #[test]
    fn test_error_and_success_records() {
        assert_eq!(OutputRecord::success().into_value(), json!({ "success": true }));
        assert_eq!(
            OutputRecord::error("boom").into_value(),
            json!({ "error": "boom" })
        );
    }
}
