//! Per-item parameter access.
//!
//! An input item is a JSON object carrying `resource`, `operation` and the
//! operation's own fields. Optional groups (`additionalFields`,
//! `updateFields`) are nested objects that default to empty.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ForgeError, Result};

/// Parameters of one input item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemParameters(Map<String, Value>);

impl ItemParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any previous value.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// A required string parameter.
    pub fn get_str(&self, name: &str) -> Result<&str> {
        match self.0.get(name) {
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(ForgeError::parameter(
                name,
                format!("expected a string, got {other}"),
            )),
            None => Err(ForgeError::parameter(name, "is required")),
        }
    }

    /// A string parameter, or `default` when absent.
    pub fn get_string_or(&self, name: &str, default: &str) -> Result<String> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(default.to_string()),
            Some(_) => self.get_str(name).map(str::to_string),
        }
    }

    /// A required non-negative integer parameter.
    ///
    /// Numeric strings are accepted since hosts often pass numbers as text.
    pub fn get_u64(&self, name: &str) -> Result<u64> {
        let value = self
            .0
            .get(name)
            .ok_or_else(|| ForgeError::parameter(name, "is required"))?;
        match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or_else(|| {
            ForgeError::parameter(name, format!("expected a non-negative integer, got {value}"))
        })
    }

    /// A required identifier rendered for use in a path.
    pub fn get_id_string(&self, name: &str) -> Result<String> {
        self.get_u64(name).map(|id| id.to_string())
    }

    /// A nested group of optional fields; absent or `null` reads as empty.
    pub fn collection(&self, name: &str) -> Result<Map<String, Value>> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(other) => Err(ForgeError::parameter(
                name,
                format!("expected an object, got {other}"),
            )),
        }
    }
}

impl From<Map<String, Value>> for ItemParameters {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for ItemParameters {
    type Error = ForgeError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ForgeError::parameter(
                "item",
                format!("expected an object, got {other}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> ItemParameters {
        ItemParameters::try_from(value).expect("object")
    }

    #[test]
    fn test_get_str_missing_and_mistyped() {
        let p = params(json!({ "owner": "acme", "repo": 5 }));
        assert_eq!(p.get_str("owner").expect("owner"), "acme");

        let err = p.get_str("title").expect_err("missing");
        assert_eq!(err.to_string(), "Parameter title: is required");

        let err = p.get_str("repo").expect_err("mistyped");
        assert!(matches!(err, ForgeError::Parameter { ref name, .. } if name == "repo"));
    }

    #[test]
    fn test_get_string_or_defaults() {
        let p = params(json!({ "ref": Value::Null }));
        assert_eq!(p.get_string_or("ref", "main").expect("default"), "main");
        assert_eq!(p.get_string_or("missing", "").expect("default"), "");
    }

    #[test]
    fn test_get_u64_accepts_numbers_and_numeric_strings() {
        let p = params(json!({ "a": 42, "b": "7", "c": -1, "d": "x" }));
        assert_eq!(p.get_u64("a").expect("a"), 42);
        assert_eq!(p.get_id_string("b").expect("b"), "7");
        assert!(p.get_u64("c").is_err());
        assert!(p.get_u64("d").is_err());
        assert!(p.get_u64("e").is_err());
    }

    #[test]
    fn test_collection_defaults_to_empty() {
        let p = params(json!({ "updateFields": { "name": "x" }, "bad": [] }));
        assert_eq!(p.collection("updateFields").expect("map")["name"], "x");
        assert!(p.collection("additionalFields").expect("empty").is_empty());
        assert!(p.collection("bad").is_err());
    }

    #[test]
    fn test_non_object_item_is_rejected() {
        assert!(ItemParameters::try_from(json!([1, 2])).is_err());
    }
}
