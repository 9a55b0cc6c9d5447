//! Query-string and request-body shaping.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Returns true for values that count as "not supplied".
fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Query parameters for a single request, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Query(BTreeMap<String, Value>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Render as `k=v&k2=v2` with both sides percent-encoded.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| {
                let rendered = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                format!(
                    "{}={}",
                    urlencoding::encode(k),
                    urlencoding::encode(&rendered)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Query {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Keep only the parameters that were actually supplied.
///
/// `null` and the empty string are dropped; `false` and `0` are kept.
pub fn build_query<K, I>(params: I) -> Query
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Value)>,
{
    params
        .into_iter()
        .filter(|(_, value)| !is_absent(value))
        .collect()
}

/// Insert `value` into `target` unless it is `null` or an empty string.
pub fn set_if_defined(target: &mut Map<String, Value>, key: &str, value: Option<&Value>) {
    if let Some(value) = value
        && !is_absent(value)
    {
        target.insert(key.to_string(), value.clone());
    }
}
