//! Query parameters attached to GET requests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Ordered query parameters.
///
/// Keys are kept sorted so that two parameter sets with the same content
/// always serialize to the same string, which makes them usable in cache
/// keys. A JSON `null` value stands for an absent parameter and is skipped
/// when the parameters are appended to a URL.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Sets `key` only when `value` is `Some`.
    pub fn with_opt<V: Into<Value>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    pub fn with_page(self, page: u64, limit: u64) -> Self {
        self.with("page", page).with("limit", limit)
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Returns the parameter rendered as a string, if present.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get(key).map(render_value)
    }

    /// Returns the parameter as an unsigned integer, accepting numeric strings.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match self.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the defined (non-null) parameters as rendered pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, String)> {
        self.0
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.as_str(), render_value(v)))
    }

    /// Appends the defined parameters to `url`, percent-encoding as needed.
    pub fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        if self.pairs().next().is_none() {
            return url;
        }
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in self.pairs() {
                query.append_pair(key, &value);
            }
        }
        url
    }

    /// Stable JSON rendering used in cache keys (`{}` when empty).
    pub fn cache_fragment(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
