//! A JSON object wrapper with merge-patch semantics: setting a key to
//! explicit `null` in a patch deletes that key, rather than storing a null
//! value. Grounded on `data/json_object.go`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON object, stored as an ordered map of string keys to JSON values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonObject {
    content: Map<String, Value>,
}

impl JsonObject {
    pub fn new() -> Self {
        JsonObject::default()
    }

    pub fn from_map(content: Map<String, Value>) -> Self {
        JsonObject { content }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.content.get(key)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.content.get(key).and_then(Value::as_str)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.content.get(key).and_then(Value::as_i64)
    }

    pub fn default_int(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.content.insert(key.into(), value);
    }

    pub fn delete(&mut self, key: &str) {
        self.content.remove(key);
    }

    /// Applies `other` as a merge patch: keys whose value is `null` in
    /// `other` are deleted from `self`; every other key is overwritten.
    /// This exact null-deletes-key rule must be preserved — it is the
    /// mechanism document updates use to remove fields.
    pub fn update_with(&mut self, other: &JsonObject) {
        for (key, value) in &other.content {
            if value.is_null() {
                self.delete(key);
            } else {
                self.set(key.clone(), value.clone());
            }
        }
    }

    pub fn copy(&self) -> JsonObject {
        self.clone()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(pairs: &[(&str, Value)]) -> JsonObject {
        let mut o = JsonObject::new();
        for (k, v) in pairs {
            o.set(*k, v.clone());
        }
        o
    }

    #[test]
    fn update_with_overwrites_non_null_values() {
        let mut base = obj(&[("name", json!("alice")), ("age", json!(30))]);
        let patch = obj(&[("age", json!(31))]);
        base.update_with(&patch);
        assert_eq!(base.get_int("age"), Some(31));
        assert_eq!(base.get_string("name"), Some("alice"));
    }

    #[test]
    fn update_with_null_deletes_the_key() {
        let mut base = obj(&[("name", json!("alice")), ("bio", json!("hi"))]);
        let patch = obj(&[("bio", Value::Null)]);
        base.update_with(&patch);
        assert_eq!(base.get("bio"), None);
        assert_eq!(base.get_string("name"), Some("alice"));
    }

    #[test]
    fn update_with_adds_new_keys() {
        let mut base = obj(&[("name", json!("alice"))]);
        let patch = obj(&[("age", json!(5))]);
        base.update_with(&patch);
        assert_eq!(base.get_int("age"), Some(5));
    }

    #[test]
    fn default_int_falls_back_when_absent() {
        let o = JsonObject::new();
        assert_eq!(o.default_int("missing", 7), 7);
    }
}
