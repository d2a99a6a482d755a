//! Generic, recursively-mergeable capability maps
//!
//! Unlike a fixed `ServerCapabilities`/`ClientCapabilities` struct pair, the
//! engine treats capabilities as an opaque JSON object: peers and
//! middleware layers contribute nested keys (`tools`, `tools.listChanged`,
//! an experimental namespace, …) without the core engine needing to know
//! their shape.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A set of negotiated or declared capabilities, stored as a nested JSON object.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CapabilitySet(Map<String, Value>);

impl Serialize for CapabilitySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CapabilitySet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(Map::deserialize(deserializer)?))
    }
}

impl CapabilitySet {
    /// Creates an empty capability set.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wraps an existing JSON object as a capability set.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Deep-merges `other` into `self`. Nested objects are merged key by
    /// key; any other value (including arrays) in `other` overwrites the
    /// corresponding value in `self`.
    pub fn merge(&mut self, other: &CapabilitySet) {
        Self::merge_objects(&mut self.0, &other.0);
    }

    fn merge_objects(into: &mut Map<String, Value>, from: &Map<String, Value>) {
        for (key, value) in from {
            match (into.get_mut(key), value) {
                (Some(Value::Object(existing)), Value::Object(incoming)) => {
                    Self::merge_objects(existing, incoming);
                }
                _ => {
                    into.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// Returns whether the dot-separated `path` resolves to a present,
    /// non-false, non-null value — the check a capability assertion
    /// (`has("tools.listChanged")`) performs before dispatch.
    pub fn has(&self, path: &str) -> bool {
        match self.get(path) {
            Some(Value::Bool(false)) | Some(Value::Null) | None => false,
            Some(_) => true,
        }
    }

    /// Resolves a dot-separated path to the value at that position, if any.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut node = self.0.get(segments.next()?)?;
        for segment in segments {
            node = node.get(segment)?;
        }
        Some(node)
    }

    /// Sets the value at a dot-separated path, creating intermediate objects as needed.
    pub fn set(&mut self, path: &str, value: Value) {
        let mut segments = path.split('.').peekable();
        let mut map = &mut self.0;
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                map.insert(segment.to_string(), value);
                return;
            }
            map = map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()))
                .as_object_mut()
                .expect("capability path segment is not an object");
        }
    }

    /// Returns the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for CapabilitySet {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn it_merges_nested_objects() {
        let mut a = CapabilitySet::from_map(json!({ "tools": { "listChanged": true } }).as_object().unwrap().clone());
        let b = CapabilitySet::from_map(json!({ "tools": { "call": true }, "resources": {} }).as_object().unwrap().clone());

        a.merge(&b);

        assert!(a.has("tools.listChanged"));
        assert!(a.has("tools.call"));
        assert!(a.get("resources").is_some());
    }

    #[test]
    fn it_overwrites_scalars_on_merge() {
        let mut a = CapabilitySet::from_map(json!({ "experimental": { "x": 1 } }).as_object().unwrap().clone());
        let b = CapabilitySet::from_map(json!({ "experimental": { "x": 2 } }).as_object().unwrap().clone());
        a.merge(&b);
        assert_eq!(a.get("experimental.x"), Some(&json!(2)));
    }

    #[test]
    fn it_reports_false_and_missing_as_absent() {
        let set = CapabilitySet::from_map(json!({ "tools": { "listChanged": false } }).as_object().unwrap().clone());
        assert!(!set.has("tools.listChanged"));
        assert!(!set.has("resources.subscribe"));
        assert!(set.get("tools").is_some());
    }

    #[test]
    fn it_sets_nested_paths() {
        let mut set = CapabilitySet::new();
        set.set("tools.listChanged", json!(true));
        assert!(set.has("tools.listChanged"));
    }
}
