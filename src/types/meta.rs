//! A thin wrapper for values extracted from a `_meta` object

use std::ops::Deref;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Wraps a value deserialized from a key inside a `_meta` object.
#[derive(Debug, Clone)]
pub struct Meta<T>(pub T);

impl<T> Meta<T> {
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Meta<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: DeserializeOwned> Meta<T> {
    /// Looks up `key` inside a `_meta` JSON object and deserializes it as `T`.
    pub fn extract(meta: Option<&Value>, key: &str) -> Option<Self> {
        let value = meta?.get(key)?.clone();
        serde_json::from_value(value).ok().map(Meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RelatedTaskMetadata;
    use serde_json::json;

    #[test]
    fn it_extracts_related_task_from_meta() {
        let meta = json!({ "io.modelcontextprotocol/related-task": { "taskId": "t1" } });
        let related = Meta::<RelatedTaskMetadata>::extract(Some(&meta), "io.modelcontextprotocol/related-task").unwrap();
        assert_eq!(related.id, "t1");
    }

    #[test]
    fn it_returns_none_when_key_missing() {
        let meta = json!({});
        assert!(Meta::<RelatedTaskMetadata>::extract(Some(&meta), "io.modelcontextprotocol/related-task").is_none());
    }
}
