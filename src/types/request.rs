//! A JSON-RPC request

use std::fmt;
use serde::{Serialize, Deserialize};
use crate::types::task::TaskMetadata;

/// A unique identifier for a request. Must be a string or number and unique
/// within the connection for as long as a response is outstanding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

impl Default for RequestId {
    #[inline]
    fn default() -> RequestId {
        Self::String("(no id)".into())
    }
}

impl fmt::Display for RequestId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::String(str) => write!(f, "{str}"),
            RequestId::Number(num) => write!(f, "{num}"),
        }
    }
}

/// A request in the JSON-RPC protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// JSON-RPC protocol version.
    ///
    /// > Note: always 2.0.
    pub jsonrpc: String,

    /// Name of the method to invoke.
    pub method: String,

    /// Optional parameters for the method.
    pub params: Option<serde_json::Value>,

    /// Request identifier.
    pub id: RequestId,

    /// Top-level `task` field: present when the requestor asks the receiver
    /// to run this request as a long-running task instead of answering it
    /// directly. Absent for ordinary request/response exchanges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskMetadata>,
}

impl Request {
    /// Creates a new request.
    pub fn new(method: impl Into<String>, params: Option<serde_json::Value>, id: RequestId) -> Self {
        Self {
            jsonrpc: crate::JSONRPC_VERSION.into(),
            method: method.into(),
            params,
            id,
            task: None,
        }
    }

    /// Returns the `_meta` object carried in `params`, if any.
    pub fn meta(&self) -> Option<&serde_json::Value> {
        self.params.as_ref()?.get("_meta")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_defaults_to_no_id() {
        assert_eq!(RequestId::default().to_string(), "(no id)");
    }

    #[test]
    fn it_serializes_request_id_untagged() {
        assert_eq!(serde_json::to_string(&RequestId::Number(1)).unwrap(), "1");
        assert_eq!(serde_json::to_string(&RequestId::String("a".into())).unwrap(), "\"a\"");
    }

    #[test]
    fn it_reads_meta_from_params() {
        let req = Request::new(
            "tools/call",
            Some(serde_json::json!({ "_meta": { "progressToken": 1 } })),
            RequestId::Number(1),
        );
        assert_eq!(req.meta().unwrap()["progressToken"], 1);
    }

    #[test]
    fn it_has_no_task_by_default() {
        let req = Request::new("ping", None, RequestId::Number(1));
        assert!(req.task.is_none());
    }
}
