//! Wire types shared by both peer roles
//!
//! The engine is peer-neutral: there is no separate "client types" vs
//! "server types" split. A [`Message`] is always one of [`Request`],
//! [`Response`], [`ErrorResponse`] or [`Notification`] regardless of which
//! side of the connection produced it.

use serde::{Deserialize, Serialize};
use crate::types::notification::Notification;

pub use capabilities::CapabilitySet;
pub use cursor::{Cursor, Page, Pagination};
pub use meta::Meta;
pub use progress::{ProgressToken, ProgressTokenAllocator};
pub use request::{Request, RequestId};
pub use response::{ErrorDetails, ErrorResponse, IntoResponse, Response};
pub use task::{RelatedTaskMetadata, Task, TaskMetadata, TaskPayload, TaskStatus};

pub mod capabilities;
pub mod cursor;
pub mod meta;
pub mod notification;
pub mod progress;
pub mod request;
pub mod response;
pub mod task;

/// A JSON-RPC message received from or sent to the peer.
///
/// Untagged: which variant a given JSON object deserializes into is decided
/// structurally (presence of `method`, `result` vs `error`), exactly as the
/// wire protocol distinguishes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    Request(Request),
    Response(Response),
    ErrorResponse(ErrorResponse),
    Notification(Notification),
}

/// Describes the name and version of a peer implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    pub version: String,
}

impl Default for Implementation {
    fn default() -> Self {
        Self {
            name: crate::SDK_NAME.into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// Params of the `initialize` handshake request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeRequestParams {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,

    pub capabilities: Option<CapabilitySet>,

    #[serde(rename = "clientInfo")]
    pub peer_info: Option<Implementation>,
}

/// Result of the `initialize` handshake request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,

    pub capabilities: CapabilitySet,

    #[serde(rename = "serverInfo")]
    pub peer_info: Implementation,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl Message {
    #[inline]
    pub fn is_request(&self) -> bool {
        matches!(self, Message::Request(_))
    }

    #[inline]
    pub fn is_response(&self) -> bool {
        matches!(self, Message::Response(_) | Message::ErrorResponse(_))
    }

    #[inline]
    pub fn is_notification(&self) -> bool {
        matches!(self, Message::Notification(_))
    }

    /// Returns the message's id. Notifications have no id of their own.
    pub fn id(&self) -> Option<RequestId> {
        match self {
            Message::Request(req) => Some(req.id.clone()),
            Message::Response(resp) => Some(resp.id.clone()),
            Message::ErrorResponse(resp) => resp.id.clone(),
            Message::Notification(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_distinguishes_message_variants() {
        let req = Message::Request(Request::new("ping", None, RequestId::Number(1)));
        assert!(req.is_request());
        assert!(!req.is_response());

        let notification = Message::Notification(Notification::new("notifications/initialized", None));
        assert!(notification.is_notification());
        assert!(notification.id().is_none());
    }

    #[test]
    fn it_serializes_untagged_request_and_response_distinctly() {
        let req = Message::Request(Request::new("ping", None, RequestId::Number(1)));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["method"], "ping");

        let resp = Message::Response(Response::new(RequestId::Number(1), serde_json::json!({})));
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("method").is_none());
        assert!(json.get("result").is_some());
    }
}
