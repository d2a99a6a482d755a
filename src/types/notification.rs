//! JSON-RPC notifications

use serde::{Serialize, Deserialize};

pub use progress::{ProgressNotification, CancelledNotification};

pub mod progress;

/// Reserved notification method names the engine interprets itself instead
/// of dispatching to a registered handler.
pub mod commands {
    /// Progress update for an in-flight request. See [`super::ProgressNotification`].
    pub const PROGRESS: &str = "notifications/progress";

    /// Requests cancellation of an in-flight request. See [`super::CancelledNotification`].
    pub const CANCELLED: &str = "notifications/cancelled";

    /// Sent once the peer has processed the `initialize` response.
    pub const INITIALIZED: &str = "notifications/initialized";
}

/// A notification which does not expect a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// JSON-RPC protocol version.
    ///
    /// > Note: always 2.0.
    pub jsonrpc: String,

    /// Name of the notification method.
    pub method: String,

    /// Optional parameters for the notification.
    pub params: Option<serde_json::Value>,
}

impl Notification {
    /// Creates a new [`Notification`].
    #[inline]
    pub fn new(method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: crate::JSONRPC_VERSION.into(),
            method: method.into(),
            params,
        }
    }

    /// Returns `true` if this notification carries no params and no
    /// `_meta.relatedTask` — the class the debouncer is allowed to coalesce.
    pub fn is_debounce_eligible(&self) -> bool {
        match &self.params {
            None => true,
            Some(value) => {
                value.as_object().is_some_and(|o| o.is_empty())
                    && self.related_task_id().is_none()
            }
        }
    }

    /// Returns the related task id stamped in `_meta`, if any.
    pub fn related_task_id(&self) -> Option<&str> {
        self.params
            .as_ref()?
            .get("_meta")?
            .get(crate::types::task::RELATED_TASK_KEY)?
            .get("taskId")?
            .as_str()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    #[test]
    fn it_creates_new_notification() {
        let notification = Notification::new("test", Some(json!({ "param": "value" })));
        assert_eq!(notification.jsonrpc, "2.0");
        assert_eq!(notification.method, "test");
    }

    #[test]
    fn it_is_debounce_eligible_without_params() {
        let n = Notification::new(commands::PROGRESS, None);
        assert!(n.is_debounce_eligible());
    }

    #[test]
    fn it_is_not_debounce_eligible_with_params() {
        let n = Notification::new("notifications/message", Some(json!({ "level": "info" })));
        assert!(!n.is_debounce_eligible());
    }

    #[test]
    fn it_is_not_debounce_eligible_with_related_task() {
        let n = Notification::new(
            "notifications/tasks/status",
            Some(json!({ "_meta": { "io.modelcontextprotocol/related-task": { "taskId": "t1" } } })),
        );
        assert!(!n.is_debounce_eligible());
        assert_eq!(n.related_task_id(), Some("t1"));
    }
}
