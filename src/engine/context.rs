//! Inbound request and notification context

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use crate::engine::Engine;
use crate::error::Error;
use crate::types::RequestId;

/// Everything a handler needs about the inbound request it's answering,
/// plus a way to talk back to the peer while it's still working.
pub struct RequestContext {
    pub id: RequestId,
    pub method: String,
    pub params: Option<Value>,

    /// The task this request belongs to, if it was dispatched as part of
    /// task-augmented execution rather than directly.
    pub related_task: Option<String>,

    cancellation: CancellationToken,
    engine: Engine,
}

impl RequestContext {
    pub(crate) fn new(
        id: RequestId,
        method: String,
        params: Option<Value>,
        related_task: Option<String>,
        cancellation: CancellationToken,
        engine: Engine,
    ) -> Self {
        Self { id, method, params, related_task, cancellation, engine }
    }

    /// True once `notifications/cancelled` named this request's id. Never
    /// set by a `tasks/cancel` call against a task this request spawned —
    /// the two cancellation paths are independent.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Resolves once this request is cancelled. Handlers doing long-running
    /// work should race this against their own progress.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await
    }

    /// Sends a request to the peer and awaits its response.
    pub async fn request(&self, method: impl Into<String>, params: Option<Value>) -> Result<Value, Error> {
        self.engine.request(method, params).await
    }

    /// Sends a fire-and-forget notification to the peer, stamped with this
    /// request's related task id if it has one.
    pub fn notify(&self, method: impl Into<String>, params: Option<Value>) {
        let params = match (&self.related_task, params) {
            (Some(task_id), params) => {
                let mut params = params.unwrap_or_else(|| serde_json::json!({}));
                if let Some(obj) = params.as_object_mut() {
                    obj.insert("_meta".into(), crate::task::TaskEngine::stamp(task_id));
                }
                Some(params)
            }
            (None, params) => params,
        };
        self.engine.notify(method, params);
    }
}
