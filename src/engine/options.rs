//! Engine configuration

use std::sync::Arc;
use std::time::Duration;
use serde_json::Value;
use crate::error::Error;
use crate::middleware::Middlewares;
use crate::task::{InMemoryTaskStore, TaskStore};
use crate::types::CapabilitySet;
use crate::validator::SchemaValidator;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(1);

/// Builds an [`Engine`](crate::engine::Engine) by declaring capabilities,
/// plugging in a task store, validator and middleware, and setting timeout
/// and error-handling policy — consumed once by [`Engine::new`].
pub struct EngineOptions {
    pub(crate) capabilities: CapabilitySet,
    pub(crate) enforce_strict_capabilities: bool,
    pub(crate) validator: Option<Arc<dyn SchemaValidator>>,
    pub(crate) task_store: Arc<dyn TaskStore>,
    pub(crate) middlewares: Middlewares,
    pub(crate) request_timeout: Duration,
    pub(crate) max_total_timeout: Option<Duration>,
    pub(crate) debounce_window: Duration,
    pub(crate) on_error: Option<Arc<dyn Fn(Error) + Send + Sync>>,
    pub(crate) on_protocol_error: Option<Arc<dyn Fn(Error) + Send + Sync>>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            capabilities: CapabilitySet::new(),
            enforce_strict_capabilities: true,
            validator: None,
            task_store: Arc::new(InMemoryTaskStore::new()),
            middlewares: Middlewares::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_total_timeout: None,
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
            on_error: None,
            on_protocol_error: None,
        }
    }
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a local capability at a dot-separated path, e.g.
    /// `"tools.listChanged"`.
    pub fn with_capability(mut self, path: &str, value: Value) -> Self {
        self.capabilities.set(path, value);
        self
    }

    /// When `true` (the default), asserting a peer capability that was
    /// never negotiated during `initialize` fails the call with
    /// [`ErrorCode::CapabilityError`](crate::error::ErrorCode::CapabilityError)
    /// instead of proceeding optimistically.
    pub fn with_strict_capabilities(mut self, enforce: bool) -> Self {
        self.enforce_strict_capabilities = enforce;
        self
    }

    /// Installs a JSON Schema validator used to check outbound task results
    /// and other schema-bearing payloads.
    pub fn with_validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Replaces the default in-memory [`TaskStore`].
    pub fn with_task_store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.task_store = store;
        self
    }

    /// Sets the soft per-request timeout, reset by progress notifications.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the hard ceiling no amount of progress can push a request past.
    pub fn with_max_total_timeout(mut self, timeout: Duration) -> Self {
        self.max_total_timeout = Some(timeout);
        self
    }

    /// Sets how long the debouncer waits before flushing a coalesced
    /// notification.
    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }

    /// Installs a callback invoked whenever a registered handler returns an
    /// error.
    pub fn on_error(mut self, callback: impl Fn(Error) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Installs a callback invoked on wire-level protocol violations
    /// (malformed messages, unresolvable response ids).
    pub fn on_protocol_error(mut self, callback: impl Fn(Error) + Send + Sync + 'static) -> Self {
        self.on_protocol_error = Some(Arc::new(callback));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn it_builds_with_declared_capabilities() {
        let options = EngineOptions::new().with_capability("tools.listChanged", json!(true));
        assert!(options.capabilities.has("tools.listChanged"));
    }

    #[test]
    fn it_defaults_to_strict_capabilities() {
        assert!(EngineOptions::new().enforce_strict_capabilities);
    }
}
