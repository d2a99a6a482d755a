//! The peer-neutral protocol engine
//!
//! [`Engine`] multiplexes outbound requests awaiting a response and inbound
//! requests awaiting a handler over one [`Transport`]. It does not know
//! whether it's the side that initiated the connection or the side that
//! accepted it — both peers run the same engine, register handlers for the
//! methods they answer, and call [`Engine::request`] for the methods they
//! invoke.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::capabilities::CapabilityRegistry;
use crate::debounce::Debouncer;
use crate::error::{Error, ErrorCode};
use crate::progress::ProgressTracker;
use crate::task::TaskEngine;
use crate::types::notification::{commands as notif_commands, CancelledNotification, Notification, ProgressNotification};
use crate::types::task::{commands as task_commands, RELATED_TASK_KEY};
use crate::types::{
    CapabilitySet, ErrorDetails, ErrorResponse, Meta, Message, ProgressToken, ProgressTokenAllocator,
    RelatedTaskMetadata, Request, RequestId, Response, TaskPayload,
};
use crate::Transport;

pub use context::RequestContext;
pub use options::EngineOptions;
pub(crate) use pending::PendingRequest;

mod context;
mod options;
mod pending;

use pending::PendingTable;

type RequestHandler = Arc<dyn Fn(RequestContext) -> BoxFuture<'static, Result<Value, Error>> + Send + Sync>;
type NotificationHandler = Arc<dyn Fn(Notification, Engine) -> BoxFuture<'static, ()> + Send + Sync>;

struct Inner {
    transport: OnceLock<Arc<dyn Transport>>,
    capabilities: CapabilityRegistry,
    task_engine: TaskEngine,
    progress: ProgressTracker,
    progress_tokens: ProgressTokenAllocator,
    debouncer: Debouncer,
    pending: PendingTable,
    progress_callbacks: DashMap<ProgressToken, Arc<dyn Fn(f64, Option<f64>) + Send + Sync>>,
    request_handlers: DashMap<String, RequestHandler>,
    notification_handlers: DashMap<String, NotificationHandler>,
    middlewares: crate::middleware::Middlewares,
    inflight: DashMap<RequestId, CancellationToken>,
    pre_cancelled: DashMap<RequestId, tokio::time::Instant>,
    next_id: AtomicI64,
    strict_capabilities: bool,
    request_timeout: Duration,
    max_total_timeout: Option<Duration>,
    on_error: Option<Arc<dyn Fn(Error) + Send + Sync>>,
    on_protocol_error: Option<Arc<dyn Fn(Error) + Send + Sync>>,
}

/// A cheap, cloneable handle to the shared engine state. Every clone talks
/// to the same transport, pending table and handler registry.
#[derive(Clone)]
pub struct Engine(Arc<Inner>);

const PRE_CANCEL_TTL: Duration = Duration::from_secs(30);

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        let capabilities = CapabilityRegistry::new();
        for (key, value) in options.capabilities.as_map() {
            let _ = capabilities.declare(key, value.clone());
        }

        Self(Arc::new(Inner {
            transport: OnceLock::new(),
            capabilities,
            task_engine: TaskEngine::new(options.task_store),
            progress: ProgressTracker::new(),
            progress_tokens: ProgressTokenAllocator::new(),
            debouncer: Debouncer::new(options.debounce_window),
            pending: PendingTable::default(),
            progress_callbacks: DashMap::new(),
            request_handlers: DashMap::new(),
            notification_handlers: DashMap::new(),
            middlewares: options.middlewares,
            inflight: DashMap::new(),
            pre_cancelled: DashMap::new(),
            next_id: AtomicI64::new(1),
            strict_capabilities: options.enforce_strict_capabilities,
            request_timeout: options.request_timeout,
            max_total_timeout: options.max_total_timeout,
            on_error: options.on_error,
            on_protocol_error: options.on_protocol_error,
        }))
    }

    #[cfg(test)]
    pub(crate) fn middlewares_for_test(&self) -> crate::middleware::Middlewares {
        self.0.middlewares.clone()
    }

    /// Wires a transport to this engine and starts its read loop. May only
    /// be called once per engine.
    pub async fn connect(&self, transport: impl Transport + 'static) -> Result<(), Error> {
        let transport: Arc<dyn Transport> = Arc::new(transport);

        let engine = self.clone();
        transport.on_message(Box::new(move |value| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.handle_message(value).await });
        }));

        self.0
            .transport
            .set(transport.clone())
            .map_err(|_| Error::new(ErrorCode::StateError, "engine is already connected"))?;

        transport.start().await
    }

    /// Closes the underlying transport and tears down everything in
    /// flight: every pending outbound request fails with
    /// [`ErrorCode::StateError`], every inbound request's cancellation
    /// token fires so handlers awaiting [`RequestContext::cancelled`] wake
    /// up, and any notification still buffered in the debouncer is
    /// discarded rather than sent.
    pub async fn close(&self) -> Result<(), Error> {
        let result = match self.0.transport.get() {
            Some(transport) => transport.close().await,
            None => Ok(()),
        };

        self.0.pending.fail_all(ErrorDetails {
            code: ErrorCode::StateError,
            message: "transport closed".into(),
            data: None,
        });
        for entry in self.0.inflight.iter() {
            entry.value().cancel();
        }
        self.0.inflight.clear();
        self.0.debouncer.discard();

        result
    }

    /// Registers the handler invoked for inbound requests with this method
    /// name. Replaces any previously registered handler for the same name.
    pub fn set_request_handler<F>(&self, method: impl Into<String>, handler: F)
    where
        F: Fn(RequestContext) -> BoxFuture<'static, Result<Value, Error>> + Send + Sync + 'static,
    {
        self.0.request_handlers.insert(method.into(), Arc::new(handler));
    }

    /// Registers the handler invoked for inbound notifications with this
    /// method name.
    pub fn set_notification_handler<F>(&self, method: impl Into<String>, handler: F)
    where
        F: Fn(Notification, Engine) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        self.0.notification_handlers.insert(method.into(), Arc::new(handler));
    }

    /// Records the peer's negotiated capabilities, typically called from
    /// whichever side's `initialize` handling completes the handshake.
    pub fn negotiate(&self, remote: CapabilitySet) {
        self.0.capabilities.negotiate(remote);
    }

    /// This engine's own declared capabilities, to advertise during
    /// `initialize`.
    pub fn local_capabilities(&self) -> CapabilitySet {
        self.0.capabilities.local()
    }

    /// Fails with [`ErrorCode::CapabilityError`] if strict enforcement is on
    /// and the peer never declared `path`. A no-op when strict enforcement
    /// is disabled.
    pub fn require_capability(&self, path: &str) -> Result<(), Error> {
        if !self.0.strict_capabilities {
            return Ok(());
        }
        self.0.capabilities.require(path)
    }

    /// Sends a request to the peer and awaits its response, subject to the
    /// engine's configured soft/hard timeouts.
    pub async fn request(&self, method: impl Into<String>, params: Option<Value>) -> Result<Value, Error> {
        self.request_inner(method.into(), params, None).await
    }

    /// Sends a request to the peer with a progress token attached, invoking
    /// `on_progress` for every `notifications/progress` update that
    /// references it until the request settles.
    pub async fn request_with_progress<F>(
        &self,
        method: impl Into<String>,
        mut params: Option<Value>,
        on_progress: F,
    ) -> Result<Value, Error>
    where
        F: Fn(f64, Option<f64>) + Send + Sync + 'static,
    {
        let token = self.0.progress_tokens.allocate();
        let value = params.get_or_insert_with(|| serde_json::json!({}));
        if let Some(obj) = value.as_object_mut() {
            let meta = obj.entry("_meta").or_insert_with(|| serde_json::json!({}));
            if let Some(meta) = meta.as_object_mut() {
                meta.insert("progressToken".into(), serde_json::json!(token.0));
            }
        }

        self.0.progress_callbacks.insert(token, Arc::new(on_progress));
        let result = self.request_inner(method.into(), params, Some(token)).await;
        self.0.progress_callbacks.remove(&token);
        result
    }

    async fn request_inner(
        &self,
        method: String,
        params: Option<Value>,
        progress_token: Option<ProgressToken>,
    ) -> Result<Value, Error> {
        let id = RequestId::Number(self.0.next_id.fetch_add(1, Ordering::Relaxed));
        let request = Request::new(method, params, id.clone());

        let (tx, rx) = oneshot::channel();
        self.0.pending.insert(id.clone(), PendingRequest::new(tx, None, progress_token));
        if let Some(token) = progress_token {
            self.0.progress.register(token, self.0.max_total_timeout);
        }

        self.send(Message::Request(request)).await?;

        // A progress token resets the soft deadline on every update, bounded
        // by the hard ceiling; without one, the soft deadline alone applies
        // since there's nothing that could push it out.
        let request_timeout = self.0.request_timeout;
        let deadline: BoxFuture<'_, ()> = match progress_token {
            Some(token) => Box::pin(async move {
                self.0.progress.wait_for_timeout(token, request_timeout).await;
            }),
            None => Box::pin(tokio::time::sleep(request_timeout)),
        };
        tokio::pin!(deadline);

        tokio::select! {
            result = rx => {
                if let Some(token) = progress_token {
                    self.0.progress.unregister(token);
                }
                result
                    .map_err(|_| Error::new(ErrorCode::InternalError, "engine dropped before responding"))?
                    .map_err(|details| Error::new(details.code, details.message))
            }
            _ = &mut deadline => {
                self.0.pending.remove(&id);
                if let Some(token) = progress_token {
                    self.0.progress.unregister(token);
                }
                Err(Error::new(ErrorCode::RequestTimeout, format!("request {id} timed out")))
            }
        }
    }

    /// Sends a fire-and-forget notification to the peer, coalescing it with
    /// the debouncer if it's eligible.
    pub fn notify(&self, method: impl Into<String>, params: Option<Value>) {
        let notification = Notification::new(method, params);
        let engine = self.clone();
        let sink: Arc<dyn Fn(Notification) + Send + Sync> = Arc::new(move |notification| {
            let engine = engine.clone();
            tokio::spawn(async move {
                let _ = engine.send(Message::Notification(notification)).await;
            });
        });
        self.0.debouncer.offer(notification, sink);
    }

    async fn send(&self, message: Message) -> Result<(), Error> {
        let transport = self
            .0
            .transport
            .get()
            .ok_or_else(|| Error::new(ErrorCode::StateError, "engine is not connected"))?;
        let value = serde_json::to_value(message)?;
        transport.send(value).await
    }

    async fn handle_message(&self, value: Value) {
        let message: Message = match serde_json::from_value(value) {
            Ok(message) => message,
            Err(err) => {
                self.report_protocol_error(Error::from(err));
                return;
            }
        };

        match message {
            Message::Request(request) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(logger = "conduit-mcp", "received: {:?}", request);

                self.clone().dispatch_request(request).await
            }
            Message::Response(response) => {
                if !self.0.pending.resolve(&response.id, response.result) {
                    self.report_protocol_error(Error::new(
                        ErrorCode::ProtocolError,
                        format!("response for unknown request id {}", response.id),
                    ));
                }
            }
            Message::ErrorResponse(response) => match response.id {
                Some(id) => {
                    if !self.0.pending.reject(&id, response.error) {
                        self.report_protocol_error(Error::new(
                            ErrorCode::ProtocolError,
                            format!("error response for unknown request id {id}"),
                        ));
                    }
                }
                None => self.report_protocol_error(Error::new(
                    ErrorCode::ProtocolError,
                    response.error.message,
                )),
            },
            Message::Notification(notification) => self.handle_notification(notification).await,
        }
    }

    async fn handle_notification(&self, notification: Notification) {
        match notification.method.as_str() {
            notif_commands::PROGRESS => {
                if let Some(params) = &notification.params {
                    if let Ok(progress) = serde_json::from_value::<ProgressNotification>(params.clone()) {
                        self.0.progress.on_progress(progress.progress_token);
                        if let Some(callback) = self.0.progress_callbacks.get(&progress.progress_token) {
                            callback(progress.progress, progress.total);
                        }
                    }
                }
            }
            notif_commands::CANCELLED => {
                if let Some(params) = &notification.params {
                    if let Ok(cancelled) = serde_json::from_value::<CancelledNotification>(params.clone()) {
                        self.cancel_inflight(cancelled.request_id);
                    }
                }
            }
            method => {
                if let Some(handler) = self.0.notification_handlers.get(method) {
                    let handler = handler.clone();
                    handler(notification, self.clone()).await;
                }
            }
        }
    }

    /// Cancels the in-flight inbound request `id`, buffering the
    /// cancellation briefly if it arrives before the request itself does.
    /// Never touches any task the request may have spawned — task
    /// cancellation only ever happens through `tasks/cancel`.
    fn cancel_inflight(&self, id: RequestId) {
        match self.0.inflight.get(&id) {
            Some(token) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(logger = "conduit-mcp", "request {} cancelled", id);

                token.cancel()
            }
            None => {
                #[cfg(feature = "tracing")]
                tracing::trace!(logger = "conduit-mcp", "cancellation for {} arrived before its request", id);

                self.0.pre_cancelled.insert(id, tokio::time::Instant::now());
                self.evict_stale_pre_cancellations();
            }
        }
    }

    fn evict_stale_pre_cancellations(&self) {
        let now = tokio::time::Instant::now();
        self.0.pre_cancelled.retain(|_, seen| now.duration_since(*seen) < PRE_CANCEL_TTL);
    }

    async fn dispatch_request(self, request: Request) {
        let id = request.id.clone();
        let cancellation = CancellationToken::new();
        if self.0.pre_cancelled.remove(&id).is_some() {
            cancellation.cancel();
        }
        self.0.inflight.insert(id.clone(), cancellation.clone());

        let related_task = Meta::<RelatedTaskMetadata>::extract(request.meta(), RELATED_TASK_KEY)
            .map(|meta| meta.into_inner().id);

        let outcome = if let Some(task_meta) = request.task {
            self.dispatch_task_augmented(request.method, request.params, id.clone(), task_meta).await
        } else if TaskEngine::owns(&request.method) {
            self.dispatch_task_protocol(&request.method, request.params, id.clone()).await
        } else {
            self.invoke_handler(request.method.clone(), request.params.clone(), id.clone(), related_task)
                .await
                .map(|value| Response::new(id.clone(), value))
                .map_err(|error| ErrorResponse::new(id.clone(), error))
        };

        self.0.inflight.remove(&id);
        let message = match outcome {
            Ok(response) => Message::Response(response),
            Err(error_response) => Message::ErrorResponse(error_response),
        };
        if let Err(err) = self.send(message).await {
            #[cfg(feature = "tracing")]
            tracing::error!(logger = "conduit-mcp", error = %err, "error sending response");

            self.report_protocol_error(err);
        }
    }

    /// Looks up the registered handler for `method`, runs it through the
    /// middleware pipeline, and returns its raw result — used both for the
    /// direct request/response path and for the background execution of a
    /// task-augmented request, which has no wire response of its own to
    /// produce.
    async fn invoke_handler(
        &self,
        method: String,
        params: Option<Value>,
        id: RequestId,
        related_task: Option<String>,
    ) -> Result<Value, Error> {
        let Some(handler) = self.0.request_handlers.get(&method).map(|h| h.clone()) else {
            return Err(Error::new(ErrorCode::MethodNotFound, format!("no handler for {method}")));
        };

        let terminal: crate::middleware::Next = {
            let handler = handler.clone();
            let engine = self.clone();
            Arc::new(move |mw_ctx: crate::middleware::MwContext| {
                let handler = handler.clone();
                let engine = engine.clone();
                Box::pin(async move {
                    let id = mw_ctx.request.id.clone();
                    let related_task = mw_ctx.related_task.clone();
                    let cancellation = engine.0.inflight.get(&id).map(|t| t.clone()).unwrap_or_default();
                    let ctx = RequestContext::new(id.clone(), mw_ctx.request.method.clone(), mw_ctx.request.params, related_task, cancellation, engine.clone());
                    match handler(ctx).await {
                        Ok(value) => Ok(Response::new(id, value)),
                        Err(error) => {
                            if let Some(on_error) = &engine.0.on_error {
                                on_error(Error::new(error.code, error.to_string()));
                            }
                            Err(ErrorResponse::new(id, error))
                        }
                    }
                })
            })
        };

        let mw_ctx = crate::middleware::MwContext::new(
            Request { jsonrpc: crate::JSONRPC_VERSION.into(), method, params, id, task: None },
            related_task,
            self.clone(),
        );
        self.0
            .middlewares
            .compose(terminal)(mw_ctx)
            .await
            .map(|response| response.result)
            .map_err(|error_response| Error::new(error_response.error.code, error_response.error.message))
    }

    /// Creates a task for a request the peer asked to run asynchronously,
    /// acknowledges it immediately, then runs the handler in the
    /// background and resolves the task when it finishes.
    async fn dispatch_task_augmented(
        &self,
        method: String,
        params: Option<Value>,
        original_id: RequestId,
        task_meta: crate::types::TaskMetadata,
    ) -> Result<Response, ErrorResponse> {
        let task = self.0.task_engine.create(task_meta).await;

        #[cfg(feature = "tracing")]
        tracing::debug!(logger = "conduit-mcp", "created task {} for {}", task.id, method);

        let ack = crate::types::task::CreateTaskResult::new(task.clone());
        let value = serde_json::to_value(&ack)
            .map_err(|err| ErrorResponse::new(original_id.clone(), Error::from(err)))?;

        let engine = self.clone();
        let task_id = task.id.clone();
        tokio::spawn(async move {
            let outcome = engine
                .invoke_handler(method, params, RequestId::String(task_id.clone()), Some(task_id.clone()))
                .await;
            match outcome {
                Ok(value) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(logger = "conduit-mcp", "task {} completed", task_id);

                    let _ = engine.0.task_engine.complete(&task_id, TaskPayload(value)).await;
                }
                Err(error) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(logger = "conduit-mcp", "task {} failed: {}", task_id, error);

                    let details = ErrorDetails::from(error);
                    let _ = engine
                        .0
                        .task_engine
                        .fail(&task_id, TaskPayload(serde_json::to_value(&details).unwrap_or(Value::Null)))
                        .await;
                }
            }
            engine.notify(task_commands::STATUS, Some(TaskEngine::stamp(&task_id)));
        });

        Ok(Response::new(original_id, value))
    }

    async fn dispatch_task_protocol(&self, method: &str, params: Option<Value>, id: RequestId) -> Result<Response, ErrorResponse> {
        let params = params.unwrap_or(Value::Null);
        let result = self.run_task_protocol(method, params).await;
        result
            .map(|value| Response::new(id.clone(), value))
            .map_err(|error| ErrorResponse::new(id, error))
    }

    async fn run_task_protocol(&self, method: &str, params: Value) -> Result<Value, Error> {
        let engine = &self.0.task_engine;
        match method {
            task_commands::GET => {
                let params = serde_json::from_value(params)?;
                let task = engine.get(params).await?;
                Ok(serde_json::to_value(task)?)
            }
            task_commands::LIST => {
                let params = serde_json::from_value(params)?;
                let result = engine.list(params).await;
                Ok(serde_json::to_value(result)?)
            }
            task_commands::CANCEL => {
                let params = serde_json::from_value(params)?;
                let task = engine.cancel(params).await?;
                Ok(serde_json::to_value(task)?)
            }
            task_commands::RESULT => {
                let params = serde_json::from_value(params)?;
                let payload = engine.result(params).await?;
                Ok(payload.into_inner())
            }
            other => Err(Error::new(ErrorCode::MethodNotFound, format!("not a task method: {other}"))),
        }
    }

    fn report_protocol_error(&self, error: Error) {
        #[cfg(feature = "tracing")]
        tracing::error!(logger = "conduit-mcp", error = %error, "protocol error");

        if let Some(callback) = &self.0.on_protocol_error {
            callback(error);
        }
    }
}
