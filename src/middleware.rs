//! Engine middleware pipeline
//!
//! Middleware wraps inbound request dispatch: a chain of functions each
//! decide whether to short-circuit with their own [`Response`]/[`ErrorResponse`]
//! or call `next` to continue toward the registered handler. Unlike a
//! client/server SDK with separate tool/prompt/resource call sites, a
//! peer-neutral engine only has one dispatch path, so there is one pipeline
//! rather than several domain-specific ones — middleware that only cares
//! about a particular method filters on [`MwContext::method`] itself.

use std::sync::Arc;
use futures_util::future::BoxFuture;
use crate::engine::Engine;
use crate::types::{Request, Response, ErrorResponse};

pub(crate) mod make_fn;
pub mod wrap;

const DEFAULT_MW_CAPACITY: usize = 8;

/// Current middleware invocation context: the inbound request plus a handle
/// back to the engine for sending requests/notifications mid-flight.
pub struct MwContext {
    pub request: Request,
    pub related_task: Option<String>,
    pub(crate) engine: Engine,
}

impl MwContext {
    pub(crate) fn new(request: Request, related_task: Option<String>, engine: Engine) -> Self {
        Self { request, related_task, engine }
    }

    #[inline]
    pub fn method(&self) -> &str {
        &self.request.method
    }
}

/// A reference to the next middleware in the chain, or the terminal
/// dispatch into the registered handler.
pub type Next = Arc<dyn Fn(MwContext) -> BoxFuture<'static, Result<Response, ErrorResponse>> + Send + Sync>;

/// A single middleware function.
pub(crate) type Middleware = Arc<dyn Fn(MwContext, Next) -> BoxFuture<'static, Result<Response, ErrorResponse>> + Send + Sync>;

/// An ordered middleware pipeline, composed head-to-tail around a terminal
/// handler supplied at dispatch time.
#[derive(Clone, Default)]
pub(crate) struct Middlewares {
    pipeline: Vec<Middleware>,
}

impl Middlewares {
    pub(crate) fn new() -> Self {
        Self { pipeline: Vec::with_capacity(DEFAULT_MW_CAPACITY) }
    }

    pub(crate) fn add(&mut self, middleware: Middleware) {
        self.pipeline.push(middleware);
    }

    /// Wraps `terminal` (the actual registered-handler dispatch) with every
    /// middleware in the pipeline, outermost first.
    pub(crate) fn compose(&self, terminal: Next) -> Next {
        let mut next = terminal;
        for mw in self.pipeline.iter().rev() {
            let current: Middleware = mw.clone();
            let prev: Next = next.clone();
            next = Arc::new(move |ctx| current(ctx, prev.clone()));
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Engine, EngineOptions};
    use crate::types::RequestId;
    use serde_json::json;

    fn terminal_ok() -> Next {
        Arc::new(|ctx| Box::pin(async move { Ok(Response::new(ctx.request.id, json!("handled"))) }))
    }

    #[tokio::test]
    async fn it_runs_through_an_empty_pipeline_unchanged() {
        let pipeline = Middlewares::new();
        let next = pipeline.compose(terminal_ok());
        let engine = Engine::new(EngineOptions::new());
        let ctx = MwContext::new(Request::new("ping", None, RequestId::Number(1)), None, engine);

        let response = next(ctx).await.unwrap();
        assert_eq!(response.result, json!("handled"));
    }

    #[tokio::test]
    async fn it_lets_a_middleware_short_circuit() {
        let mut pipeline = Middlewares::new();
        pipeline.add(Arc::new(|ctx, _next| {
            Box::pin(async move { Ok(Response::new(ctx.request.id, json!("short-circuited"))) })
        }));

        let next = pipeline.compose(terminal_ok());
        let engine = Engine::new(EngineOptions::new());
        let ctx = MwContext::new(Request::new("ping", None, RequestId::Number(1)), None, engine);

        let response = next(ctx).await.unwrap();
        assert_eq!(response.result, json!("short-circuited"));
    }

    #[tokio::test]
    async fn it_runs_middleware_outermost_first() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut pipeline = Middlewares::new();

        for label in ["a", "b"] {
            let order = order.clone();
            pipeline.add(Arc::new(move |ctx, next: Next| {
                let order = order.clone();
                Box::pin(async move {
                    order.lock().unwrap().push(label);
                    next(ctx).await
                })
            }));
        }

        let next = pipeline.compose(terminal_ok());
        let engine = Engine::new(EngineOptions::new());
        let ctx = MwContext::new(Request::new("ping", None, RequestId::Number(1)), None, engine);
        next(ctx).await.unwrap();

        assert_eq!(*order.lock().unwrap(), vec!["a", "b"]);
    }
}
