//! Builder methods for registering middleware on [`EngineOptions`]

use std::future::Future;
use crate::engine::EngineOptions;
use crate::middleware::make_fn::{make_mw, make_on, make_on_method};
use crate::middleware::{MwContext, Next};
use crate::types::{Response, ErrorResponse};

impl EngineOptions {
    /// Registers a middleware that runs for every inbound request.
    pub fn wrap<F, R>(mut self, middleware: F) -> Self
    where
        F: Fn(MwContext, Next) -> R + Clone + Send + Sync + 'static,
        R: Future<Output = Result<Response, ErrorResponse>> + Send + 'static,
    {
        self.middlewares.add(make_mw(middleware));
        self
    }

    /// Registers a middleware that only runs for requests matching `method`.
    pub fn wrap_method<F, R>(mut self, method: &'static str, middleware: F) -> Self
    where
        F: Fn(MwContext, Next) -> R + Clone + Send + Sync + 'static,
        R: Future<Output = Result<Response, ErrorResponse>> + Send + 'static,
    {
        self.middlewares.add(make_on_method(middleware, method));
        self
    }

    /// Registers a middleware that only runs for task-augmented requests
    /// (those carrying a top-level `task` field).
    pub fn wrap_task<F, R>(mut self, middleware: F) -> Self
    where
        F: Fn(MwContext, Next) -> R + Clone + Send + Sync + 'static,
        R: Future<Output = Result<Response, ErrorResponse>> + Send + 'static,
    {
        self.middlewares.add(make_on(middleware, |ctx| ctx.request.task.is_some()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Engine, EngineOptions};
    use crate::types::{Request, RequestId};
    use serde_json::json;
    use std::sync::Arc;

    fn terminal_ok() -> Next {
        Arc::new(|ctx| Box::pin(async move { Ok(Response::new(ctx.request.id, json!("handled"))) }))
    }

    #[tokio::test]
    async fn it_only_runs_wrap_method_for_the_named_method() {
        let options = EngineOptions::new().wrap_method("ping", |ctx, _next| async move {
            Ok(Response::new(ctx.request.id, json!("pong")))
        });
        let engine = Engine::new(options);

        let pipeline = engine.middlewares_for_test();
        let next = pipeline.compose(terminal_ok());

        let ctx = MwContext::new(Request::new("ping", None, RequestId::Number(1)), None, engine.clone());
        assert_eq!(next(ctx).await.unwrap().result, json!("pong"));

        let ctx = MwContext::new(Request::new("other", None, RequestId::Number(2)), None, engine);
        assert_eq!(next(ctx).await.unwrap().result, json!("handled"));
    }
}
