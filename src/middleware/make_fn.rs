//! Middleware factory functions

use std::future::Future;
use std::sync::Arc;
use crate::middleware::{Middleware, MwContext, Next};
use crate::types::{Response, ErrorResponse};

/// Turns a closure into middleware.
#[inline]
pub(crate) fn make_mw<F, R>(f: F) -> Middleware
where
    F: Fn(MwContext, Next) -> R + Clone + Send + Sync + 'static,
    R: Future<Output = Result<Response, ErrorResponse>> + Send + 'static,
{
    Arc::new(move |ctx: MwContext, next: Next| Box::pin(f(ctx, next)))
}

/// Turns a closure into middleware that only runs when `predicate` matches
/// the inbound request, falling through to `next` otherwise.
#[inline]
pub(crate) fn make_on<F, P, R>(f: F, predicate: P) -> Middleware
where
    F: Fn(MwContext, Next) -> R + Clone + Send + Sync + 'static,
    P: Fn(&MwContext) -> bool + Clone + Send + Sync + 'static,
    R: Future<Output = Result<Response, ErrorResponse>> + Send + 'static,
{
    let mw = move |ctx: MwContext, next: Next| {
        let f = f.clone();
        let predicate = predicate.clone();
        async move {
            if predicate(&ctx) {
                f(ctx, next).await
            } else {
                next(ctx).await
            }
        }
    };
    make_mw(mw)
}

/// Turns a closure into middleware that only runs for a specific method name.
#[inline]
pub(crate) fn make_on_method<F, R>(f: F, method: &'static str) -> Middleware
where
    F: Fn(MwContext, Next) -> R + Clone + Send + Sync + 'static,
    R: Future<Output = Result<Response, ErrorResponse>> + Send + 'static,
{
    make_on(f, move |ctx| ctx.method() == method)
}
