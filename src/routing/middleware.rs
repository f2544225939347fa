//! Request interceptors attached to route tree nodes.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

type MiddlewareFn = dyn Fn(Request, Next) -> BoxFuture<'static, Response> + Send + Sync;

/// A request interceptor.
///
/// Calls `next.run(request)` to continue the chain, or returns its own
/// response to stop it.
#[derive(Clone)]
pub struct Middleware {
    name: Arc<str>,
    call: Arc<MiddlewareFn>,
}

impl Middleware {
    /// Wrap an async function.
    pub fn from_fn<F, Fut>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Self {
            name: name.into(),
            call: Arc::new(move |request, next| f(request, next).boxed()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run this interceptor.
    pub fn run(&self, request: Request, next: Next) -> BoxFuture<'static, Response> {
        (self.call)(request, next)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Middleware").field(&self.name).finish()
    }
}
