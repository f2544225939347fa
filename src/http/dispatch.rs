//! Request-time dispatch.
//!
//! # Responsibilities
//! - Build the request context
//! - Buffer and bind the body for payload handlers
//! - Invoke the handler and normalise its outputs
//! - Hand `(payload, fault)` to the response strategy
//!
//! # Design Decisions
//! - Fixed order: bind, invoke, normalise, respond
//! - A bind failure answers immediately; the handler is never invoked
//! - Panics in binding or in the handler become internal faults here
//! - Context-only handlers never read the body

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::response::Response;
use futures_util::FutureExt;
use serde_json::Value;

use crate::handler::traits::HandlerFuture;
use crate::handler::{
    normalize, BindError, BindSource, BoundHandler, Fault, HandlerKind, InternalError,
    RequestContext,
};
use crate::http::response::ResponseStrategy;
use crate::observability::metrics;

/// Dispatches requests for one route.
#[derive(Clone)]
pub struct Dispatcher {
    handler: BoundHandler,
    route: Arc<str>,
    strategy: Arc<dyn ResponseStrategy>,
    body_limit: usize,
}

impl Dispatcher {
    /// Create a new dispatcher for the route registered at `route`.
    pub fn new(
        handler: BoundHandler,
        route: impl Into<Arc<str>>,
        strategy: Arc<dyn ResponseStrategy>,
        body_limit: usize,
    ) -> Self {
        Self {
            handler,
            route: route.into(),
            strategy,
            body_limit,
        }
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    /// Serve one request.
    pub async fn dispatch(self, request: Request) -> Response {
        let start = Instant::now();
        let (parts, body) = request.into_parts();
        let ctx = RequestContext::new(parts, self.route.clone());

        tracing::debug!(
            request_id = ctx.request_id().unwrap_or("unknown"),
            method = %ctx.method(),
            route = %self.route,
            "Dispatching request"
        );

        let started = match self.handler.kind() {
            HandlerKind::ContextOnly(call) => {
                let call = call.clone();
                let handler_ctx = ctx.clone();
                start_call(move || Ok(call(handler_ctx)))
            }
            HandlerKind::ContextPayload(call) => {
                let bytes = match axum::body::to_bytes(body, self.body_limit).await {
                    Ok(bytes) => bytes,
                    Err(e) => return self.reject(&ctx, BindError::Read(e.to_string()), start),
                };
                let source = BindSource {
                    content_type: ctx.content_type(),
                    body: &bytes,
                    query: ctx.query(),
                };
                start_call(|| call(ctx.clone(), &source))
            }
        };

        let (payload, fault, outcome) = match started {
            Ok(Ok(future)) => finish(future).await,
            Ok(Err(bind_error)) => return self.reject(&ctx, bind_error, start),
            Err(fault) => (None, Some(fault), Outcome::Panic),
        };

        metrics::record_dispatch(&self.route, outcome.as_str(), start);
        self.strategy.respond(&ctx, payload, fault)
    }

    fn reject(&self, ctx: &RequestContext, error: BindError, start: Instant) -> Response {
        tracing::warn!(
            request_id = ctx.request_id().unwrap_or("unknown"),
            route = %self.route,
            error = %error,
            "Failed to bind request"
        );
        metrics::record_dispatch(&self.route, Outcome::BindError.as_str(), start);
        self.strategy.respond(ctx, None, Some(Fault::new(error)))
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("route", &self.route)
            .field("handler", &self.handler)
            .field("body_limit", &self.body_limit)
            .finish()
    }
}

/// How a request ended, for metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Ok,
    Fault,
    BindError,
    Panic,
}

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Fault => "fault",
            Outcome::BindError => "bind_error",
            Outcome::Panic => "panic",
        }
    }
}

/// Run the synchronous part of a call (binding, future creation).
fn start_call<F>(f: F) -> Result<Result<HandlerFuture, BindError>, Fault>
where
    F: FnOnce() -> Result<HandlerFuture, BindError>,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(panic_fault)
}

async fn finish(future: HandlerFuture) -> (Option<Value>, Option<Fault>, Outcome) {
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(raw) => {
            let (payload, fault) = normalize(raw);
            let outcome = if fault.is_some() { Outcome::Fault } else { Outcome::Ok };
            (payload, fault, outcome)
        }
        Err(panic) => (None, Some(panic_fault(panic)), Outcome::Panic),
    }
}

fn panic_fault(panic: Box<dyn Any + Send>) -> Fault {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_string());
    tracing::error!(panic = %detail, "Handler panicked");
    Fault::new(InternalError::new(detail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::handler::Endpoint;
    use crate::http::response::DefaultResponse;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct GetUserRequest {
        user_name: String,
    }

    #[derive(Debug, Serialize)]
    struct GetUserResponse {
        msg: String,
    }

    crate::aggregate!(GetUserRequest, GetUserResponse);

    static CALLS: AtomicUsize = AtomicUsize::new(0);

    async fn get_user(_ctx: RequestContext, req: GetUserRequest) -> Result<Box<GetUserResponse>, Fault> {
        CALLS.fetch_add(1, Ordering::SeqCst);
        if req.user_name.is_empty() {
            return Err(Fault::msg("user name is nil"));
        }
        Ok(Box::new(GetUserResponse {
            msg: format!("hello,im {}", req.user_name),
        }))
    }

    async fn explode(_ctx: RequestContext) -> Result<(), Fault> {
        panic!("boom");
    }

    fn dispatcher<H, T>(handler: H) -> Dispatcher
    where
        H: crate::handler::Handler<T>,
    {
        let bound = Endpoint::new(handler).validate().unwrap();
        Dispatcher::new(bound, "/GetUser", Arc::new(DefaultResponse), 1024)
    }

    fn request(uri: &str, content_type: &str, body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", content_type)
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_bind_invoke_respond() {
        let response = dispatcher(get_user)
            .dispatch(request("/GetUser", "application/json", r#"{"user_name":"joe"}"#))
            .await;
        assert_eq!(
            body_json(response).await,
            json!({"code": 200, "msg": "", "data": {"msg": "hello,im joe"}})
        );
    }

    #[tokio::test]
    async fn test_query_binding() {
        let response = dispatcher(get_user)
            .dispatch(request("/GetUser?user_name=ann", "application/json", ""))
            .await;
        assert_eq!(body_json(response).await["data"]["msg"], "hello,im ann");
    }

    #[tokio::test]
    async fn test_bind_error_skips_handler() {
        let before = CALLS.load(Ordering::SeqCst);
        let response = dispatcher(get_user)
            .dispatch(request("/GetUser", "application/json", "{not json"))
            .await;
        let body = body_json(response).await;
        assert_eq!(body["code"], 500);
        assert!(body["msg"].as_str().unwrap().starts_with("invalid request body"));
        assert_eq!(CALLS.load(Ordering::SeqCst), before);
    }

    #[tokio::test]
    async fn test_body_over_limit() {
        let bound = Endpoint::new(get_user).validate().unwrap();
        let response = Dispatcher::new(bound, "/GetUser", Arc::new(DefaultResponse), 4)
            .dispatch(request("/GetUser", "application/json", r#"{"user_name":"joe"}"#))
            .await;
        let body = body_json(response).await;
        assert!(body["msg"].as_str().unwrap().starts_with("failed to read request body"));
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let response = dispatcher(explode)
            .dispatch(request("/GetUser", "application/json", ""))
            .await;
        assert_eq!(
            body_json(response).await,
            json!({"code": 500, "msg": "internal error", "data": null})
        );
    }
}
