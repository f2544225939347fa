//! Response strategies.
//!
//! # Responsibilities
//! - Turn a normalised `(payload, fault)` pair into an HTTP response
//! - Provide the default JSON envelope
//!
//! # Design Decisions
//! - The envelope always answers HTTP 200; the outcome lives in `code`
//! - A fault wins over a payload: `data` is `null` whenever a fault is present
//! - [`InternalError`](crate::handler::InternalError) details never reach the client

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::handler::{Fault, RequestContext};

/// Message sent for internal faults.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal error";

/// Renders handler results.
///
/// Closures `Fn(&RequestContext, Option<Value>, Option<Fault>) -> Response`
/// implement this trait.
pub trait ResponseStrategy: Send + Sync + 'static {
    fn respond(&self, ctx: &RequestContext, payload: Option<Value>, fault: Option<Fault>)
        -> Response;
}

impl<F> ResponseStrategy for F
where
    F: Fn(&RequestContext, Option<Value>, Option<Fault>) -> Response + Send + Sync + 'static,
{
    fn respond(
        &self,
        ctx: &RequestContext,
        payload: Option<Value>,
        fault: Option<Fault>,
    ) -> Response {
        self(ctx, payload, fault)
    }
}

/// The JSON envelope written by [`DefaultResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonResponse {
    pub code: u16,
    pub msg: String,
    pub data: Option<Value>,
}

impl CommonResponse {
    pub fn success(data: Option<Value>) -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            msg: String::new(),
            data,
        }
    }

    pub fn failure(fault: &Fault) -> Self {
        let msg = if fault.is_internal() {
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            fault.message()
        };
        Self {
            code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            msg,
            data: None,
        }
    }
}

/// Writes `{"code", "msg", "data"}` with HTTP 200.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResponse;

impl ResponseStrategy for DefaultResponse {
    fn respond(
        &self,
        ctx: &RequestContext,
        payload: Option<Value>,
        fault: Option<Fault>,
    ) -> Response {
        let body = match fault {
            Some(fault) => {
                if fault.is_internal() {
                    tracing::error!(route = ctx.route(), error = %fault, "Internal error");
                }
                CommonResponse::failure(&fault)
            }
            None => CommonResponse::success(payload),
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::InternalError;
    use axum::http::Request;
    use serde_json::json;

    fn context() -> RequestContext {
        let (parts, _) = Request::builder().uri("/GetUser").body(()).unwrap().into_parts();
        RequestContext::new(parts, "/GetUser")
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let response = DefaultResponse.respond(&context(), Some(json!({"msg": "hi"})), None);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"code": 200, "msg": "", "data": {"msg": "hi"}}));
    }

    #[tokio::test]
    async fn test_fault_wins_over_payload() {
        let response = DefaultResponse.respond(
            &context(),
            Some(json!({"msg": "hi"})),
            Some(Fault::msg("user name is nil")),
        );
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"code": 500, "msg": "user name is nil", "data": null})
        );
    }

    #[tokio::test]
    async fn test_internal_detail_hidden() {
        let fault = Fault::new(InternalError::new("db password rejected"));
        let response = DefaultResponse.respond(&context(), None, Some(fault));
        assert_eq!(
            body_json(response).await,
            json!({"code": 500, "msg": "internal error", "data": null})
        );
    }

    #[tokio::test]
    async fn test_closure_strategy() {
        let strategy = |_ctx: &RequestContext, _payload: Option<Value>, fault: Option<Fault>| {
            let status = if fault.is_some() { StatusCode::BAD_REQUEST } else { StatusCode::OK };
            status.into_response()
        };
        let response = strategy.respond(&context(), None, Some(Fault::msg("no")));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
