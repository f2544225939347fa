//! Typed handler registration.
//!
//! The [`Handler`] and [`MethodHandler`] traits are implemented for async
//! functions of the supported arities. Registering one captures two things
//! while the concrete types are still known:
//!
//! - its [`Signature`], for the validator
//! - a [`HandlerKind`], the type-erased call used at request time
//!
//! ```rust,ignore
//! async fn get_age(ctx: RequestContext, req: GetAgeRequest) -> Result<GetAgeResponse, Fault> { .. }
//! async fn ping(ctx: RequestContext) -> Result<(), Fault> { .. }
//!
//! impl Server {
//!     async fn get_user(self: Arc<Self>, ctx: RequestContext, req: GetUserRequest)
//!         -> Result<Box<GetUserResponse>, Fault> { .. }
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::handler::binder::{self, BindError, BindSource, Payload};
use crate::handler::context::RequestContext;
use crate::handler::outcome::{Outcome, RawOutputs};
use crate::handler::signature::{
    self, HandlerDescriptor, InputKind, RegistrationKind, ShapeError, Signature,
};

/// Future returned by an invoked handler.
pub type HandlerFuture = BoxFuture<'static, RawOutputs>;

/// Call for a handler that only takes the context.
pub type ContextCall = Arc<dyn Fn(RequestContext) -> HandlerFuture + Send + Sync>;

/// Call for a handler that takes a payload.
///
/// Binding runs synchronously; the handler is only invoked once it succeeded.
pub type PayloadCall =
    Arc<dyn Fn(RequestContext, &BindSource<'_>) -> Result<HandlerFuture, BindError> + Send + Sync>;

/// Type-erased handler call.
#[derive(Clone)]
pub enum HandlerKind {
    ContextOnly(ContextCall),
    ContextPayload(PayloadCall),
}

impl std::fmt::Debug for HandlerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerKind::ContextOnly(_) => f.write_str("ContextOnly"),
            HandlerKind::ContextPayload(_) => f.write_str("ContextPayload"),
        }
    }
}

/// Async functions usable as standalone route handlers.
pub trait Handler<T>: Clone + Send + Sync + Sized + 'static {
    fn signature() -> Signature;

    fn into_kind(self) -> HandlerKind;
}

impl<F, Fut, O> Handler<(RequestContext,)> for F
where
    F: Fn(RequestContext) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
    O: Outcome,
{
    fn signature() -> Signature {
        Signature::new(vec![InputKind::Context], O::outputs())
    }

    fn into_kind(self) -> HandlerKind {
        HandlerKind::ContextOnly(Arc::new(move |ctx: RequestContext| {
            let fut = (self)(ctx);
            async move { fut.await.into_raw() }.boxed()
        }))
    }
}

impl<F, Fut, O, P> Handler<(RequestContext, P)> for F
where
    F: Fn(RequestContext, P) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
    O: Outcome,
    P: Payload,
{
    fn signature() -> Signature {
        Signature::new(
            vec![InputKind::Context, InputKind::Value(P::KIND)],
            O::outputs(),
        )
    }

    fn into_kind(self) -> HandlerKind {
        HandlerKind::ContextPayload(Arc::new(
            move |ctx: RequestContext, source: &BindSource<'_>| -> Result<HandlerFuture, BindError> {
                let payload = binder::bind(P::default, source)?;
                let fut = (self)(ctx, payload);
                Ok(async move { fut.await.into_raw() }.boxed())
            },
        ))
    }
}

/// Async methods of `S` usable as group routes.
///
/// Methods take their receiver as `Arc<S>`.
pub trait MethodHandler<S, T>: Clone + Send + Sync + Sized + 'static {
    /// Signature including the receiver slot.
    fn signature() -> Signature;

    fn bind_receiver(self, receiver: Arc<S>) -> HandlerKind;
}

impl<S, F, Fut, O> MethodHandler<S, (RequestContext,)> for F
where
    S: Send + Sync + 'static,
    F: Fn(Arc<S>, RequestContext) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
    O: Outcome,
{
    fn signature() -> Signature {
        Signature::new(vec![InputKind::Receiver, InputKind::Context], O::outputs())
    }

    fn bind_receiver(self, receiver: Arc<S>) -> HandlerKind {
        HandlerKind::ContextOnly(Arc::new(move |ctx: RequestContext| {
            let fut = (self)(receiver.clone(), ctx);
            async move { fut.await.into_raw() }.boxed()
        }))
    }
}

impl<S, F, Fut, O, P> MethodHandler<S, (RequestContext, P)> for F
where
    S: Send + Sync + 'static,
    F: Fn(Arc<S>, RequestContext, P) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
    O: Outcome,
    P: Payload,
{
    fn signature() -> Signature {
        Signature::new(
            vec![InputKind::Receiver, InputKind::Context, InputKind::Value(P::KIND)],
            O::outputs(),
        )
    }

    fn bind_receiver(self, receiver: Arc<S>) -> HandlerKind {
        HandlerKind::ContextPayload(Arc::new(
            move |ctx: RequestContext, source: &BindSource<'_>| -> Result<HandlerFuture, BindError> {
                let payload = binder::bind(P::default, source)?;
                let fut = (self)(receiver.clone(), ctx, payload);
                Ok(async move { fut.await.into_raw() }.boxed())
            },
        ))
    }
}

/// A standalone handler captured for registration, not yet validated.
#[derive(Clone, Debug)]
pub struct Endpoint {
    signature: Signature,
    kind: HandlerKind,
}

impl Endpoint {
    pub fn new<H, T>(handler: H) -> Self
    where
        H: Handler<T>,
    {
        Self {
            signature: H::signature(),
            kind: handler.into_kind(),
        }
    }

    /// Signature captured at registration.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Validate with function rules.
    pub fn validate(self) -> Result<BoundHandler, ShapeError> {
        BoundHandler::new(&self.signature, RegistrationKind::Function, self.kind)
    }
}

/// A validated handler ready for dispatch.
#[derive(Clone, Debug)]
pub struct BoundHandler {
    descriptor: HandlerDescriptor,
    kind: HandlerKind,
}

impl BoundHandler {
    /// Validate `signature` and pair the resulting descriptor with its call.
    pub fn new(
        signature: &Signature,
        registration: RegistrationKind,
        kind: HandlerKind,
    ) -> Result<Self, ShapeError> {
        let descriptor = signature::validate(signature, registration)?;
        Ok(Self { descriptor, kind })
    }

    pub fn descriptor(&self) -> &HandlerDescriptor {
        &self.descriptor
    }

    pub fn kind(&self) -> &HandlerKind {
        &self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::fault::Fault;
    use crate::handler::outcome::normalize;
    use crate::handler::shape::ValueKind;
    use crate::handler::signature::OutputKind;
    use axum::http::Request;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Req {
        user_name: String,
    }

    #[derive(Debug, Serialize)]
    struct Resp {
        msg: String,
    }

    crate::aggregate!(Req, Resp);

    async fn hello(_ctx: RequestContext, req: Req) -> Result<Box<Resp>, Fault> {
        Ok(Box::new(Resp {
            msg: format!("hello,im {}", req.user_name),
        }))
    }

    async fn ping(_ctx: RequestContext) -> Result<(), Fault> {
        Ok(())
    }

    async fn by_name(_ctx: RequestContext, _name: String) -> Result<(), Fault> {
        Ok(())
    }

    async fn count(_ctx: RequestContext) -> Result<u32, Fault> {
        Ok(1)
    }

    async fn nothing(_ctx: RequestContext) {}

    struct Counter;

    impl Counter {
        async fn total(self: Arc<Self>, _ctx: RequestContext) -> Result<Vec<Resp>, Fault> {
            Ok(Vec::new())
        }
    }

    fn method_signature<S, T, H: MethodHandler<S, T>>(_: &H) -> Signature {
        H::signature()
    }

    fn context() -> RequestContext {
        let (parts, _) = Request::builder().uri("/hello").body(()).unwrap().into_parts();
        RequestContext::new(parts, "/hello")
    }

    #[test]
    fn test_signatures_captured() {
        assert_eq!(
            Endpoint::new(hello).signature(),
            &Signature::new(
                vec![InputKind::Context, InputKind::Value(ValueKind::Aggregate)],
                vec![
                    OutputKind::Value(ValueKind::Pointer(crate::handler::shape::Pointee::Aggregate)),
                    OutputKind::Error
                ],
            )
        );
    }

    #[test]
    fn test_registration_validates() {
        assert!(Endpoint::new(hello).validate().unwrap().descriptor().has_payload());
        assert!(!Endpoint::new(ping).validate().unwrap().descriptor().has_payload());
        assert!(matches!(
            Endpoint::new(by_name).validate(),
            Err(ShapeError::PayloadNotAggregate { position: 1, .. })
        ));
        assert!(matches!(Endpoint::new(count).validate(), Err(ShapeError::InvalidResult { .. })));
        assert_eq!(
            Endpoint::new(nothing).validate().unwrap_err(),
            ShapeError::OutputArity { found: 0 }
        );
    }

    #[tokio::test]
    async fn test_payload_call_binds_then_invokes() {
        let bound = Endpoint::new(hello).validate().unwrap();
        let HandlerKind::ContextPayload(call) = bound.kind() else {
            panic!("expected a payload handler");
        };
        let source = BindSource {
            content_type: Some("application/json"),
            body: br#"{"user_name":"joe"}"#,
            query: None,
        };
        let raw = call(context(), &source).unwrap().await;
        let (payload, fault) = normalize(raw);
        assert_eq!(payload, Some(serde_json::json!({"msg": "hello,im joe"})));
        assert!(fault.is_none());

        let bad = BindSource {
            content_type: Some("application/json"),
            body: b"{",
            query: None,
        };
        assert!(matches!(call(context(), &bad), Err(BindError::Body(_))));
    }

    #[tokio::test]
    async fn test_method_receiver_bound() {
        let signature = method_signature::<Counter, _, _>(&Counter::total);
        assert_eq!(signature.inputs, vec![InputKind::Receiver, InputKind::Context]);

        let kind = Counter::total.bind_receiver(Arc::new(Counter));
        let HandlerKind::ContextOnly(call) = kind else {
            panic!("expected a context-only handler");
        };
        let (payload, fault) = normalize(call(context()).await);
        assert_eq!(payload, Some(serde_json::json!([])));
        assert!(fault.is_none());
    }
}
