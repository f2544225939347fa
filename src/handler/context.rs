//! Per-request context handed to every handler.

use std::sync::Arc;

use axum::http::{request::Parts, HeaderMap, Method, Uri};

use crate::http::request::X_REQUEST_ID;

/// Read-only view of the request a handler is serving.
///
/// Cheap to clone; the request head is shared.
#[derive(Clone, Debug)]
pub struct RequestContext {
    parts: Arc<Parts>,
    route: Arc<str>,
}

impl RequestContext {
    /// Build a context from the request head and the registered route path.
    pub fn new(parts: Parts, route: impl Into<Arc<str>>) -> Self {
        Self {
            parts: Arc::new(parts),
            route: route.into(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Request path as received.
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Raw query string, if any.
    pub fn query(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    /// Route path the request was dispatched to.
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// `Content-Type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.header(axum::http::header::CONTENT_TYPE.as_str())
    }

    /// Request ID assigned by the request-id layer.
    pub fn request_id(&self) -> Option<&str> {
        self.header(X_REQUEST_ID)
    }

    /// Typed value inserted by a middleware.
    pub fn extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.parts.extensions.get::<T>()
    }
}
