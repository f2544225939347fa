//! Server runner: typed request dispatch on top of axum.
//!
//! # Architecture Overview
//!
//! ```text
//!   Registration (startup)                      Request time
//!   ──────────────────────                      ────────────
//!   bind_router / RouteNode / RouteGroup        axum Router
//!          │                                         │
//!          ▼                                         ▼
//!   handler::signature (validate shape)         route middleware (root → leaf)
//!          │                                         │
//!          ▼                                         ▼
//!   routing::{tree, discovery}                  http::dispatch
//!          │                                    bind → invoke → normalise
//!          ▼                                         │
//!   routing::table ──── http::server ──────▶         ▼
//!                       (build Router)          http::response (strategy)
//! ```
//!
//! Handlers are plain async functions, or async methods of a shared server
//! value, taking a [`RequestContext`] and an optional payload:
//!
//! ```rust,ignore
//! async fn get_age(ctx: RequestContext, req: GetAgeRequest) -> Result<Box<GetAgeResponse>, Fault>;
//! ```

// Core subsystems
pub mod handler;
pub mod http;
pub mod routing;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;

pub mod demo;

pub use config::RunnerConfig;
pub use error::RunnerError;
pub use handler::{EmptyRequest, EmptyResponse, Fault, InternalError, RequestContext};
pub use http::{CommonResponse, ResponseStrategy, ServerRunner};
pub use lifecycle::Shutdown;
pub use routing::{Middleware, MethodSet, RouteGroup, RouteNode};
