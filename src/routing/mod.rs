//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     bind_router(method, path, handler) → table.rs (manual entry)
//!     RouteNode trees → tree.rs (flatten, accumulate paths + middleware)
//!     RouteGroup values → discovery.rs (one route per valid method)
//!     → RouteTable, consumed by the HTTP server
//! ```
//!
//! # Design Decisions
//! - Manual registrations run before discovery and always win
//! - Shape errors of standalone handlers are fatal; of group methods, skipped
//! - The table is immutable once the server starts

pub mod discovery;
pub mod group;
pub mod middleware;
pub mod path;
pub mod table;
pub mod tree;

use axum::http::Method;

use crate::handler::ShapeError;

pub use discovery::{discover, is_reserved};
pub use group::{Group, MethodSet, RouteGroup};
pub use middleware::Middleware;
pub use path::join_path;
pub use table::{Origin, RouteEntry, RouteTable};
pub use tree::{compose, NodeHandler, RouteNode};

/// Errors raised while building the route table.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("invalid handler for {method} {path}: {source}")]
    Shape {
        method: Method,
        path: String,
        #[source]
        source: ShapeError,
    },

    #[error("route {method} {path} is already registered")]
    Duplicate { method: Method, path: String },

    #[error("route {path} conflicts with {existing}")]
    Conflict { path: String, existing: String },

    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(Method),

    #[error("invalid route path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },
}
