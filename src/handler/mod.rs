//! Handler contract subsystem.
//!
//! # Data Flow
//! ```text
//! Registration:
//!     async fn / async method
//!     → traits.rs (capture Signature + HandlerKind at the call site)
//!     → signature.rs (validate → HandlerDescriptor, or ShapeError)
//!
//! Request:
//!     BoundHandler
//!     → binder.rs (payload handlers only: zero value + body + query)
//!     → invoke
//!     → outcome.rs (raw outputs → payload + fault)
//! ```
//!
//! # Design Decisions
//! - Handler shapes are checked once, at registration, never per request
//! - A closed set of call variants instead of runtime type inspection
//! - Payloads are created by a factory captured with the handler's type

pub mod binder;
pub mod context;
pub mod empty;
pub mod fault;
pub mod outcome;
pub mod shape;
pub mod signature;
pub mod traits;

pub use binder::{BindError, BindSource, Payload};
pub use context::RequestContext;
pub use empty::{EmptyRequest, EmptyResponse};
pub use fault::{Fault, InternalError};
pub use outcome::{normalize, Outcome, RawOutputs, RawPayload, Reply};
pub use shape::{Pointee, Shape, ValueKind};
pub use signature::{
    validate, HandlerDescriptor, InputKind, OutputKind, OutputShape, RegistrationKind, ShapeError,
    Signature,
};
pub use traits::{BoundHandler, Endpoint, Handler, HandlerKind, MethodHandler};
