//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, transport layers)
//!     → request.rs (add request ID)
//!     → route middleware (root → leaf)
//!     → dispatch.rs (bind → invoke → normalise)
//!     → response.rs (response strategy)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod request;
pub mod response;
pub mod server;

pub use dispatch::Dispatcher;
pub use request::X_REQUEST_ID;
pub use response::{CommonResponse, DefaultResponse, ResponseStrategy};
pub use server::ServerRunner;
