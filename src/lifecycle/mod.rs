//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Apply overrides → Validate → Init logging/metrics
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Listeners stop accepting → In-flight requests drain → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then observability, then listeners
//! - One shutdown channel shared by every listener

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
