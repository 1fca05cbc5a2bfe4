//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`downloads`] — Batch snapshot, batch triggering, try-counter reset
//! - [`system`] — Health, events, OpenAPI

mod downloads;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use downloads::*;
pub use system::*;
