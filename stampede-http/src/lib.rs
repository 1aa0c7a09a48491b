//! HTTP transport functionality for Stampede
//!
//! This crate provides the per-virtual-user request-execution interface:
//! a cookie-persisting reqwest transport for live runs and a canned-response
//! mock for offline use.

pub mod config;
pub mod errors;
pub mod mock;
pub mod transport;

// Re-export main types for convenience
pub use config::HttpConfig;
pub use errors::HttpError;
pub use mock::{MockTransport, RecordedCall};
pub use transport::{HttpResponse, Transport, WebTransport};
