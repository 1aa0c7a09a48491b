//! Error types for the session engine
//!
//! The taxonomy separates failures that kill a virtual user's whole run
//! (authentication and bootstrap problems, since no valid session exists)
//! from failures that only abort the current flow iteration (a call that
//! came back with an error, or server data that broke an assumption).

use serde_json::Value as JsonValue;
use thiserror::Error;

/// Session engine result type
pub type SessionResult<T> = Result<T, SessionError>;

/// Session engine errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// Connection-level failure, surfaced from the transport
    #[error("Transport error: {0}")]
    Transport(#[from] stampede_http::HttpError),

    /// Login rejected: bad credentials or server refusal
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The bootstrap sequence could not produce a valid session
    #[error("Bootstrap failed: {0}")]
    Bootstrap(String),

    /// No menu entry matched the configured label
    #[error("Menu entry not found: {0}")]
    MenuNotFound(String),

    /// A call returned an error field or a non-success status
    #[error("Protocol error from {endpoint}: {payload}")]
    Protocol { endpoint: String, payload: JsonValue },

    /// An expected record or field was absent from server data
    #[error("Data assumption violated: {0}")]
    DataAssumption(String),
}

impl SessionError {
    /// Whether this error invalidates the virtual user's entire run.
    ///
    /// Non-fatal errors abort only the current flow iteration; the session
    /// stays valid and the next iteration starts fresh.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::Auth(_) | SessionError::Bootstrap(_) | SessionError::MenuNotFound(_)
        )
    }
}
