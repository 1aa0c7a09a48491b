//! Virtual-user session engine for Stampede
//!
//! This crate implements the session protocol one simulated browser follows
//! against the target web application: the authenticated bootstrap sequence,
//! the enveloped RPC client on top of the transport, and the scripted
//! interaction flows with randomized, response-derived parameters. The
//! surrounding host (scheduling, pacing, reporting) lives elsewhere and
//! drives this engine one virtual user and one flow iteration at a time.

pub mod bootstrap;
pub mod context;
pub mod error;
pub mod extract;
pub mod flows;
pub mod rpc;
pub mod user;

// Re-export main types
pub use bootstrap::Bootstrapper;
pub use context::SessionContext;
pub use error::{SessionError, SessionResult};
pub use extract::{PageExtractor, RegexExtractor, SessionInfo};
pub use flows::{Flow, FlowCatalog, FlowSession};
pub use rpc::{RequestIds, RpcClient};
pub use user::VirtualUser;
