//! Scripted interaction flows
//!
//! A flow is one named user task: a sequence of dependent RPC calls whose
//! payloads are derived from earlier responses and from injected randomness.
//! Flows never call each other, and at most one flow runs at a time per
//! virtual user. A failed call aborts the rest of the invocation; the
//! session stays valid for the next iteration.

pub mod crm_kanban;
pub mod crm_lead_create;

use crate::context::SessionContext;
use crate::error::SessionResult;
use crate::rpc::RpcClient;
use rand::rngs::StdRng;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub use crm_kanban::CrmKanban;
pub use crm_lead_create::CrmLeadCreate;

/// Everything one flow invocation works against: the immutable session
/// parameters, the RPC client, and the user's random source. The random
/// source is injected so flows are deterministic under a fixed seed.
pub struct FlowSession {
    pub context: SessionContext,
    pub rpc: RpcClient,
    pub rng: StdRng,
}

impl FlowSession {
    pub fn new(context: SessionContext, rpc: RpcClient, rng: StdRng) -> Self {
        Self { context, rpc, rng }
    }
}

/// A named, independently invocable scripted flow
#[async_trait::async_trait]
pub trait Flow: Send + Sync {
    /// Stable name the scheduler selects the flow by
    fn name(&self) -> &'static str;

    /// Execute one iteration of the flow
    async fn run(&self, session: &mut FlowSession) -> SessionResult<()>;
}

/// Registry of flows keyed by their stable names
pub struct FlowCatalog {
    flows: HashMap<&'static str, Arc<dyn Flow>>,
}

impl FlowCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self {
            flows: HashMap::new(),
        }
    }

    /// Catalog with the built-in flows registered
    pub fn with_builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register(Arc::new(CrmKanban));
        catalog.register(Arc::new(CrmLeadCreate));
        catalog
    }

    pub fn register(&mut self, flow: Arc<dyn Flow>) {
        debug!("Registering flow {}", flow.name());
        self.flows.insert(flow.name(), flow);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Flow>> {
        self.flows.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.flows.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for FlowCatalog {
    fn default() -> Self {
        Self::with_builtin()
    }
}

/// Extract the id out of a many2one value, which the server renders as a
/// `[id, display_name]` pair.
pub(crate) fn many2one_id(value: &JsonValue) -> Option<i64> {
    value.as_array()?.first()?.as_i64()
}
