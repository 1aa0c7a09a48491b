//! One simulated client session
//!
//! A `VirtualUser` owns its transport, RPC client, session context, and
//! random source by construction; nothing is shared with other users.
//! Bootstrap fully completes before the first flow iteration, and the
//! scheduler drives iterations strictly one at a time.

use crate::bootstrap::Bootstrapper;
use crate::error::{SessionError, SessionResult};
use crate::extract::PageExtractor;
use crate::flows::{FlowCatalog, FlowSession};
use crate::rpc::RpcClient;
use rand::{rngs::StdRng, SeedableRng};
use stampede_config::TargetConfig;
use stampede_http::Transport;
use std::sync::Arc;
use tracing::info;

/// An authenticated virtual user ready to run flows
pub struct VirtualUser {
    id: usize,
    session: FlowSession,
    catalog: Arc<FlowCatalog>,
}

impl std::fmt::Debug for VirtualUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualUser")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl VirtualUser {
    /// Run the bootstrap sequence and produce a ready virtual user.
    ///
    /// Passing a seed makes the user's request ids and flow randomness
    /// reproducible.
    pub async fn bootstrap(
        id: usize,
        transport: Arc<dyn Transport>,
        extractor: Arc<dyn PageExtractor>,
        target: &TargetConfig,
        catalog: Arc<FlowCatalog>,
        seed: Option<u64>,
    ) -> SessionResult<Self> {
        let mut rpc = match seed {
            Some(seed) => RpcClient::with_seed(transport.clone(), seed),
            None => RpcClient::new(transport.clone()),
        };
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let bootstrapper = Bootstrapper::new(transport, extractor, target);
        let context = bootstrapper.bootstrap(&mut rpc).await?;
        info!(user = id, uid = context.user_id, "virtual user ready");

        Ok(Self {
            id,
            session: FlowSession::new(context, rpc, rng),
            catalog,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn context(&self) -> &crate::context::SessionContext {
        &self.session.context
    }

    /// Execute one iteration of the named flow
    pub async fn run_flow(&mut self, name: &str) -> SessionResult<()> {
        let flow = self.catalog.get(name).ok_or_else(|| {
            SessionError::DataAssumption(format!("unknown flow: {}", name))
        })?;
        flow.run(&mut self.session).await
    }
}
