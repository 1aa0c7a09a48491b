//! Generic RPC call/response client
//!
//! Wraps every payload in the JSON-RPC-style envelope the web client uses,
//! issues it over the transport, and asserts success. Any error field in a
//! response is a protocol failure, never silently ignored.

use crate::error::{SessionError, SessionResult};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde_json::{json, Value as JsonValue};
use std::collections::HashSet;
use std::sync::Arc;
use stampede_http::Transport;
use tracing::{debug, warn};

/// Request ids are drawn from `0..10^11`, matching the web client
const RPC_ID_SPACE: u64 = 100_000_000_000;

/// Generator of session-unique random request ids.
///
/// Ids only correlate requests with responses, but must never repeat within
/// one session; collisions are redrawn.
#[derive(Debug)]
pub struct RequestIds {
    rng: StdRng,
    issued: HashSet<u64>,
}

impl RequestIds {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            issued: HashSet::new(),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            issued: HashSet::new(),
        }
    }

    /// Next unused id in the id space
    pub fn next_id(&mut self) -> u64 {
        loop {
            let id = self.rng.random_range(0..RPC_ID_SPACE);
            if self.issued.insert(id) {
                return id;
            }
        }
    }
}

impl Default for RequestIds {
    fn default() -> Self {
        Self::new()
    }
}

/// RPC client bound to one virtual user's transport
pub struct RpcClient {
    transport: Arc<dyn Transport>,
    ids: RequestIds,
}

impl RpcClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            ids: RequestIds::new(),
        }
    }

    /// Client with a deterministic id sequence, for reproducible runs
    pub fn with_seed(transport: Arc<dyn Transport>, seed: u64) -> Self {
        Self {
            transport,
            ids: RequestIds::from_seed(seed),
        }
    }

    /// Issue one enveloped call and return the `result` payload.
    ///
    /// Fails with [`SessionError::Protocol`] on non-success status, an
    /// unparsable body, or an `error` field in the response. The failure is
    /// fatal to the current flow iteration only.
    pub async fn call(&mut self, endpoint: &str, params: JsonValue) -> SessionResult<JsonValue> {
        let id = self.ids.next_id();
        let envelope = json!({
            "id": id,
            "jsonrpc": "2.0",
            "method": "call",
            "params": params,
        });

        debug!(endpoint, id, "issuing rpc call");
        let response = self.transport.post_json(endpoint, &envelope).await?;

        if !response.is_success() {
            return Err(SessionError::Protocol {
                endpoint: endpoint.to_string(),
                payload: json!({ "status": response.status }),
            });
        }

        let body: JsonValue =
            serde_json::from_str(&response.body).map_err(|e| SessionError::Protocol {
                endpoint: endpoint.to_string(),
                payload: json!({ "unparsable_body": e.to_string() }),
            })?;

        if let Some(error) = body.get("error") {
            warn!(endpoint, "rpc call returned an error payload");
            return Err(SessionError::Protocol {
                endpoint: endpoint.to_string(),
                payload: error.clone(),
            });
        }

        Ok(body.get("result").cloned().unwrap_or(JsonValue::Null))
    }

    /// Invoke a model method through the generic `call_kw` endpoint
    pub async fn call_kw(
        &mut self,
        model: &str,
        method: &str,
        args: JsonValue,
        kwargs: JsonValue,
    ) -> SessionResult<JsonValue> {
        let endpoint = format!("/web/dataset/call_kw/{}/{}", model, method);
        self.call(
            &endpoint,
            json!({
                "model": model,
                "method": method,
                "args": args,
                "kwargs": kwargs,
            }),
        )
        .await
    }

    /// Filtered, paginated record read
    pub async fn search_read(&mut self, params: JsonValue) -> SessionResult<JsonValue> {
        self.call("/web/dataset/search_read", params).await
    }

    /// Invoke a window action by id
    pub async fn run_action(&mut self, action_id: i64) -> SessionResult<JsonValue> {
        self.call("/web/action/run", json!({ "action_id": action_id }))
            .await
    }
}
