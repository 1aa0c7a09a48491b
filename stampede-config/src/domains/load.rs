//! Load shape configuration
//!
//! How many virtual users to run, how they ramp up, how long they pause
//! between flow iterations, and which flows they execute. Pacing and user
//! count live here rather than in the core engine; the engine itself only
//! ever sees one session at a time.

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Load shape configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Number of concurrent virtual users
    #[serde(default = "default_users")]
    pub users: usize,

    /// Flow iterations per virtual user; unlimited when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u64>,

    /// Lower bound of the think time between iterations
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_wait_min"
    )]
    pub wait_min: Duration,

    /// Upper bound of the think time between iterations
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_wait_max"
    )]
    pub wait_max: Duration,

    /// Delay between consecutive virtual-user starts
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_ramp_up"
    )]
    pub ramp_up: Duration,

    /// Names of the flows each virtual user cycles through
    #[serde(default = "default_flows")]
    pub flows: Vec<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            users: default_users(),
            iterations: None,
            wait_min: default_wait_min(),
            wait_max: default_wait_max(),
            ramp_up: default_ramp_up(),
            flows: default_flows(),
        }
    }
}

impl Validatable for LoadConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.users, "users", self.domain_name())?;

        if self.wait_min > self.wait_max {
            return Err(self.validation_error(format!(
                "wait_min ({}s) must not exceed wait_max ({}s)",
                self.wait_min.as_secs(),
                self.wait_max.as_secs()
            )));
        }

        if self.flows.is_empty() {
            return Err(self.validation_error("at least one flow must be configured"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "load"
    }
}

// Default value functions
fn default_users() -> usize {
    1
}

fn default_wait_min() -> Duration {
    Duration::from_secs(20)
}

fn default_wait_max() -> Duration {
    Duration::from_secs(40)
}

fn default_ramp_up() -> Duration {
    Duration::from_secs(0)
}

fn default_flows() -> Vec<String> {
    vec!["crm_kanban".to_string()]
}
