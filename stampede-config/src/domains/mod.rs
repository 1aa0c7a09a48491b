//! Domain-specific configuration modules

pub mod http;
pub mod load;
pub mod target;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main Stampede configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StampedeConfig {
    /// Target application configuration
    #[serde(default)]
    pub target: target::TargetConfig,

    /// HTTP client configuration
    #[serde(default)]
    pub http: http::HttpConfig,

    /// Load shape configuration
    #[serde(default)]
    pub load: load::LoadConfig,
}

impl StampedeConfig {
    /// Validate every configuration domain
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.target.validate()?;
        self.http.validate()?;
        self.load.validate()?;
        Ok(())
    }
}
