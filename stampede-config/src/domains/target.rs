//! Target application configuration
//!
//! Describes the web application under test: where it lives, which account
//! the virtual users log in as, and which top-level menu entry supplies the
//! landing action for the scripted flows.

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, validate_url, Validatable};
use serde::{Deserialize, Serialize};

/// Target application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Base URL of the target host
    #[serde(default = "default_host")]
    pub host: String,

    /// Login name used by every virtual user
    #[serde(default)]
    pub login: String,

    /// Password used by every virtual user
    #[serde(default)]
    pub password: String,

    /// Display name of the menu entry whose action becomes the landing action
    #[serde(default = "default_menu_label")]
    pub menu_label: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            login: String::new(),
            password: String::new(),
            menu_label: default_menu_label(),
        }
    }
}

impl Validatable for TargetConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.host, "host", self.domain_name())?;
        validate_required_string(&self.login, "login", self.domain_name())?;
        validate_required_string(&self.password, "password", self.domain_name())?;
        validate_required_string(&self.menu_label, "menu_label", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "target"
    }
}

// Default value functions
fn default_host() -> String {
    "http://localhost:8069".to_string()
}

fn default_menu_label() -> String {
    "CRM".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_config_defaults() {
        let config = TargetConfig::default();
        assert_eq!(config.host, "http://localhost:8069");
        assert_eq!(config.menu_label, "CRM");
        assert!(config.login.is_empty());
    }

    #[test]
    fn test_target_config_requires_credentials() {
        let config = TargetConfig::default();
        assert!(config.validate().is_err());

        let config = TargetConfig {
            login: "admin".to_string(),
            password: "admin".to_string(),
            ..TargetConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_target_config_rejects_bad_host() {
        let config = TargetConfig {
            host: "not-a-url".to_string(),
            login: "admin".to_string(),
            password: "admin".to_string(),
            ..TargetConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
