//! Configuration loading and environment variable handling

use crate::domains::StampedeConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "STAMPEDE".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<StampedeConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: StampedeConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<StampedeConfig> {
        let mut config = StampedeConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<StampedeConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut StampedeConfig) -> ConfigResult<()> {
        self.apply_target_overrides(&mut config.target)?;
        self.apply_http_overrides(&mut config.http)?;
        self.apply_load_overrides(&mut config.load)?;
        Ok(())
    }

    /// Apply target config overrides
    fn apply_target_overrides(
        &self,
        config: &mut crate::domains::target::TargetConfig,
    ) -> ConfigResult<()> {
        if let Ok(host) = self.get_env_var("HOST") {
            config.host = host;
        }

        if let Ok(login) = self.get_env_var("LOGIN") {
            config.login = login;
        }

        if let Ok(password) = self.get_env_var("PASSWORD") {
            config.password = password;
        }

        if let Ok(menu_label) = self.get_env_var("MENU_LABEL") {
            config.menu_label = menu_label;
        }

        Ok(())
    }

    /// Apply HTTP config overrides
    fn apply_http_overrides(
        &self,
        config: &mut crate::domains::http::HttpConfig,
    ) -> ConfigResult<()> {
        if let Ok(timeout) = self.get_env_var("HTTP_TIMEOUT") {
            let seconds: u64 = timeout
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid HTTP_TIMEOUT: {}", e)))?;
            config.timeout = std::time::Duration::from_secs(seconds);
        }

        if let Ok(user_agent) = self.get_env_var("HTTP_USER_AGENT") {
            config.user_agent = user_agent;
        }

        if let Ok(verify_ssl) = self.get_env_var("HTTP_VERIFY_SSL") {
            config.verify_ssl = verify_ssl
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid HTTP_VERIFY_SSL: {}", e)))?;
        }

        Ok(())
    }

    /// Apply load config overrides
    fn apply_load_overrides(
        &self,
        config: &mut crate::domains::load::LoadConfig,
    ) -> ConfigResult<()> {
        if let Ok(users) = self.get_env_var("USERS") {
            config.users = users
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid USERS: {}", e)))?;
        }

        if let Ok(iterations) = self.get_env_var("ITERATIONS") {
            let count: u64 = iterations
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid ITERATIONS: {}", e)))?;
            config.iterations = Some(count);
        }

        if let Ok(wait_min) = self.get_env_var("WAIT_MIN") {
            let seconds: u64 = wait_min
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid WAIT_MIN: {}", e)))?;
            config.wait_min = std::time::Duration::from_secs(seconds);
        }

        if let Ok(wait_max) = self.get_env_var("WAIT_MAX") {
            let seconds: u64 = wait_max
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid WAIT_MAX: {}", e)))?;
            config.wait_max = std::time::Duration::from_secs(seconds);
        }

        if let Ok(flows) = self.get_env_var("FLOWS") {
            config.flows = flows.split(',').map(|f| f.trim().to_string()).collect();
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_env_with_overrides() {
        temp_env::with_vars(
            [
                ("STAMPEDE_HOST", Some("http://odoo.test:8069")),
                ("STAMPEDE_LOGIN", Some("demo")),
                ("STAMPEDE_PASSWORD", Some("demo")),
                ("STAMPEDE_USERS", Some("25")),
                ("STAMPEDE_FLOWS", Some("crm_kanban, crm_lead_create")),
            ],
            || {
                let config = ConfigLoader::new().from_env().unwrap();
                assert_eq!(config.target.host, "http://odoo.test:8069");
                assert_eq!(config.target.login, "demo");
                assert_eq!(config.load.users, 25);
                assert_eq!(
                    config.load.flows,
                    vec!["crm_kanban".to_string(), "crm_lead_create".to_string()]
                );
            },
        );
    }

    #[test]
    fn test_from_env_missing_credentials_fails_validation() {
        temp_env::with_vars([("STAMPEDE_LOGIN", None::<&str>)], || {
            assert!(ConfigLoader::new().from_env().is_err());
        });
    }

    #[test]
    fn test_from_file_with_env_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "target:\n  host: http://file.test:8069\n  login: filed\n  password: filed\nload:\n  users: 4"
        )
        .unwrap();

        temp_env::with_vars([("STAMPEDE_USERS", Some("9"))], || {
            let config = ConfigLoader::new().from_file(file.path()).unwrap();
            assert_eq!(config.target.host, "http://file.test:8069");
            // Environment wins over the file
            assert_eq!(config.load.users, 9);
        });
    }
}
