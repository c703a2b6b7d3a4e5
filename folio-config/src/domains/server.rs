//! HTTP server configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Prefix for every route, e.g. `/api`; empty serves routes at the root
    #[serde(default)]
    pub api_prefix: String,

    #[serde(default = "crate::domains::utils::default_true")]
    pub enable_cors: bool,

    /// Request tracing middleware
    #[serde(default = "crate::domains::utils::default_true")]
    pub enable_tracing: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            api_prefix: String::new(),
            enable_cors: true,
            enable_tracing: true,
        }
    }
}

impl ServerConfig {
    /// `address:port` to listen on
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl Validatable for ServerConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.bind_address, "bind_address", self.domain_name())?;

        if !self.api_prefix.is_empty() {
            if !self.api_prefix.starts_with('/') {
                return Err(self.validation_error("api_prefix must start with '/'"));
            }
            if self.api_prefix.ends_with('/') {
                return Err(self.validation_error("api_prefix must not end with '/'"));
            }
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "server"
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_address(), "127.0.0.1:8080");
        assert!(config.api_prefix.is_empty());
        assert!(config.enable_cors);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_config_validation() {
        let mut config = ServerConfig {
            bind_address: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.bind_address = "0.0.0.0".to_string();
        config.api_prefix = "api".to_string();
        assert!(config.validate().is_err());

        config.api_prefix = "/api/".to_string();
        assert!(config.validate().is_err());

        config.api_prefix = "/api".to_string();
        assert!(config.validate().is_ok());
    }
}
