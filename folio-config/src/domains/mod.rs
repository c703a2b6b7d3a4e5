//! Domain-specific configuration modules

pub mod execution;
pub mod job_types;
pub mod logging;
pub mod server;
pub mod storage;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main Folio configuration combining all domains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FolioConfig {
    pub server: server::ServerConfig,
    pub execution: execution::ExecutionConfig,
    pub storage: storage::StorageConfig,
    pub job_types: job_types::JobTypesConfig,
    pub logging: logging::LoggingConfig,
}

impl FolioConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.execution.validate()?;
        self.storage.validate()?;
        self.job_types.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = FolioConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
