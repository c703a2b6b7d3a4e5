//! Storage backend configuration

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Filesystem,
}

/// One store: a backend and, for `filesystem`, its directory
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StorageBackend,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl StoreConfig {
    pub fn filesystem(directory: impl Into<PathBuf>) -> Self {
        Self {
            backend: StorageBackend::Filesystem,
            directory: Some(directory.into()),
        }
    }

    fn validate_store(&self, name: &str, domain: &impl Validatable) -> ConfigResult<()> {
        if self.backend == StorageBackend::Filesystem && self.directory.is_none() {
            return Err(domain.validation_error(format!(
                "{} uses the filesystem backend but has no directory",
                name
            )));
        }
        Ok(())
    }
}

/// Where job records and artifact contents are kept
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub jobs: StoreConfig,
    pub artifacts: StoreConfig,
}

impl Validatable for StorageConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.jobs.validate_store("jobs", self)?;
        self.artifacts.validate_store("artifacts", self)
    }

    fn domain_name(&self) -> &'static str {
        "storage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_is_default() {
        let config = StorageConfig::default();
        assert_eq!(config.jobs.backend, StorageBackend::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_filesystem_requires_directory() {
        let mut config = StorageConfig::default();
        config.artifacts.backend = StorageBackend::Filesystem;
        assert!(config.validate().is_err());

        config.artifacts = StoreConfig::filesystem("/var/lib/folio/artifacts");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let config: StorageConfig =
            serde_yaml::from_str("jobs:\n  backend: filesystem\n  directory: /tmp/jobs\n").unwrap();
        assert_eq!(config.jobs, StoreConfig::filesystem("/tmp/jobs"));
        assert_eq!(config.artifacts, StoreConfig::default());
    }
}
