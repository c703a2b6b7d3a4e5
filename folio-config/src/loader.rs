//! Configuration loading and environment variable handling

use crate::domains::FolioConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            prefix: "FOLIO".to_string(),
        }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<FolioConfig> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading configuration file");
        let content = std::fs::read_to_string(path)?;
        let mut config: FolioConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration from defaults and environment variables only
    pub fn from_env(&self) -> ConfigResult<FolioConfig> {
        let mut config = FolioConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<FolioConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    fn apply_env_overrides(&self, config: &mut FolioConfig) -> ConfigResult<()> {
        if let Some(level) = self.parsed_env_var("LOG_LEVEL")? {
            config.logging.level = level;
        }
        if let Some(format) = self.parsed_env_var("LOG_FORMAT")? {
            config.logging.format = format;
        }

        if let Ok(bind) = self.get_env_var("SERVER_BIND_ADDRESS") {
            config.server.bind_address = bind;
        }
        if let Some(port) = self.parsed_env_var("SERVER_PORT")? {
            config.server.port = port;
        }

        if let Some(seconds) = self.parsed_env_var::<u64>("EXECUTION_TIMEOUT_SECONDS")? {
            config.execution.execution_timeout = Duration::from_secs(seconds);
        }
        if let Some(max_jobs) = self.parsed_env_var("MAX_CONCURRENT_JOBS")? {
            config.execution.max_concurrent_jobs = max_jobs;
        }

        if let Ok(directory) = self.get_env_var("JOB_TYPES_DIR") {
            config.job_types.directory = PathBuf::from(directory);
        }

        Ok(())
    }

    fn parsed_env_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_env_var(name) {
            Ok(raw) => raw.parse().map(Some).map_err(|e| {
                ConfigError::EnvError(format!("Invalid {}_{}: {}", self.prefix, name, e))
            }),
            Err(_) => Ok(None),
        }
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
