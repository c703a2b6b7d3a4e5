//! Domain-driven configuration management for Folio
//!
//! Configuration is split by functional domain. Each domain carries its own
//! defaults and validation; [`ConfigLoader`] reads YAML, applies `FOLIO_*`
//! environment overrides and validates the result.

pub mod domains;
pub mod error;
pub mod loader;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

pub use domains::{
    execution::{ExecutionConfig, ExecutorConfig, ExecutorKind},
    job_types::JobTypesConfig,
    logging::{LogFormat, LogLevel, LoggingConfig},
    server::ServerConfig,
    storage::{StorageBackend, StorageConfig, StoreConfig},
    FolioConfig,
};

pub use domains::utils::serde_duration;
