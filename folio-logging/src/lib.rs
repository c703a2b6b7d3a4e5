//! Logging initialisation for Folio
//!
//! Every crate logs through `tracing`. This crate installs the global
//! subscriber once, at process start, from the `logging` configuration
//! domain.

mod init;

pub use init::{build_env_filter, init_logging_from_config, init_simple_tracing};
