//! Folio server
//!
//! Composition root of the workspace: builds every collaborator from a
//! [`FolioConfig`](folio_config::FolioConfig), wires them into the lifecycle
//! engine and serves the REST API next to the execution worker.

pub mod cli;
pub mod services;
pub mod startup;

pub use services::ServiceContainer;
pub use startup::{shutdown_signal, Server};
