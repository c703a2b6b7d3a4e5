//! # Folio Interfaces
//!
//! One trait per collaborator of the execution lifecycle. The lifecycle
//! engine depends only on these traits; concrete backends live in
//! `folio-storage` and `folio-execution` and are wired together by the
//! server's composition root.
//!
//! ## Main Interfaces
//!
//! - [`JobRepository`] - Durable job records with compare-and-set updates
//! - [`JobTypeRepository`] - Job type lookup and document loading
//! - [`ArtifactStore`] / [`ContentStore`] - Artifact content by scheme
//! - [`DocumentExecutor`] - Runs a parameterized document
//! - [`TaskHandoff`] - Schedules `complete` for an accepted job

pub mod artifacts;
pub mod execution;
pub mod repository;

pub use artifacts::{ArtifactStore, ContentStore};
pub use execution::{
    DocumentConverter, DocumentExecutor, DocumentParameterizer, ExecutionReport, OutputReader,
    TaskHandoff,
};
pub use repository::{JobRepository, JobTypeRepository};
