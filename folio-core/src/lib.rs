//! Core domain types for Folio
//!
//! This crate defines the execution job, its status machine, artifacts and
//! job type configuration, together with the error taxonomy shared by every
//! other Folio crate.

pub mod artifact;
pub mod document;
pub mod error;
pub mod job;
pub mod job_type;

pub use artifact::{artifact_path, Artifact, ArtifactKind};
pub use document::{Cell, Document};
pub use error::{FolioError, FolioResult};
pub use job::{CompletionDetails, CompletionStatus, Job, JobId, JobStatus};
pub use job_type::{JobTypeConfig, JobTypeDescriptor};

use folio_schema::TypeRegistry;

/// Register the persisted domain types with a registry
pub fn register_domain_types(registry: &mut TypeRegistry) -> &mut TypeRegistry {
    registry
        .register::<Job>()
        .register::<CompletionDetails>()
        .register::<Artifact>()
}
