//! Storage backends for Folio
//!
//! - [`jobs`]: job repositories that persist registry-encoded, self-describing records
//! - [`artifacts`]: the scheme-dispatching [`ArtifactClient`] and its content stores
//! - [`job_types`]: job type discovery from sidecar descriptors

pub mod artifacts;
pub mod job_types;
pub mod jobs;

pub use artifacts::{ArtifactClient, FilesystemContentStore, InMemoryContentStore};
pub use job_types::{
    FilesystemJobTypeRepository, InMemoryJobTypeRepository, RefreshReport, SkippedJobType,
};
pub use jobs::{FilesystemJobRepository, InMemoryJobRepository, JobCodec};
