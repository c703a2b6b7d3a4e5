//! Artifact storage interfaces

use async_trait::async_trait;
use folio_core::{Artifact, FolioResult};

/// A storage backend for one artifact scheme
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Scheme this backend serves, e.g. `file`
    fn scheme(&self) -> &str;

    /// Fails with `StoredContentNotFound` if nothing is stored at `path`
    async fn get_content(&self, path: &str) -> FolioResult<String>;

    async fn set_content(&self, path: &str, content: String) -> FolioResult<()>;
}

/// Scheme-dispatching artifact access used by the lifecycle engine
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Reference to `path` under the default scheme
    fn new_artifact(&self, path: &str) -> Artifact;

    /// Fails with `UnrecognizedScheme` or `StoredContentNotFound`
    async fn get_content(&self, artifact: &Artifact) -> FolioResult<String>;

    async fn set_content(&self, artifact: &Artifact, content: String) -> FolioResult<()>;
}
