//! Artifact storage
//!
//! [`ArtifactClient`] routes each artifact to the [`ContentStore`] serving
//! its scheme. New artifacts are created under the default scheme.

mod filesystem;
mod memory;

pub use filesystem::FilesystemContentStore;
pub use memory::InMemoryContentStore;

use async_trait::async_trait;
use folio_core::{Artifact, FolioError, FolioResult};
use folio_interfaces::{ArtifactStore, ContentStore};
use std::collections::HashMap;
use std::sync::Arc;

/// Scheme-dispatching artifact store
#[derive(Clone)]
pub struct ArtifactClient {
    default_scheme: String,
    stores: HashMap<String, Arc<dyn ContentStore>>,
}

impl ArtifactClient {
    /// Create a client whose default scheme is served by `default_store`
    pub fn new(default_store: Arc<dyn ContentStore>) -> Self {
        let default_scheme = default_store.scheme().to_string();
        let mut stores = HashMap::new();
        stores.insert(default_scheme.clone(), default_store);
        Self {
            default_scheme,
            stores,
        }
    }

    /// Register an additional backend
    pub fn with_store(mut self, store: Arc<dyn ContentStore>) -> Self {
        self.stores.insert(store.scheme().to_string(), store);
        self
    }

    pub fn default_scheme(&self) -> &str {
        &self.default_scheme
    }

    fn store(&self, scheme: &str) -> FolioResult<&Arc<dyn ContentStore>> {
        self.stores
            .get(scheme)
            .ok_or_else(|| FolioError::UnrecognizedScheme(scheme.to_string()))
    }
}

#[async_trait]
impl ArtifactStore for ArtifactClient {
    fn new_artifact(&self, path: &str) -> Artifact {
        Artifact::new(self.default_scheme.clone(), path)
    }

    async fn get_content(&self, artifact: &Artifact) -> FolioResult<String> {
        self.store(&artifact.scheme)?.get_content(&artifact.path).await
    }

    async fn set_content(&self, artifact: &Artifact, content: String) -> FolioResult<()> {
        self.store(&artifact.scheme)?
            .set_content(&artifact.path, content)
            .await
    }
}
