//! In-memory content store

use async_trait::async_trait;
use folio_core::{FolioError, FolioResult};
use folio_interfaces::ContentStore;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Content store keeping everything in a map; contents are lost on restart
#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    contents: RwLock<HashMap<String, String>>,
}

impl InMemoryContentStore {
    pub const SCHEME: &'static str = "in_memory";

    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    fn scheme(&self) -> &str {
        Self::SCHEME
    }

    async fn get_content(&self, path: &str) -> FolioResult<String> {
        self.contents
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| FolioError::StoredContentNotFound(format!("{}://{}", Self::SCHEME, path)))
    }

    async fn set_content(&self, path: &str, content: String) -> FolioResult<()> {
        self.contents.write().await.insert(path.to_string(), content);
        Ok(())
    }
}
