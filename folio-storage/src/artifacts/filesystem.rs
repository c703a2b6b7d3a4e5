//! Filesystem content store

use async_trait::async_trait;
use folio_core::{FolioError, FolioResult};
use folio_interfaces::ContentStore;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Content store writing files below a root directory
#[derive(Debug, Clone)]
pub struct FilesystemContentStore {
    root: PathBuf,
}

impl FilesystemContentStore {
    pub const SCHEME: &'static str = "file";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an artifact path below the root; absolute paths and `..` are rejected
    fn resolve(&self, path: &str) -> FolioResult<PathBuf> {
        let relative = Path::new(path);
        let is_contained = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !is_contained {
            return Err(FolioError::Storage(format!("Invalid artifact path: {}", path)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ContentStore for FilesystemContentStore {
    fn scheme(&self) -> &str {
        Self::SCHEME
    }

    async fn get_content(&self, path: &str) -> FolioResult<String> {
        let full_path = self.resolve(path)?;
        match fs::read_to_string(&full_path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(FolioError::StoredContentNotFound(
                format!("{}://{}", Self::SCHEME, path),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_content(&self, path: &str, content: String) -> FolioResult<()> {
        let full_path = self.resolve(path)?;
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut temp_name = full_path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);
        fs::write(&temp_path, content).await?;
        fs::rename(&temp_path, &full_path).await?;
        Ok(())
    }
}
