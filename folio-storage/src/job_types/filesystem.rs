//! Job type discovery from a directory tree
//!
//! A job type is a document `<name>.ipynb` with a sidecar descriptor
//! `<name>.config.json` next to it. The job type id is the descriptor's `id`
//! when set, otherwise the document path relative to the root without its
//! extension, `/`-separated.

use async_trait::async_trait;
use folio_core::{Document, FolioError, FolioResult, JobTypeConfig, JobTypeDescriptor};
use folio_interfaces::JobTypeRepository;
use folio_schema::SchemaBinder;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const DESCRIPTOR_SUFFIX: &str = ".config.json";
const DOCUMENT_EXTENSION: &str = "ipynb";

type JobTypeMap = BTreeMap<String, Arc<JobTypeConfig>>;

/// A descriptor that could not be loaded
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedJobType {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a directory scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshReport {
    pub loaded: Vec<String>,
    pub skipped: Vec<SkippedJobType>,
}

/// Job types discovered under a root directory
pub struct FilesystemJobTypeRepository {
    root: PathBuf,
    binder: Arc<SchemaBinder>,
    job_types: RwLock<Arc<JobTypeMap>>,
}

impl FilesystemJobTypeRepository {
    /// Create an empty repository; call [`refresh`](Self::refresh) to load it
    pub fn new(root: impl Into<PathBuf>, binder: Arc<SchemaBinder>) -> Self {
        Self {
            root: root.into(),
            binder,
            job_types: RwLock::new(Arc::new(BTreeMap::new())),
        }
    }

    /// Create a repository and load it
    pub async fn load(
        root: impl Into<PathBuf>,
        binder: Arc<SchemaBinder>,
    ) -> FolioResult<(Self, RefreshReport)> {
        let repository = Self::new(root, binder);
        let report = repository.refresh().await?;
        Ok((repository, report))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rescan the root and replace the whole set of job types at once
    pub async fn refresh(&self) -> FolioResult<RefreshReport> {
        let root = self.root.clone();
        let binder = self.binder.clone();
        let (job_types, report) = tokio::task::spawn_blocking(move || scan(&root, &binder))
            .await
            .map_err(|e| FolioError::Internal(format!("Job type scan failed: {}", e)))??;

        for skipped in &report.skipped {
            warn!(
                path = %skipped.path.display(),
                reason = %skipped.reason,
                "Skipping job type"
            );
        }
        info!(
            root = %self.root.display(),
            loaded = report.loaded.len(),
            skipped = report.skipped.len(),
            "Loaded job types"
        );

        *self.job_types.write().await = Arc::new(job_types);
        Ok(report)
    }

    async fn snapshot(&self) -> Arc<JobTypeMap> {
        self.job_types.read().await.clone()
    }
}

fn scan(root: &Path, binder: &SchemaBinder) -> FolioResult<(JobTypeMap, RefreshReport)> {
    if !root.is_dir() {
        return Err(FolioError::Configuration(format!(
            "Job type directory does not exist: {}",
            root.display()
        )));
    }

    let mut job_types = BTreeMap::new();
    let mut report = RefreshReport::default();

    let walker = WalkDir::new(root).follow_links(true).sort_by_file_name();
    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let descriptor_path = entry.path();
        let Some(stem) = descriptor_path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_suffix(DESCRIPTOR_SUFFIX))
        else {
            continue;
        };

        match load_job_type(root, descriptor_path, stem, binder) {
            Ok(config) if job_types.contains_key(&config.id) => {
                report.skipped.push(SkippedJobType {
                    path: descriptor_path.to_path_buf(),
                    reason: format!("duplicate job type id '{}'", config.id),
                });
            }
            Ok(config) => {
                debug!(job_type_id = %config.id, "Discovered job type");
                report.loaded.push(config.id.clone());
                job_types.insert(config.id.clone(), Arc::new(config));
            }
            Err(reason) => report.skipped.push(SkippedJobType {
                path: descriptor_path.to_path_buf(),
                reason,
            }),
        }
    }

    Ok((job_types, report))
}

fn load_job_type(
    root: &Path,
    descriptor_path: &Path,
    stem: &str,
    binder: &SchemaBinder,
) -> Result<JobTypeConfig, String> {
    let document_path = descriptor_path.with_file_name(format!("{}.{}", stem, DOCUMENT_EXTENSION));
    if !document_path.is_file() {
        return Err(format!("missing document {}", document_path.display()));
    }

    let raw = std::fs::read_to_string(descriptor_path).map_err(|e| e.to_string())?;
    let descriptor: JobTypeDescriptor =
        serde_json::from_str(&raw).map_err(|e| format!("invalid descriptor: {}", e))?;

    let relative = document_path
        .strip_prefix(root)
        .map_err(|e| e.to_string())?
        .components()
        .filter_map(|component| component.as_os_str().to_str())
        .collect::<Vec<_>>()
        .join("/");
    let id = match &descriptor.id {
        Some(id) => id.clone(),
        None => relative
            .strip_suffix(&format!(".{}", DOCUMENT_EXTENSION))
            .unwrap_or(relative.as_str())
            .to_string(),
    };

    JobTypeConfig::resolve(id, relative, descriptor, binder).map_err(|e| e.to_string())
}

#[async_trait]
impl JobTypeRepository for FilesystemJobTypeRepository {
    async fn get(&self, job_type_id: &str) -> FolioResult<Arc<JobTypeConfig>> {
        self.snapshot()
            .await
            .get(job_type_id)
            .cloned()
            .ok_or_else(|| FolioError::JobTypeNotFound(job_type_id.to_string()))
    }

    async fn list_ids(&self) -> FolioResult<Vec<String>> {
        Ok(self.snapshot().await.keys().cloned().collect())
    }

    async fn load_document(&self, job_type: &JobTypeConfig) -> FolioResult<Document> {
        let raw = fs::read_to_string(self.root.join(&job_type.document_path)).await?;
        Document::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_schema::TypeRegistry;
    use serde_json::json;
    use tempfile::TempDir;

    fn binder() -> Arc<SchemaBinder> {
        let mut registry = TypeRegistry::new();
        folio_core::register_domain_types(&mut registry);
        Arc::new(SchemaBinder::new(Arc::new(registry)))
    }

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn notebook() -> String {
        serde_json::to_string(&Document::default()).unwrap()
    }

    #[tokio::test]
    async fn test_discovers_job_types() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "echo.ipynb", &notebook());
        write(dir.path(), "echo.config.json", r#"{"input": {"type": "object"}}"#);
        write(dir.path(), "reports/daily.ipynb", &notebook());
        write(
            dir.path(),
            "reports/daily.config.json",
            r#"{"output": {"$ref": "typed://folio.Artifact"}}"#,
        );
        write(dir.path(), "named/doc.ipynb", &notebook());
        write(dir.path(), "named/doc.config.json", r#"{"id": "custom"}"#);

        let (repository, report) = FilesystemJobTypeRepository::load(dir.path(), binder())
            .await
            .unwrap();

        assert!(report.skipped.is_empty(), "{report:?}");
        assert_eq!(
            repository.list_ids().await.unwrap(),
            vec!["custom", "echo", "reports/daily"]
        );

        let daily = repository.get("reports/daily").await.unwrap();
        assert_eq!(daily.document_path, "reports/daily.ipynb");
        assert_eq!(daily.output_schema, json!({"$ref": "typed://folio.Artifact"}));
        assert_eq!(daily.resolved_output_schema["$ref"], "#/definitions/folio.Artifact");

        let document = repository.load_document(&daily).await.unwrap();
        assert_eq!(document, Document::default());
    }

    #[tokio::test]
    async fn test_skips_broken_descriptors() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "orphan.config.json", "{}");
        write(dir.path(), "bad.ipynb", &notebook());
        write(dir.path(), "bad.config.json", "{not json");
        write(dir.path(), "unknown.ipynb", &notebook());
        write(dir.path(), "unknown.config.json", r#"{"input": {"$ref": "typed://nope"}}"#);
        write(dir.path(), "good.ipynb", &notebook());
        write(dir.path(), "good.config.json", "{}");

        let (repository, report) = FilesystemJobTypeRepository::load(dir.path(), binder())
            .await
            .unwrap();

        assert_eq!(report.loaded, vec!["good"]);
        assert_eq!(report.skipped.len(), 3);
        assert!(repository.get("bad").await.is_err());
    }

    #[tokio::test]
    async fn test_refresh_replaces_set() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "first.ipynb", &notebook());
        write(dir.path(), "first.config.json", "{}");

        let (repository, _) = FilesystemJobTypeRepository::load(dir.path(), binder())
            .await
            .unwrap();
        assert!(repository.get("first").await.is_ok());

        std::fs::remove_file(dir.path().join("first.config.json")).unwrap();
        write(dir.path(), "second.ipynb", &notebook());
        write(dir.path(), "second.config.json", "{}");
        repository.refresh().await.unwrap();

        assert_eq!(repository.list_ids().await.unwrap(), vec!["second"]);
        assert!(matches!(
            repository.get("first").await,
            Err(FolioError::JobTypeNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let repository = FilesystemJobTypeRepository::new(dir.path().join("absent"), binder());
        assert!(matches!(
            repository.refresh().await,
            Err(FolioError::Configuration(_))
        ));
    }
}
