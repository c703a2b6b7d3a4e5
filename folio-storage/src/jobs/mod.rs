//! Job repositories

mod filesystem;
mod memory;

pub use filesystem::FilesystemJobRepository;
pub use memory::InMemoryJobRepository;

use folio_core::{FolioResult, Job};
use folio_schema::TypeRegistry;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Encodes job records through the type registry so stored records carry
/// their discriminators
#[derive(Debug, Clone)]
pub struct JobCodec {
    registry: Arc<TypeRegistry>,
}

impl JobCodec {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

    pub fn encode(&self, job: &Job) -> FolioResult<String> {
        let value = self.registry.encode(job)?;
        Ok(serde_json::to_string(&value)?)
    }

    pub fn decode(&self, raw: &str) -> FolioResult<Job> {
        let value: JsonValue = serde_json::from_str(raw)?;
        Ok(self.registry.decode_as::<Job>(value)?)
    }
}
