//! Job type repositories

mod filesystem;
mod memory;

pub use filesystem::{FilesystemJobTypeRepository, RefreshReport, SkippedJobType};
pub use memory::InMemoryJobTypeRepository;
