//! Request handlers

pub mod health;
pub mod job_types;
pub mod jobs;

pub use health::health_check;
pub use job_types::{get_job_type, list_job_types};
pub use jobs::{execute_job, get_job, get_job_artifact, get_job_status};
