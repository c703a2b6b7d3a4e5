//! Job type discovery configuration

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobTypesConfig {
    /// Root scanned for `<name>.config.json` descriptors
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
}

impl Default for JobTypesConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
        }
    }
}

impl Validatable for JobTypesConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.directory.as_os_str().is_empty() {
            return Err(self.validation_error("directory cannot be empty"));
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "job_types"
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("./job_types")
}
