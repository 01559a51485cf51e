use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::pipeline::processing::encode::{CategoricalDomains, DOMAINS_VERSION};

/// File-backed storage for the categorical domain table.
///
/// The table is written once when training features are built and read
/// verbatim at inference.
pub struct DomainStore {
    path: PathBuf,
}

impl DomainStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<CategoricalDomains> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            PipelineError::data_load("categorical domains", format!("{}: {}", self.path.display(), e))
        })?;
        let domains: CategoricalDomains = serde_json::from_str(&content).map_err(|e| {
            PipelineError::data_load("categorical domains", format!("{}: {}", self.path.display(), e))
        })?;
        if domains.version != DOMAINS_VERSION {
            return Err(PipelineError::data_load(
                "categorical domains",
                format!(
                    "unsupported version {} (expected {})",
                    domains.version, DOMAINS_VERSION
                ),
            ));
        }
        info!(path = %self.path.display(), "Categorical domains loaded");
        Ok(domains)
    }

    pub fn save(&self, domains: &CategoricalDomains) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(domains)?;
        fs::write(&self.path, content)?;
        info!(path = %self.path.display(), "Categorical domains saved");
        Ok(())
    }
}
