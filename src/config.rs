use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_CODE_COLUMN, POSTAL_CODE};
use crate::error::{PipelineError, Result};
use crate::pipeline::PipelineConfig;

pub const CONFIG_ENV_VAR: &str = "IMMO_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub reference: ReferenceTablesConfig,
    pub pipeline: PipelineConfig,
    pub model: ModelConfig,
}

/// Locations of the static lookup tables, keyed by geographic code.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceTablesConfig {
    /// Postal code -> geographic code mapping
    pub postal_mapping: PathBuf,
    /// Attribute tables joined on the geographic code, in join order
    pub population_density: PathBuf,
    pub household_income: PathBuf,
    pub property_value: PathBuf,
    #[serde(default = "default_code_column")]
    pub code_column: String,
    #[serde(default = "default_postal_column")]
    pub postal_column: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Persisted model artifact (JSON)
    pub artifact: PathBuf,
    /// Persisted categorical domain table (JSON)
    pub domains: PathBuf,
}

fn default_code_column() -> String {
    DEFAULT_CODE_COLUMN.to_string()
}

fn default_postal_column() -> String {
    POSTAL_CODE.to_string()
}

impl ReferenceTablesConfig {
    /// Attribute tables as (name, path) pairs in join order.
    pub fn attribute_tables(&self) -> Vec<(&'static str, &Path)> {
        vec![
            ("population_density", self.population_density.as_path()),
            ("property_value", self.property_value.as_path()),
            ("household_income", self.household_income.as_path()),
        ]
    }

    fn resolve_against(&mut self, base: &Path) {
        for path in [
            &mut self.postal_mapping,
            &mut self.population_density,
            &mut self.household_income,
            &mut self.property_value,
        ] {
            resolve(path, base);
        }
    }
}

fn resolve(path: &mut PathBuf, base: &Path) {
    if path.is_relative() {
        *path = base.join(&*path);
    }
}

impl Config {
    /// Resolve the config path: explicit argument, then `IMMO_CONFIG`, then `config.toml`.
    pub fn locate(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        std::env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Load and validate the configuration. Relative table and artifact paths are
    /// resolved against the directory holding the config file.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        let mut config = Self::from_toml_str(&config_content)?;
        let base = config_path.parent().unwrap_or_else(|| Path::new("."));
        config.reference.resolve_against(base);
        resolve(&mut config.model.artifact, base);
        resolve(&mut config.model.domains, base);
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.pipeline.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[reference]
postal_mapping = "data/postal_mapping.json"
population_density = "data/pop_density.json"
household_income = "data/household_income.json"
property_value = "data/property_value.json"

[pipeline]
steps = ["filter_rows", "replace_nulls", "join_data", "drop_columns", "encode_categorical", "rescale"]
features = ["LivingArea", "BedroomCount", "Condition"]

[model]
artifact = "models/linear.json"
domains = "models/domains.json"
"#;

    #[test]
    fn test_parse_sample_config_with_defaults() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.reference.code_column, "Refnis");
        assert_eq!(config.reference.postal_column, "PostalCode");
        assert_eq!(config.pipeline.target, "Price");
        assert_eq!(config.pipeline.rescale.base, 10.0);
        assert_eq!(config.pipeline.steps.len(), 6);
    }

    #[test]
    fn test_unknown_step_rejected_at_load() {
        let broken = SAMPLE.replace("\"rescale\"]", "\"remote_fetch\"]");
        let err = Config::from_toml_str(&broken).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownStep(ref s) if s == "remote_fetch"));
    }

    #[test]
    fn test_relative_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, SAMPLE).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.reference.postal_mapping,
            dir.path().join("data/postal_mapping.json")
        );
        assert_eq!(config.model.domains, dir.path().join("models/domains.json"));
    }

    #[test]
    fn test_missing_config_file_is_config_error() {
        let err = Config::load(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
