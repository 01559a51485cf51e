use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::constants::{self, BEDROOM_COUNT, LIVING_AREA, POSTAL_CODE, PRICE};
use crate::error::{PipelineError, Result};
use crate::pipeline::processing::rescale::RescaleSpec;
use crate::pipeline::registry::StepRegistry;

/// The feature contract: which steps run, in which order, and which ordered
/// feature columns they must produce. Training and inference must use the
/// same configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Step identifiers in execution order
    pub steps: Vec<String>,
    /// Ordered model feature names
    pub features: Vec<String>,
    /// Target column present only in training data
    #[serde(default = "default_target")]
    pub target: String,
    /// Fields a prediction request must carry
    #[serde(default = "default_required_fields")]
    pub required_fields: Vec<String>,
    /// Fields the `replace_nulls` step defaults to 0
    #[serde(default = "default_fill_zero_fields")]
    pub fill_zero_fields: Vec<String>,
    #[serde(default)]
    pub rescale: RescaleSpec,
}

fn default_target() -> String {
    PRICE.to_string()
}

fn default_required_fields() -> Vec<String> {
    vec![
        POSTAL_CODE.to_string(),
        LIVING_AREA.to_string(),
        BEDROOM_COUNT.to_string(),
    ]
}

fn default_fill_zero_fields() -> Vec<String> {
    constants::DEFAULT_FILL_ZERO_FIELDS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl PipelineConfig {
    /// Full training pipeline over the given feature contract.
    pub fn with_features<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            steps: constants::default_steps()
                .into_iter()
                .map(String::from)
                .collect(),
            features: features.into_iter().map(Into::into).collect(),
            target: default_target(),
            required_fields: default_required_fields(),
            fill_zero_fields: default_fill_zero_fields(),
            rescale: RescaleSpec::default(),
        }
    }

    /// Validate the configuration against the built-in step registry.
    /// Runs before any record is processed.
    pub fn validate(&self) -> Result<()> {
        self.validate_with(&StepRegistry::builtin())
    }

    pub fn validate_with(&self, registry: &StepRegistry) -> Result<()> {
        if self.steps.is_empty() {
            return Err(PipelineError::Config(
                "Pipeline must have at least one step".to_string(),
            ));
        }

        let mut seen_steps = HashSet::new();
        for step in &self.steps {
            registry.resolve(step)?;
            if !seen_steps.insert(step.as_str()) {
                return Err(PipelineError::Config(format!(
                    "Step '{}' appears more than once",
                    step
                )));
            }
        }

        if self.features.is_empty() {
            return Err(PipelineError::Config(
                "Feature list must not be empty".to_string(),
            ));
        }

        let mut seen_features = HashSet::new();
        for feature in &self.features {
            if !seen_features.insert(feature.as_str()) {
                return Err(PipelineError::Config(format!(
                    "Feature '{}' appears more than once",
                    feature
                )));
            }
        }

        if seen_features.contains(self.target.as_str()) {
            return Err(PipelineError::Config(format!(
                "Target '{}' must not be a model feature",
                self.target
            )));
        }

        self.rescale.validate()
    }

    pub fn has_step(&self, name: &str) -> bool {
        self.steps.iter().any(|s| s == name)
    }

    /// True when training targets are stored in rescaled space, so model
    /// output must be mapped back through the inverse transform.
    pub fn rescales_target(&self) -> bool {
        self.has_step(constants::STEP_RESCALE) && self.rescale.applies_to(&self.target)
    }
}
