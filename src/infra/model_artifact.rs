use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::app::ports::PriceModel;
use crate::error::{PipelineError, Result};
use crate::types::FeatureVector;

/// Persisted linear model: `intercept + sum(weight_i * feature_i)` in log-price space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModelArtifact {
    pub feature_names: Vec<String>,
    pub weights: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub contract: Option<String>,
}

impl LinearModelArtifact {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::data_load("model artifact", format!("{}: {}", path.display(), e))
        })?;
        let artifact: LinearModelArtifact = serde_json::from_str(&content).map_err(|e| {
            PipelineError::data_load("model artifact", format!("{}: {}", path.display(), e))
        })?;
        artifact.validate()?;
        info!(
            features = artifact.feature_names.len(),
            path = %path.display(),
            "Model artifact loaded"
        );
        Ok(artifact)
    }

    pub fn validate(&self) -> Result<()> {
        if self.feature_names.len() != self.weights.len() {
            return Err(PipelineError::data_load(
                "model artifact",
                format!(
                    "{} feature names but {} weights",
                    self.feature_names.len(),
                    self.weights.len()
                ),
            ));
        }
        if !self.intercept.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(PipelineError::data_load(
                "model artifact",
                "weights and intercept must be finite",
            ));
        }
        Ok(())
    }
}

impl PriceModel for LinearModelArtifact {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn contract(&self) -> Option<&str> {
        self.contract.as_deref()
    }

    fn infer(&self, features: &FeatureVector) -> Result<f64> {
        if features.names() != self.feature_names.as_slice() {
            return Err(PipelineError::ContractMismatch {
                expected: self.feature_names.join(","),
                actual: features.names().join(","),
            });
        }
        let output = self.intercept
            + self
                .weights
                .iter()
                .zip(features.values())
                .map(|(w, x)| w * x)
                .sum::<f64>();
        Ok(output)
    }
}
