use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::contract;
use crate::error::{PipelineError, Result};
use crate::observability::metrics;
use crate::pipeline::pipeline_config::PipelineConfig;
use crate::pipeline::processing::encode::CategoricalDomains;
use crate::pipeline::processing::rescale::RescaleSpec;
use crate::pipeline::registry::{StepRegistry, StepResources};
use crate::pipeline::steps::PipelineStep;
use crate::types::{FeatureVector, FieldValue, PropertyRecord};

/// Model-ready rows built from a batch of raw listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSet {
    pub feature_names: Vec<String>,
    pub rows: Vec<FeatureVector>,
    /// Rescaled target values, aligned with `rows`
    pub targets: Vec<f64>,
    /// Listings that survived the filter but could not be made model-ready
    pub rejected: usize,
    /// Fingerprint of the feature contract the rows were built under
    pub contract: String,
}

/// An ordered list of resolved steps plus the feature contract they produce.
pub struct FeaturePipeline {
    config: PipelineConfig,
    steps: Vec<Box<dyn PipelineStep>>,
    domains: Arc<CategoricalDomains>,
    contract: String,
}

impl FeaturePipeline {
    /// Resolve every configured step before any record is seen. An unknown
    /// step name fails here, at startup.
    pub fn build(config: PipelineConfig, resources: StepResources) -> Result<Self> {
        Self::build_with(config, resources, &StepRegistry::builtin())
    }

    pub fn build_with(
        config: PipelineConfig,
        resources: StepResources,
        registry: &StepRegistry,
    ) -> Result<Self> {
        config.validate_with(registry)?;

        let steps = config
            .steps
            .iter()
            .map(|name| registry.resolve(name).map(|kind| kind.build(&config, &resources)))
            .collect::<Result<Vec<_>>>()?;

        let contract = contract::fingerprint(&config, &resources.domains)?;
        info!(
            steps = ?config.steps,
            features = config.features.len(),
            contract = %contract,
            "Feature pipeline built"
        );

        Ok(Self {
            config,
            steps,
            domains: resources.domains,
            contract,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn feature_names(&self) -> &[String] {
        &self.config.features
    }

    pub fn rescale_spec(&self) -> &RescaleSpec {
        &self.config.rescale
    }

    pub fn domains(&self) -> &CategoricalDomains {
        &self.domains
    }

    pub fn contract(&self) -> &str {
        &self.contract
    }

    /// Run the per-record steps in configured order. Batch-only steps are skipped.
    pub fn transform_record(&self, record: PropertyRecord) -> Result<PropertyRecord> {
        let mut current = record;
        for step in &self.steps {
            if step.is_batch_only() {
                debug!(step = step.step_name(), "Skipping batch-only step for single record");
                continue;
            }
            debug!(step = step.step_name(), "Applying step");
            current = step.transform(current)?;
        }
        Ok(current)
    }

    /// Transform one record into a feature vector. The input is never mutated.
    pub fn apply(&self, record: &PropertyRecord) -> Result<FeatureVector> {
        let started = Instant::now();
        let transformed = self.transform_record(record.clone())?;
        let vector = self.finalize(&transformed);
        metrics::prediction::pipeline_duration(started.elapsed().as_secs_f64());
        vector
    }

    /// Keep exactly the contract's features, in order, and require each to be
    /// a finite number.
    fn finalize(&self, record: &PropertyRecord) -> Result<FeatureVector> {
        let mut values = Vec::with_capacity(self.config.features.len());
        for feature in &self.config.features {
            values.push(model_ready_value(feature, record)?);
        }
        Ok(FeatureVector::from_parts(self.config.features.clone(), values))
    }

    /// Apply the full pipeline, batch-only steps included, to raw listings.
    ///
    /// Steps run in configured order. A record that fails a per-record step
    /// or the completeness check is dropped and counted in `rejected`; a
    /// failing batch step fails the whole build.
    pub fn build_training_features(&self, records: Vec<PropertyRecord>) -> Result<TrainingSet> {
        let input_count = records.len();
        let mut current = records;
        let mut rejected = 0usize;

        for step in &self.steps {
            if step.is_batch_only() {
                let before = current.len();
                current = step.transform_batch(current)?;
                debug!(
                    step = step.step_name(),
                    before,
                    after = current.len(),
                    "Applied batch step"
                );
                continue;
            }

            let mut next = Vec::with_capacity(current.len());
            for record in current {
                match step.transform(record) {
                    Ok(r) => next.push(r),
                    Err(e) => {
                        warn!(step = step.step_name(), error = %e, "Dropping listing from training set");
                        rejected += 1;
                    }
                }
            }
            current = next;
        }

        let mut rows = Vec::with_capacity(current.len());
        let mut targets = Vec::with_capacity(current.len());
        for record in &current {
            let row = self.finalize(record);
            let target = model_ready_value(&self.config.target, record);
            match (row, target) {
                (Ok(row), Ok(target)) => {
                    rows.push(row);
                    targets.push(target);
                }
                (Err(e), _) | (_, Err(e)) => {
                    warn!(error = %e, "Dropping listing from training set");
                    rejected += 1;
                }
            }
        }

        metrics::training::rows_built(rows.len());
        metrics::training::rows_failed(rejected);
        info!(
            input = input_count,
            built = rows.len(),
            rejected,
            "Training features built"
        );

        Ok(TrainingSet {
            feature_names: self.config.features.clone(),
            rows,
            targets,
            rejected,
            contract: self.contract.clone(),
        })
    }
}

fn model_ready_value(field: &str, record: &PropertyRecord) -> Result<f64> {
    if !record.contains(field) {
        return Err(PipelineError::incomplete(field, "field is absent"));
    }
    match record.get(field) {
        FieldValue::Number(n) if n.is_finite() => Ok(*n),
        FieldValue::Number(n) => Err(PipelineError::incomplete(
            field,
            format!("value {} is not finite", n),
        )),
        FieldValue::Text(s) => Err(PipelineError::incomplete(
            field,
            format!("non-numeric value \"{}\"", s),
        )),
        FieldValue::Missing => Err(PipelineError::incomplete(field, "value is missing")),
    }
}
