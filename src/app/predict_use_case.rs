use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::app::ports::PriceModel;
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::infra::{DomainStore, LinearModelArtifact};
use crate::observability::metrics;
use crate::pipeline::{FeaturePipeline, StepResources};
use crate::reference::ReferenceDataStore;
use crate::types::PropertyRecord;

/// A successful price prediction
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub id: Uuid,
    /// Price in currency units
    pub price: f64,
    /// Model output before the inverse rescale
    pub raw_output: f64,
    pub predicted_at: DateTime<Utc>,
}

impl Prediction {
    /// Euro amount with thousands separators, e.g. `€1,234,567.89`
    pub fn formatted_price(&self) -> String {
        let fixed = format!("{:.2}", self.price);
        let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
        let digits = whole.len();
        let mut grouped = String::with_capacity(digits + digits / 3);
        for (idx, ch) in whole.chars().enumerate() {
            if idx > 0 && (digits - idx) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        format!("€{}.{}", grouped, cents)
    }
}

/// Use case for predicting a sale price from one raw property record
pub struct PredictionService {
    pipeline: FeaturePipeline,
    model: Arc<dyn PriceModel>,
}

impl PredictionService {
    /// Pair a pipeline with a model, refusing models trained on another contract.
    pub fn new(pipeline: FeaturePipeline, model: Arc<dyn PriceModel>) -> Result<Self> {
        if model.feature_names() != pipeline.feature_names() {
            return Err(PipelineError::ContractMismatch {
                expected: pipeline.feature_names().join(","),
                actual: model.feature_names().join(","),
            });
        }
        if let Some(trained_under) = model.contract() {
            if trained_under != pipeline.contract() {
                return Err(PipelineError::ContractMismatch {
                    expected: pipeline.contract().to_string(),
                    actual: trained_under.to_string(),
                });
            }
        }
        Ok(Self { pipeline, model })
    }

    /// Load reference tables, domains and model named by the configuration.
    /// Every failure here is a startup failure.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::from_store(config, &ReferenceDataStore::new(config.reference.clone()))
    }

    /// Like `from_config`, but shares reference tables already held by `store`.
    pub fn from_store(config: &Config, store: &ReferenceDataStore) -> Result<Self> {
        let reference = store.load()?;
        let domains = Arc::new(DomainStore::new(&config.model.domains).load()?);
        let pipeline = FeaturePipeline::build(
            config.pipeline.clone(),
            StepResources { reference, domains },
        )?;
        let model = Arc::new(LinearModelArtifact::load(&config.model.artifact)?);
        Self::new(pipeline, model)
    }

    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    /// Predict a price. On any failure a structured error is returned and no
    /// price is produced.
    pub fn predict(&self, record: &PropertyRecord) -> Result<Prediction> {
        let id = Uuid::new_v4();
        let span = info_span!("predict", prediction_id = %id);
        let _enter = span.enter();

        match self.run(id, record) {
            Ok(prediction) => {
                metrics::prediction::success(prediction.price);
                info!(price = prediction.price, "Prediction complete");
                Ok(prediction)
            }
            Err(e) => {
                metrics::prediction::error(e.kind());
                warn!(error = %e, "Prediction failed");
                Err(e)
            }
        }
    }

    fn run(&self, id: Uuid, record: &PropertyRecord) -> Result<Prediction> {
        self.validate(record)?;
        let features = self.pipeline.apply(record)?;

        let raw_output = self.model.infer(&features)?;
        if !raw_output.is_finite() {
            return Err(PipelineError::Model(format!(
                "model returned a non-finite output: {}",
                raw_output
            )));
        }

        let price = if self.pipeline.config().rescales_target() {
            self.pipeline.rescale_spec().inverse(raw_output)
        } else {
            raw_output
        };
        if !price.is_finite() || price < 0.0 {
            return Err(PipelineError::Model(format!(
                "model output {} does not map to a valid price ({})",
                raw_output, price
            )));
        }

        Ok(Prediction {
            id,
            price,
            raw_output,
            predicted_at: Utc::now(),
        })
    }

    fn validate(&self, record: &PropertyRecord) -> Result<()> {
        for field in &self.pipeline.config().required_fields {
            if record.get(field).is_missing() {
                return Err(PipelineError::MissingField(field.clone()));
            }
        }
        Ok(())
    }
}
