use std::sync::Arc;
use tracing::info;

use crate::constants::STEP_FILTER_ROWS;
use crate::error::Result;
use crate::pipeline::processing::encode::CategoricalDomains;
use crate::pipeline::processing::filter::RecordFilter;
use crate::pipeline::{FeaturePipeline, PipelineConfig, StepResources, TrainingSet};
use crate::reference::ReferenceDataset;
use crate::types::PropertyRecord;

/// Use case for turning raw listings into a training corpus.
///
/// Domains are fitted here, once, and must be persisted and handed to the
/// inference side unchanged.
pub struct TrainingUseCase {
    config: PipelineConfig,
    reference: Arc<ReferenceDataset>,
}

impl TrainingUseCase {
    pub fn new(config: PipelineConfig, reference: Arc<ReferenceDataset>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, reference })
    }

    /// Fit the categorical domain table over the listings that qualify as
    /// sale observations (all listings when the pipeline has no filter).
    pub fn fit_domains(&self, records: &[PropertyRecord]) -> CategoricalDomains {
        let domains = if self.config.has_step(STEP_FILTER_ROWS) {
            let filter = RecordFilter::new(self.config.target.clone());
            CategoricalDomains::fit(
                records.iter().filter(|r| filter.accepts(r)),
                &self.config.features,
            )
        } else {
            CategoricalDomains::fit(records, &self.config.features)
        };
        info!(
            listings = records.len(),
            domains = domains.fields().count(),
            "Categorical domains fitted"
        );
        domains
    }

    /// Build model-ready rows with a previously fitted domain table.
    pub fn build_features(
        &self,
        records: Vec<PropertyRecord>,
        domains: Arc<CategoricalDomains>,
    ) -> Result<TrainingSet> {
        let pipeline = FeaturePipeline::build(
            self.config.clone(),
            StepResources {
                reference: Arc::clone(&self.reference),
                domains,
            },
        )?;
        pipeline.build_training_features(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::encode::Encoded;
    use serde_json::json;

    fn use_case() -> TrainingUseCase {
        let reference = ReferenceDataset::from_json_tables(
            json!([{ "PostalCode": 9940, "Refnis": 44021 }]),
            vec![("population_density", json!([{ "Refnis": 44021, "PopDensity": 312.5 }]))],
            "Refnis",
            "PostalCode",
        )
        .unwrap();
        let config = PipelineConfig::with_features(["LivingArea", "PropertySubType", "PopDensity"]);
        TrainingUseCase::new(config, Arc::new(reference)).unwrap()
    }

    fn listing(sub_type: &str, sale_type: &str) -> PropertyRecord {
        let mut record = PropertyRecord::new();
        record.set("PostalCode", 9940.0);
        record.set("LivingArea", 120.0);
        record.set("Price", 250_000.0);
        record.set("SaleType", sale_type);
        record.set("PropertySubType", sub_type);
        record
    }

    #[test]
    fn test_fit_skips_listings_the_filter_rejects() {
        let records = vec![
            listing("HOUSE", "residential_sale"),
            listing("CASTLE", "annuity_lump_sum"),
        ];
        let domains = use_case().fit_domains(&records);
        let sub_type = domains.get("PropertySubType").unwrap();
        assert_eq!(sub_type.encode("HOUSE"), Encoded::Known(0));
        assert_eq!(sub_type.encode("CASTLE"), Encoded::Unknown);
    }

    #[test]
    fn test_build_features_uses_fitted_codes() {
        let use_case = use_case();
        let records = vec![
            listing("VILLA", "residential_sale"),
            listing("HOUSE", "residential_sale"),
        ];
        let domains = Arc::new(use_case.fit_domains(&records));
        let set = use_case.build_features(records, domains).unwrap();

        assert_eq!(set.rows.len(), 2);
        assert_eq!(set.rows[0].get("PropertySubType"), Some(1.0));
        assert_eq!(set.rows[1].get("PropertySubType"), Some(0.0));
        assert_eq!(set.rows[0].get("PopDensity"), Some(312.5));
    }
}
