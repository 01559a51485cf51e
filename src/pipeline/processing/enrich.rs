use std::sync::Arc;
use tracing::{debug, warn};

use crate::constants::{POSTAL_CODE, STEP_JOIN_DATA};
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::steps::PipelineStep;
use crate::reference::{postal_code_of, ReferenceDataset};
use crate::types::{FieldValue, PropertyRecord};

/// What the reference join found for a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    /// Postal code mapped to a geographic code known to the attribute tables
    Hit { code: i64 },
    /// No usable postal code, or no reference data for it. Enrichment fields
    /// are set to missing; this is not an error.
    Miss,
}

/// Left-joins a record against the reference tables on the geographic code
/// derived from its postal code.
///
/// One record in, one record out. Original fields are never overwritten.
pub struct Enricher {
    reference: Arc<ReferenceDataset>,
}

impl Enricher {
    pub fn new(reference: Arc<ReferenceDataset>) -> Self {
        Self { reference }
    }

    pub fn enrich(&self, mut record: PropertyRecord) -> (PropertyRecord, EnrichmentOutcome) {
        let code = postal_code_of(record.get(POSTAL_CODE))
            .and_then(|postal| self.reference.code_for_postal(postal));
        let fields = code.and_then(|code| self.reference.lookup(code).map(|f| (code, f)));

        let outcome = match fields {
            Some((code, fields)) => {
                self.append(&mut record, self.reference.code_column(), FieldValue::Number(code as f64));
                for (name, value) in fields {
                    self.append(&mut record, name, value);
                }
                EnrichmentOutcome::Hit { code }
            }
            None => {
                let code_value = code
                    .map(|c| FieldValue::Number(c as f64))
                    .unwrap_or(FieldValue::Missing);
                self.append(&mut record, self.reference.code_column(), code_value);
                for name in self.reference.enrichment_fields() {
                    self.append(&mut record, name, FieldValue::Missing);
                }
                EnrichmentOutcome::Miss
            }
        };
        (record, outcome)
    }

    fn append(&self, record: &mut PropertyRecord, name: &str, value: FieldValue) {
        if record.contains(name) {
            warn!(field = name, "Record already carries a reference field; keeping the original");
            return;
        }
        record.set(name, value);
    }
}

impl PipelineStep for Enricher {
    fn step_name(&self) -> &'static str {
        STEP_JOIN_DATA
    }

    fn transform(&self, record: PropertyRecord) -> Result<PropertyRecord> {
        let (record, outcome) = self.enrich(record);
        match outcome {
            EnrichmentOutcome::Hit { code } => {
                metrics::enrichment::hit();
                debug!(code, "Record enriched");
            }
            EnrichmentOutcome::Miss => {
                metrics::enrichment::miss();
                debug!(postal_code = %record.get(POSTAL_CODE), "No reference data for postal code");
            }
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn enricher() -> Enricher {
        let dataset = ReferenceDataset::from_json_tables(
            json!([
                { "PostalCode": 9940, "Refnis": 44021 },
                { "PostalCode": 9940, "Refnis": 44083 },
                { "PostalCode": 3000, "Refnis": 24062 }
            ]),
            vec![
                ("population_density", json!([
                    { "Refnis": 44021, "PopDensity": 312.5 },
                    { "Refnis": 44083, "PopDensity": 150.0 }
                ])),
                ("property_value", json!([
                    { "Refnis": 44021, "MedianPropertyValue": 289000.0 }
                ])),
            ],
            "Refnis",
            "PostalCode",
        )
        .unwrap();
        Enricher::new(Arc::new(dataset))
    }

    fn record(postal: FieldValue) -> PropertyRecord {
        let mut record = PropertyRecord::new();
        record.set("PostalCode", postal);
        record.set("LivingArea", 155.0);
        record
    }

    #[test]
    fn test_known_postal_code_is_fully_enriched() {
        let (out, outcome) = enricher().enrich(record(FieldValue::Number(9940.0)));
        assert_eq!(outcome, EnrichmentOutcome::Hit { code: 44021 });
        assert_eq!(out.number("Refnis"), Some(44021.0));
        assert_eq!(out.number("PopDensity"), Some(312.5));
        assert_eq!(out.number("MedianPropertyValue"), Some(289000.0));
        // Original fields preserved
        assert_eq!(out.number("LivingArea"), Some(155.0));
    }

    #[test]
    fn test_postal_code_as_text_is_joined() {
        let (_, outcome) = enricher().enrich(record(FieldValue::Text("9940".into())));
        assert_eq!(outcome, EnrichmentOutcome::Hit { code: 44021 });
    }

    #[test]
    fn test_unknown_postal_code_sets_fields_missing() {
        let (out, outcome) = enricher().enrich(record(FieldValue::Number(1234.0)));
        assert_eq!(outcome, EnrichmentOutcome::Miss);
        assert!(out.get("Refnis").is_missing());
        assert!(out.get("PopDensity").is_missing());
        assert!(out.get("MedianPropertyValue").is_missing());
        assert!(out.contains("PopDensity"));
    }

    #[test]
    fn test_mapped_code_without_attributes_is_a_miss() {
        let (out, outcome) = enricher().enrich(record(FieldValue::Number(3000.0)));
        assert_eq!(outcome, EnrichmentOutcome::Miss);
        assert_eq!(out.number("Refnis"), Some(24062.0));
        assert!(out.get("PopDensity").is_missing());
    }

    #[test]
    fn test_enrichment_does_not_overwrite_original_fields() {
        let mut input = record(FieldValue::Number(9940.0));
        input.set("PopDensity", 1.0);
        let (out, _) = enricher().enrich(input);
        assert_eq!(out.number("PopDensity"), Some(1.0));
    }

    #[test]
    fn test_transform_never_fails_on_miss() {
        let out = enricher().transform(record(FieldValue::Missing)).unwrap();
        assert!(out.get("MedianPropertyValue").is_missing());
    }
}
