use crate::constants::STEP_REPLACE_NULLS;
use crate::error::Result;
use crate::pipeline::steps::PipelineStep;
use crate::types::{FieldValue, PropertyRecord};

/// Defaults amenity fields to 0 when they are missing or absent.
///
/// Only the configured fields are touched; every other missing value stays missing.
#[derive(Debug, Clone)]
pub struct FillMissing {
    fields: Vec<String>,
}

impl FillMissing {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }
}

impl PipelineStep for FillMissing {
    fn step_name(&self) -> &'static str {
        STEP_REPLACE_NULLS
    }

    fn transform(&self, mut record: PropertyRecord) -> Result<PropertyRecord> {
        for field in &self.fields {
            if record.get(field).is_missing() {
                record.set(field.as_str(), FieldValue::Number(0.0));
            }
        }
        Ok(record)
    }
}
