use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{BEDROOM_COUNT, GARDEN_AREA, LIVING_AREA, PRICE, STEP_RESCALE};
use crate::error::{PipelineError, Result};
use crate::pipeline::steps::PipelineStep;
use crate::types::{FieldValue, PropertyRecord};

/// Log compression applied to heavy-tailed numeric fields.
///
/// `forward(x) = log_base(x + offset)` and `inverse(y) = base^y - offset`.
/// The model's output lives in forward space, so `inverse` is what turns a
/// raw prediction back into a price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescaleSpec {
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
    #[serde(default = "default_offset")]
    pub offset: f64,
    #[serde(default = "default_base")]
    pub base: f64,
}

fn default_fields() -> Vec<String> {
    [PRICE, LIVING_AREA, BEDROOM_COUNT, GARDEN_AREA]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_offset() -> f64 {
    1.0
}

fn default_base() -> f64 {
    10.0
}

impl Default for RescaleSpec {
    fn default() -> Self {
        Self {
            fields: default_fields(),
            offset: default_offset(),
            base: default_base(),
        }
    }
}

impl RescaleSpec {
    pub fn validate(&self) -> Result<()> {
        if !(self.base.is_finite() && self.base > 0.0 && self.base != 1.0) {
            return Err(PipelineError::Config(format!(
                "Rescale base must be positive and not 1, got {}",
                self.base
            )));
        }
        if !(self.offset.is_finite() && self.offset > 0.0) {
            return Err(PipelineError::Config(format!(
                "Rescale offset must be positive, got {}",
                self.offset
            )));
        }
        Ok(())
    }

    pub fn applies_to(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn forward(&self, value: f64) -> f64 {
        let shifted = value + self.offset;
        if self.base == 10.0 {
            shifted.log10()
        } else {
            shifted.log(self.base)
        }
    }

    pub fn inverse(&self, value: f64) -> f64 {
        let scaled = if self.base == 10.0 {
            10f64.powf(value)
        } else {
            self.base.powf(value)
        };
        scaled - self.offset
    }
}

/// Applies `RescaleSpec::forward` to the configured fields of a record.
#[derive(Debug, Clone)]
pub struct NumericRescaler {
    spec: RescaleSpec,
}

impl NumericRescaler {
    pub fn new(spec: RescaleSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &RescaleSpec {
        &self.spec
    }

    /// Forward-transform one value, rejecting inputs outside `[0, inf)`.
    pub fn forward(&self, field: &str, value: f64) -> Result<f64> {
        if !value.is_finite() || value < 0.0 {
            return Err(PipelineError::InvalidValue {
                field: field.to_string(),
                value,
            });
        }
        Ok(self.spec.forward(value))
    }

    pub fn inverse(&self, value: f64) -> f64 {
        self.spec.inverse(value)
    }
}

impl PipelineStep for NumericRescaler {
    fn step_name(&self) -> &'static str {
        STEP_RESCALE
    }

    fn transform(&self, mut record: PropertyRecord) -> Result<PropertyRecord> {
        for (field, value) in record.iter_mut() {
            if !self.spec.applies_to(field) {
                continue;
            }
            // Missing and non-numeric values are left for the completeness check
            if let FieldValue::Number(n) = value {
                let scaled = self.forward(field, *n)?;
                debug!(field, from = *n, to = scaled, "Rescaled field");
                *value = FieldValue::Number(scaled);
            }
        }
        Ok(record)
    }
}
