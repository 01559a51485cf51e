use std::collections::HashMap;
use std::sync::Arc;

use crate::constants::{
    STEP_DROP_COLUMNS, STEP_ENCODE_CATEGORICAL, STEP_FILTER_ROWS, STEP_JOIN_DATA, STEP_RESCALE,
    STEP_REPLACE_NULLS,
};
use crate::error::{PipelineError, Result};
use crate::pipeline::pipeline_config::PipelineConfig;
use crate::pipeline::processing::columns::ColumnSelector;
use crate::pipeline::processing::encode::{CategoricalDomains, CategoricalEncoder};
use crate::pipeline::processing::enrich::Enricher;
use crate::pipeline::processing::fill::FillMissing;
use crate::pipeline::processing::filter::RecordFilter;
use crate::pipeline::processing::rescale::NumericRescaler;
use crate::pipeline::steps::PipelineStep;
use crate::reference::ReferenceDataset;

/// The closed set of transformations a configuration may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    FilterRows,
    ReplaceNulls,
    JoinData,
    DropColumns,
    EncodeCategorical,
    Rescale,
}

impl StepKind {
    pub const ALL: [StepKind; 6] = [
        StepKind::FilterRows,
        StepKind::ReplaceNulls,
        StepKind::JoinData,
        StepKind::DropColumns,
        StepKind::EncodeCategorical,
        StepKind::Rescale,
    ];

    pub fn step_name(&self) -> &'static str {
        match self {
            StepKind::FilterRows => STEP_FILTER_ROWS,
            StepKind::ReplaceNulls => STEP_REPLACE_NULLS,
            StepKind::JoinData => STEP_JOIN_DATA,
            StepKind::DropColumns => STEP_DROP_COLUMNS,
            StepKind::EncodeCategorical => STEP_ENCODE_CATEGORICAL,
            StepKind::Rescale => STEP_RESCALE,
        }
    }

    /// Instantiate the step with the shared read-only resources it needs.
    pub fn build(&self, config: &PipelineConfig, resources: &StepResources) -> Box<dyn PipelineStep> {
        match self {
            StepKind::FilterRows => Box::new(RecordFilter::new(config.target.clone())),
            StepKind::ReplaceNulls => Box::new(FillMissing::new(config.fill_zero_fields.clone())),
            StepKind::JoinData => Box::new(Enricher::new(Arc::clone(&resources.reference))),
            StepKind::DropColumns => Box::new(ColumnSelector::for_contract(config)),
            StepKind::EncodeCategorical => {
                Box::new(CategoricalEncoder::new(Arc::clone(&resources.domains)))
            }
            StepKind::Rescale => Box::new(NumericRescaler::new(config.rescale.clone())),
        }
    }
}

/// Shared, immutable state handed to the steps that need it.
#[derive(Debug, Clone)]
pub struct StepResources {
    pub reference: Arc<ReferenceDataset>,
    pub domains: Arc<CategoricalDomains>,
}

/// Resolves step identifiers to compiled-in transformations.
///
/// Lookups never fall back to anything outside the built-in set: an unknown
/// name is an error, not a reason to go looking for code elsewhere.
pub struct StepRegistry {
    steps: HashMap<&'static str, StepKind>,
}

impl StepRegistry {
    pub fn builtin() -> Self {
        let steps = StepKind::ALL
            .iter()
            .map(|kind| (kind.step_name(), *kind))
            .collect();
        Self { steps }
    }

    pub fn resolve(&self, name: &str) -> Result<StepKind> {
        self.steps
            .get(name)
            .copied()
            .ok_or_else(|| PipelineError::UnknownStep(name.to_string()))
    }

    /// List all registered step identifiers
    pub fn list_steps(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.steps.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
