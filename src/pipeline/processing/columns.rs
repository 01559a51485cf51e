use std::collections::BTreeSet;

use crate::constants::STEP_DROP_COLUMNS;
use crate::error::Result;
use crate::pipeline::pipeline_config::PipelineConfig;
use crate::pipeline::steps::PipelineStep;
use crate::types::PropertyRecord;

/// Drops every column that is neither a model feature nor the training target.
#[derive(Debug, Clone)]
pub struct ColumnSelector {
    keep: BTreeSet<String>,
}

impl ColumnSelector {
    pub fn for_contract(config: &PipelineConfig) -> Self {
        let mut keep: BTreeSet<String> = config.features.iter().cloned().collect();
        keep.insert(config.target.clone());
        Self { keep }
    }
}

impl PipelineStep for ColumnSelector {
    fn step_name(&self) -> &'static str {
        STEP_DROP_COLUMNS
    }

    fn transform(&self, mut record: PropertyRecord) -> Result<PropertyRecord> {
        record.retain(|name| self.keep.contains(name));
        Ok(record)
    }
}
