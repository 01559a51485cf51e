use crate::error::Result;
use crate::types::PropertyRecord;

/// Common trait for all pipeline steps
pub trait PipelineStep: Send + Sync {
    /// Get the identifier of this pipeline step
    fn step_name(&self) -> &'static str;

    /// Transform a single record. Each call owns its record; steps hold no
    /// per-request state.
    fn transform(&self, record: PropertyRecord) -> Result<PropertyRecord>;

    /// Whether this step only makes sense over a batch of listings
    fn is_batch_only(&self) -> bool {
        false
    }

    /// Transform a batch of records. Batch-only steps override this; the
    /// default applies `transform` to every record.
    fn transform_batch(&self, records: Vec<PropertyRecord>) -> Result<Vec<PropertyRecord>> {
        records.into_iter().map(|r| self.transform(r)).collect()
    }
}
