use tracing::debug;

use crate::constants::{BID_STYLE_PRICING, LIVING_AREA, RESIDENTIAL_SALE, SALE_TYPE, STEP_FILTER_ROWS};
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::steps::PipelineStep;
use crate::types::PropertyRecord;

/// Why a listing does not qualify as a sale observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    MissingPrice,
    MissingLivingArea,
    NotResidentialSale,
    BidStylePricing,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::MissingPrice => "missing_price",
            Rejection::MissingLivingArea => "missing_living_area",
            Rejection::NotResidentialSale => "not_residential_sale",
            Rejection::BidStylePricing => "bid_style_pricing",
        }
    }
}

/// Drops listings that are not valid sale observations. Only used when
/// building a training corpus.
#[derive(Debug, Clone)]
pub struct RecordFilter {
    price_field: String,
}

impl RecordFilter {
    pub fn new(price_field: impl Into<String>) -> Self {
        Self {
            price_field: price_field.into(),
        }
    }

    pub fn accepts(&self, record: &PropertyRecord) -> bool {
        self.check(record).is_ok()
    }

    pub fn check(&self, record: &PropertyRecord) -> std::result::Result<(), Rejection> {
        if record.number(&self.price_field).is_none() {
            return Err(Rejection::MissingPrice);
        }
        if record.number(LIVING_AREA).is_none() {
            return Err(Rejection::MissingLivingArea);
        }
        if record.text(SALE_TYPE) != Some(RESIDENTIAL_SALE) {
            return Err(Rejection::NotResidentialSale);
        }
        // An absent flag counts as "not set"
        if record.number(BID_STYLE_PRICING) == Some(1.0) {
            return Err(Rejection::BidStylePricing);
        }
        Ok(())
    }
}

impl PipelineStep for RecordFilter {
    fn step_name(&self) -> &'static str {
        STEP_FILTER_ROWS
    }

    /// A single record has nothing to be filtered against.
    fn transform(&self, record: PropertyRecord) -> Result<PropertyRecord> {
        Ok(record)
    }

    fn is_batch_only(&self) -> bool {
        true
    }

    fn transform_batch(&self, records: Vec<PropertyRecord>) -> Result<Vec<PropertyRecord>> {
        let total = records.len();
        let kept: Vec<PropertyRecord> = records
            .into_iter()
            .filter(|record| match self.check(record) {
                Ok(()) => true,
                Err(reason) => {
                    debug!(reason = reason.as_str(), "Listing rejected by filter");
                    metrics::filter::record_rejected(reason.as_str());
                    false
                }
            })
            .collect();
        metrics::filter::batch_processed(total, kept.len());
        Ok(kept)
    }
}
