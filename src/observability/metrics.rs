//! Simple metrics module for the price predictor
//!
//! This module provides a straightforward API for recording metrics using
//! the standard Prometheus naming conventions. Recording is a no-op until a
//! recorder is installed with [`init`].

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fmt;
use tracing::info;

use crate::error::{PipelineError, Result};

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Prediction metrics
    PredictionSuccess,
    PredictionError,
    PredictionPrice,
    PipelineDuration,

    // Enrichment metrics
    EnrichmentHits,
    EnrichmentMisses,

    // Filter metrics
    FilterRecordsRejected,
    FilterBatchSize,
    FilterBatchAccepted,

    // Encoding metrics
    EncodingUnknownCategories,

    // Training metrics
    TrainingRowsBuilt,
    TrainingRowsFailed,
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            // Prediction metrics
            MetricName::PredictionSuccess => "immo_prediction_success_total",
            MetricName::PredictionError => "immo_prediction_error_total",
            MetricName::PredictionPrice => "immo_prediction_price",
            MetricName::PipelineDuration => "immo_pipeline_duration_seconds",

            // Enrichment metrics
            MetricName::EnrichmentHits => "immo_enrichment_hits_total",
            MetricName::EnrichmentMisses => "immo_enrichment_misses_total",

            // Filter metrics
            MetricName::FilterRecordsRejected => "immo_filter_records_rejected_total",
            MetricName::FilterBatchSize => "immo_filter_batch_size",
            MetricName::FilterBatchAccepted => "immo_filter_batch_accepted",

            // Encoding metrics
            MetricName::EncodingUnknownCategories => "immo_encoding_unknown_categories_total",

            // Training metrics
            MetricName::TrainingRowsBuilt => "immo_training_rows_built_total",
            MetricName::TrainingRowsFailed => "immo_training_rows_failed_total",
        }
    }
}

/// Install the Prometheus recorder and return a handle for rendering snapshots.
pub fn init() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| PipelineError::Config(format!("Failed to install Prometheus recorder: {}", e)))?;
    info!("Metrics system initialized");
    Ok(handle)
}

// ============================================================================
// Prediction Metrics
// ============================================================================

pub mod prediction {
    use super::MetricName;

    /// Record a successful prediction and its price
    pub fn success(price: f64) {
        ::metrics::counter!(MetricName::PredictionSuccess.as_str()).increment(1);
        ::metrics::histogram!(MetricName::PredictionPrice.as_str()).record(price);
    }

    /// Record a failed prediction by error kind
    pub fn error(kind: &'static str) {
        ::metrics::counter!(MetricName::PredictionError.as_str(), "kind" => kind).increment(1);
    }

    /// Record how long the feature pipeline took for one record
    pub fn pipeline_duration(secs: f64) {
        ::metrics::histogram!(MetricName::PipelineDuration.as_str()).record(secs);
    }
}

// ============================================================================
// Enrichment Metrics
// ============================================================================

pub mod enrichment {
    use super::MetricName;

    pub fn hit() {
        ::metrics::counter!(MetricName::EnrichmentHits.as_str()).increment(1);
    }

    pub fn miss() {
        ::metrics::counter!(MetricName::EnrichmentMisses.as_str()).increment(1);
    }
}

// ============================================================================
// Filter Metrics
// ============================================================================

pub mod filter {
    use super::MetricName;

    /// Record a listing the filter rejected, by reason
    pub fn record_rejected(reason: &'static str) {
        ::metrics::counter!(MetricName::FilterRecordsRejected.as_str(), "reason" => reason)
            .increment(1);
    }

    /// Record batch size and how many listings survived
    pub fn batch_processed(total_records: usize, accepted_count: usize) {
        ::metrics::histogram!(MetricName::FilterBatchSize.as_str()).record(total_records as f64);
        ::metrics::histogram!(MetricName::FilterBatchAccepted.as_str())
            .record(accepted_count as f64);
    }
}

// ============================================================================
// Encoding Metrics
// ============================================================================

pub mod encoding {
    use super::MetricName;

    /// Record a category value the domain table did not recognize
    pub fn unknown_category(field: &str) {
        ::metrics::counter!(
            MetricName::EncodingUnknownCategories.as_str(),
            "field" => field.to_string()
        )
        .increment(1);
    }
}

// ============================================================================
// Training Metrics
// ============================================================================

pub mod training {
    use super::MetricName;

    pub fn rows_built(count: usize) {
        ::metrics::counter!(MetricName::TrainingRowsBuilt.as_str()).increment(count as u64);
    }

    pub fn rows_failed(count: usize) {
        ::metrics::counter!(MetricName::TrainingRowsFailed.as_str()).increment(count as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_prefixed() {
        let names = [
            MetricName::PredictionSuccess,
            MetricName::EnrichmentMisses,
            MetricName::FilterRecordsRejected,
            MetricName::EncodingUnknownCategories,
        ];
        for name in names {
            assert!(name.as_str().starts_with("immo_"));
            assert_eq!(name.to_string(), name.as_str());
        }
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        prediction::success(250_000.0);
        enrichment::miss();
        filter::record_rejected("missing_price");
        encoding::unknown_category("Condition");
    }
}
