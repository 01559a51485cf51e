// Feature pipeline: step registry, configuration, and processing steps

pub mod feature_pipeline;
pub mod pipeline_config;
pub mod processing;
pub mod registry;
pub mod steps;

// Re-export key types for convenience
pub use feature_pipeline::{FeaturePipeline, TrainingSet};
pub use pipeline_config::PipelineConfig;
pub use registry::{StepKind, StepRegistry, StepResources};
pub use steps::PipelineStep;
