pub mod config;
pub mod constants;
pub mod contract;
pub mod error;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod reference;
pub mod types;

// Application use cases and the adapters they run against
pub mod app;
pub mod infra;

pub use app::predict_use_case::{Prediction, PredictionService};
pub use app::training_use_case::TrainingUseCase;
pub use config::Config;
pub use error::{PipelineError, Result};
pub use types::{FeatureVector, FieldValue, PropertyRecord};
