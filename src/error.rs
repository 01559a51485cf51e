use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to load {source_name}: {reason}")]
    DataLoad { source_name: String, reason: String },

    #[error("Unknown pipeline step: {0}")]
    UnknownStep(String),

    #[error("Field '{field}' is not model-ready after the pipeline: {reason}")]
    IncompleteTransform { field: String, reason: String },

    #[error("Field '{field}' has a value outside the transform domain: {value}")]
    InvalidValue { field: String, value: f64 },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Feature contract mismatch: expected {expected}, found {actual}")]
    ContractMismatch { expected: String, actual: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn data_load(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::DataLoad {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    pub fn incomplete(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::IncompleteTransform {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Short, stable label used for metrics and structured error output.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::DataLoad { .. } => "data_load",
            PipelineError::UnknownStep(_) => "unknown_step",
            PipelineError::IncompleteTransform { .. } => "incomplete_transform",
            PipelineError::InvalidValue { .. } => "invalid_value",
            PipelineError::MissingField(_) => "missing_field",
            PipelineError::ContractMismatch { .. } => "contract_mismatch",
            PipelineError::Config(_) => "config",
            PipelineError::Model(_) => "model",
            PipelineError::Json(_) => "json",
            PipelineError::Toml(_) => "toml",
            PipelineError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_transform_names_field() {
        let err = PipelineError::incomplete("Condition", "value is missing");
        assert_eq!(err.kind(), "incomplete_transform");
        assert!(err.to_string().contains("'Condition'"));
    }
}
