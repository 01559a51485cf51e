use crate::error::Result;
use crate::types::FeatureVector;

/// A trained regression model, consumed as an opaque function over the
/// feature vector. Implementations are loaded once and shared read-only.
pub trait PriceModel: Send + Sync {
    /// Ordered feature names the model was trained on
    fn feature_names(&self) -> &[String];

    /// Fingerprint of the feature contract the model was trained under, if recorded
    fn contract(&self) -> Option<&str> {
        None
    }

    /// Raw model output, in rescaled (log) space
    fn infer(&self, features: &FeatureVector) -> Result<f64>;
}
