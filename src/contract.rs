use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::pipeline::processing::encode::CategoricalDomains;
use crate::pipeline::processing::rescale::RescaleSpec;
use crate::pipeline::PipelineConfig;

#[derive(Serialize)]
struct ContractView<'a> {
    steps: &'a [String],
    features: &'a [String],
    target: &'a str,
    rescale: &'a RescaleSpec,
    domains: &'a CategoricalDomains,
}

/// Fingerprint of everything that shapes the feature vector: step order,
/// feature list, target, rescale parameters and category codes.
///
/// Training stamps it into its output; inference compares it against the
/// model artifact.
pub fn fingerprint(config: &PipelineConfig, domains: &CategoricalDomains) -> Result<String> {
    let view = ContractView {
        steps: &config.steps,
        features: &config.features,
        target: &config.target,
        rescale: &config.rescale,
        domains,
    };
    // Every map in the view is ordered, so the rendering is canonical
    let canonical = serde_json::to_vec(&view)?;

    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    Ok(hex::encode(hasher.finalize()))
}
