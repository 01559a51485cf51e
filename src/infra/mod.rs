pub mod domain_store;
pub mod model_artifact;
pub mod record_source;

pub use domain_store::DomainStore;
pub use model_artifact::LinearModelArtifact;
