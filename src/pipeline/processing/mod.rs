// Pipeline processing: filtering, enrichment, encoding, and rescaling

pub mod columns;
pub mod encode;
pub mod enrich;
pub mod fill;
pub mod filter;
pub mod rescale;

pub use encode::{CategoricalDomain, CategoricalDomains, CategoricalEncoder, Encoded, UNKNOWN_CODE};
pub use enrich::{EnrichmentOutcome, Enricher};
pub use filter::RecordFilter;
pub use rescale::{NumericRescaler, RescaleSpec};
