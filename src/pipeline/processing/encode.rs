use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::constants::{CONDITION, EPC_SCORE, STEP_ENCODE_CATEGORICAL};
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::steps::PipelineStep;
use crate::types::{FieldValue, PropertyRecord};

/// Code assigned to any category value a domain does not recognize.
pub const UNKNOWN_CODE: i64 = -1;

/// Current on-disk layout of the persisted domain table
pub const DOMAINS_VERSION: u32 = 1;

const CONDITION_LADDER: [&str; 6] = [
    "TO_RESTORE",
    "TO_RENOVATE",
    "TO_BE_DONE_UP",
    "GOOD",
    "JUST_RENOVATED",
    "AS_NEW",
];

// Worst to best
const EPC_TIERS: [&str; 9] = ["G", "F", "E", "D", "C", "B", "A", "A+", "A++"];

/// How a raw label is cleaned up before lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelNormalization {
    /// Trimmed, otherwise verbatim
    Exact,
    /// Compound labels such as `A_B` are cut down to their leading tier
    LeadingTier,
}

impl LabelNormalization {
    pub fn apply<'a>(&self, raw: &'a str) -> &'a str {
        let trimmed = raw.trim();
        match self {
            LabelNormalization::Exact => trimmed,
            LabelNormalization::LeadingTier => trimmed.split('_').next().unwrap_or(trimmed).trim(),
        }
    }
}

/// Result of looking a value up in a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoded {
    Known(i64),
    Unknown,
}

impl Encoded {
    pub fn code(&self) -> i64 {
        match self {
            Encoded::Known(code) => *code,
            Encoded::Unknown => UNKNOWN_CODE,
        }
    }
}

/// A fixed value -> code table for one categorical field.
/// Codes are never renumbered once the table exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalDomain {
    codes: BTreeMap<String, i64>,
    normalization: LabelNormalization,
}

impl CategoricalDomain {
    /// Build a domain whose codes follow the order of `values`, starting at 0.
    pub fn ordinal<I, S>(values: I, normalization: LabelNormalization) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let codes = values
            .into_iter()
            .enumerate()
            .map(|(idx, v)| (v.into(), idx as i64))
            .collect();
        Self {
            codes,
            normalization,
        }
    }

    pub fn condition() -> Self {
        Self::ordinal(CONDITION_LADDER, LabelNormalization::Exact)
    }

    pub fn epc_score() -> Self {
        Self::ordinal(EPC_TIERS, LabelNormalization::LeadingTier)
    }

    pub fn encode(&self, raw: &str) -> Encoded {
        self.codes
            .get(self.normalization.apply(raw))
            .map(|code| Encoded::Known(*code))
            .unwrap_or(Encoded::Unknown)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// All categorical domains of the feature contract.
///
/// Built once at training time (`fit`), persisted, and reused verbatim at
/// inference so the same value always maps to the same code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalDomains {
    pub version: u32,
    domains: BTreeMap<String, CategoricalDomain>,
}

impl Default for CategoricalDomains {
    fn default() -> Self {
        Self::fixed()
    }
}

impl CategoricalDomains {
    /// Only the hand-ranked domains (condition ladder and energy class).
    pub fn fixed() -> Self {
        let mut domains = BTreeMap::new();
        domains.insert(CONDITION.to_string(), CategoricalDomain::condition());
        domains.insert(EPC_SCORE.to_string(), CategoricalDomain::epc_score());
        Self {
            version: DOMAINS_VERSION,
            domains,
        }
    }

    /// Fixed domains plus a fitted domain for every feature that holds text in
    /// the training corpus. Fitted codes follow sorted value order, so the
    /// result does not depend on record order.
    pub fn fit<'a, I>(records: I, features: &[String]) -> Self
    where
        I: IntoIterator<Item = &'a PropertyRecord>,
    {
        let mut result = Self::fixed();
        let mut seen: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();

        for record in records {
            for feature in features {
                if result.domains.contains_key(feature) {
                    continue;
                }
                if let Some(text) = record.text(feature) {
                    seen.entry(feature.as_str())
                        .or_default()
                        .insert(text.trim().to_string());
                }
            }
        }

        for (feature, values) in seen {
            debug!(field = feature, categories = values.len(), "Fitted categorical domain");
            result.domains.insert(
                feature.to_string(),
                CategoricalDomain::ordinal(values, LabelNormalization::Exact),
            );
        }
        result
    }

    pub fn get(&self, field: &str) -> Option<&CategoricalDomain> {
        self.domains.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, domain: CategoricalDomain) {
        self.domains.insert(field.into(), domain);
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(|k| k.as_str())
    }
}

/// Replaces categorical values with their domain codes.
///
/// Text in a field with no domain is left untouched; the pipeline's
/// completeness check reports it by name.
pub struct CategoricalEncoder {
    domains: Arc<CategoricalDomains>,
}

impl CategoricalEncoder {
    pub fn new(domains: Arc<CategoricalDomains>) -> Self {
        Self { domains }
    }
}

impl PipelineStep for CategoricalEncoder {
    fn step_name(&self) -> &'static str {
        STEP_ENCODE_CATEGORICAL
    }

    fn transform(&self, mut record: PropertyRecord) -> Result<PropertyRecord> {
        for (field, value) in record.iter_mut() {
            let Some(domain) = self.domains.get(field) else {
                continue;
            };
            let encoded = match value {
                FieldValue::Text(raw) => domain.encode(raw),
                FieldValue::Number(n) => {
                    warn!(field, value = *n, "Numeric value in categorical field");
                    Encoded::Unknown
                }
                FieldValue::Missing => continue,
            };
            if encoded == Encoded::Unknown {
                metrics::encoding::unknown_category(field);
            }
            *value = FieldValue::Number(encoded.code() as f64);
        }
        Ok(record)
    }
}
