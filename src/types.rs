use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{PipelineError, Result};

/// A single field value inside a property record.
///
/// `Missing` is an explicit marker for an absent optional field and is never
/// treated as zero by any step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
#[serde(try_from = "serde_json::Value")]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Missing,
}

static MISSING: FieldValue = FieldValue::Missing;

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }
}

impl TryFrom<serde_json::Value> for FieldValue {
    type Error = String;

    fn try_from(value: serde_json::Value) -> std::result::Result<Self, Self::Error> {
        use serde_json::Value;
        match value {
            Value::Null => Ok(FieldValue::Missing),
            Value::Bool(b) => Ok(FieldValue::Number(if b { 1.0 } else { 0.0 })),
            Value::Number(n) => n
                .as_f64()
                .map(FieldValue::Number)
                .ok_or_else(|| format!("number {} is not representable as f64", n)),
            Value::String(s) => Ok(FieldValue::Text(s)),
            Value::Array(_) | Value::Object(_) => {
                Err("nested arrays and objects are not valid field values".to_string())
            }
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "\"{}\"", s),
            FieldValue::Missing => write!(f, "missing"),
        }
    }
}

/// One raw property described as field name -> value.
///
/// Fields are kept in a sorted map so every step iterates them in the same order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl PropertyRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON object.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(PipelineError::data_load(
                "property record",
                "expected a JSON object of field -> value",
            ));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Returns the field value, or `Missing` when the field is absent.
    pub fn get(&self, field: &str) -> &FieldValue {
        self.fields.get(field).unwrap_or(&MISSING)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).as_number()
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).as_text()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn set_missing(&mut self, field: impl Into<String>) {
        self.fields.insert(field.into(), FieldValue::Missing);
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.remove(field)
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.fields.retain(|name, _| keep(name));
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut FieldValue)> {
        self.fields.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for PropertyRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = PropertyRecord::new();
        for (k, v) in iter {
            record.set(k, v);
        }
        record
    }
}

/// The fully numeric, fixed-schema input the model consumes.
/// Entries follow the order of the model feature contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub(crate) fn from_parts(names: Vec<String>, values: Vec<f64>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.values[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names.iter().map(|n| n.as_str()).zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
