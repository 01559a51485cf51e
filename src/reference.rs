//! Static geographic lookup tables.
//!
//! The dataset is loaded once, then shared read-only (`Arc`) by every
//! enrichment. Refreshing it is an explicit administrative call
//! (`ReferenceDataStore::reload`), never something a request triggers.

use once_cell::sync::OnceCell;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::config::ReferenceTablesConfig;
use crate::error::{PipelineError, Result};
use crate::types::FieldValue;

type Row = Map<String, Value>;

/// One attribute table joined on the geographic code.
#[derive(Debug, Clone)]
pub struct AttributeTable {
    name: String,
    columns: Vec<String>,
    rows: HashMap<i64, Vec<Option<f64>>>,
}

impl AttributeTable {
    fn from_rows(name: &str, rows: Vec<Row>, code_column: &str) -> Result<Self> {
        if rows.is_empty() {
            return Err(PipelineError::data_load(name, "table contains no rows"));
        }

        let columns: Vec<String> = rows
            .iter()
            .flat_map(|row| row.keys())
            .filter(|k| k.as_str() != code_column)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if columns.is_empty() {
            return Err(PipelineError::data_load(
                name,
                format!("no attribute columns besides '{}'", code_column),
            ));
        }

        let mut indexed = HashMap::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            let code = parse_code(name, idx, row.get(code_column), code_column)?;
            let mut values = Vec::with_capacity(columns.len());
            for column in &columns {
                values.push(parse_attribute(name, idx, column, row.get(column))?);
            }
            // First row wins for a repeated code
            indexed.entry(code).or_insert(values);
        }

        Ok(Self {
            name: name.to_string(),
            columns,
            rows: indexed,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn contains(&self, code: i64) -> bool {
        self.rows.contains_key(&code)
    }
}

/// The immutable reference data: postal code mapping plus attribute tables.
#[derive(Debug, Clone)]
pub struct ReferenceDataset {
    code_column: String,
    postal_to_code: HashMap<i64, i64>,
    tables: Vec<AttributeTable>,
}

impl ReferenceDataset {
    /// Build the dataset from already-parsed JSON tables. `tables` is in join order.
    pub fn from_json_tables(
        postal_mapping: Value,
        tables: Vec<(&str, Value)>,
        code_column: &str,
        postal_column: &str,
    ) -> Result<Self> {
        let mapping_rows = into_rows("postal_mapping", postal_mapping)?;
        if mapping_rows.is_empty() {
            return Err(PipelineError::data_load(
                "postal_mapping",
                "table contains no rows",
            ));
        }

        let mut postal_to_code = HashMap::with_capacity(mapping_rows.len());
        for (idx, row) in mapping_rows.iter().enumerate() {
            let postal = parse_code("postal_mapping", idx, row.get(postal_column), postal_column)?;
            let code = parse_code("postal_mapping", idx, row.get(code_column), code_column)?;
            // A postal code may span several codes; load order decides
            postal_to_code.entry(postal).or_insert(code);
        }

        let tables = tables
            .into_iter()
            .map(|(name, value)| {
                AttributeTable::from_rows(name, into_rows(name, value)?, code_column)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            code_column: code_column.to_string(),
            postal_to_code,
            tables,
        })
    }

    /// Read every configured table from disk.
    pub fn load(config: &ReferenceTablesConfig) -> Result<Self> {
        let mapping = read_table("postal_mapping", &config.postal_mapping)?;
        let mut tables = Vec::new();
        for (name, path) in config.attribute_tables() {
            tables.push((name, read_table(name, path)?));
        }
        let dataset =
            Self::from_json_tables(mapping, tables, &config.code_column, &config.postal_column)?;
        info!(
            postal_codes = dataset.postal_to_code.len(),
            tables = dataset.tables.len(),
            "Reference data loaded"
        );
        Ok(dataset)
    }

    pub fn code_column(&self) -> &str {
        &self.code_column
    }

    pub fn code_for_postal(&self, postal_code: i64) -> Option<i64> {
        self.postal_to_code.get(&postal_code).copied()
    }

    /// Every attribute column the enrichment can add, in join order.
    pub fn enrichment_fields(&self) -> Vec<&str> {
        self.tables
            .iter()
            .flat_map(|t| t.columns.iter().map(|c| c.as_str()))
            .collect()
    }

    pub fn tables(&self) -> &[AttributeTable] {
        &self.tables
    }

    /// Attribute values for a geographic code, or `None` when no table knows it.
    /// A table without a row for the code contributes missing values.
    pub fn lookup(&self, code: i64) -> Option<Vec<(&str, FieldValue)>> {
        if !self.tables.iter().any(|t| t.contains(code)) {
            return None;
        }
        let mut fields = Vec::new();
        for table in &self.tables {
            let row = table.rows.get(&code);
            for (idx, column) in table.columns.iter().enumerate() {
                let value = row
                    .and_then(|values| values[idx])
                    .map(FieldValue::Number)
                    .unwrap_or(FieldValue::Missing);
                fields.push((column.as_str(), value));
            }
        }
        Some(fields)
    }
}

/// Loads the reference dataset on first use and hands out shared references.
pub struct ReferenceDataStore {
    config: ReferenceTablesConfig,
    dataset: OnceCell<Arc<ReferenceDataset>>,
}

impl ReferenceDataStore {
    pub fn new(config: ReferenceTablesConfig) -> Self {
        Self {
            config,
            dataset: OnceCell::new(),
        }
    }

    /// Idempotent: the tables are read at most once per store.
    pub fn load(&self) -> Result<Arc<ReferenceDataset>> {
        self.dataset
            .get_or_try_init(|| ReferenceDataset::load(&self.config).map(Arc::new))
            .map(Arc::clone)
    }

    /// Re-read the tables. Requires exclusive access, so it cannot race a
    /// request that is holding the store.
    pub fn reload(&mut self) -> Result<Arc<ReferenceDataset>> {
        let fresh = Arc::new(ReferenceDataset::load(&self.config)?);
        self.dataset = OnceCell::with_value(Arc::clone(&fresh));
        Ok(fresh)
    }
}

fn read_table(name: &str, path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .map_err(|e| PipelineError::data_load(name, format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| PipelineError::data_load(name, format!("{}: {}", path.display(), e)))
}

fn into_rows(name: &str, value: Value) -> Result<Vec<Row>> {
    let Value::Array(items) = value else {
        return Err(PipelineError::data_load(name, "expected a JSON array of rows"));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(row) => Ok(row),
            _ => Err(PipelineError::data_load(
                name,
                format!("row {} is not an object", idx),
            )),
        })
        .collect()
}

/// Geographic codes and postal codes are integers, possibly written as digit strings.
fn parse_code(table: &str, idx: usize, value: Option<&Value>, column: &str) -> Result<i64> {
    let malformed = || {
        PipelineError::data_load(
            table,
            format!("row {}: malformed or missing key column '{}'", idx, column),
        )
    };
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(malformed),
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| malformed()),
        _ => Err(malformed()),
    }
}

fn parse_attribute(table: &str, idx: usize, column: &str, value: Option<&Value>) -> Result<Option<f64>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(other) => Err(PipelineError::data_load(
            table,
            format!("row {}: column '{}' is not numeric: {}", idx, column, other),
        )),
    }
}

/// Postal code of a record as an integer, whether it arrived as a number or text.
pub fn postal_code_of(value: &FieldValue) -> Option<i64> {
    match value {
        FieldValue::Number(n) if n.fract() == 0.0 => Some(*n as i64),
        FieldValue::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}
