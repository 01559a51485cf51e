use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::types::PropertyRecord;

/// Read a single property record from a JSON object file.
pub fn read_record(path: &Path) -> Result<PropertyRecord> {
    let value = read_json(path)?;
    PropertyRecord::from_json(value)
}

/// Read listings from a JSON array of objects.
pub fn read_records(path: &Path) -> Result<Vec<PropertyRecord>> {
    match read_json(path)? {
        Value::Array(items) => items.into_iter().map(PropertyRecord::from_json).collect(),
        _ => Err(PipelineError::data_load(
            "listings",
            format!("{}: expected a JSON array of records", path.display()),
        )),
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .map_err(|e| PipelineError::data_load("records", format!("{}: {}", path.display(), e)))?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_records_from_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.json");
        fs::write(&path, r#"[{"Price": 1.0}, {"Price": null}]"#).unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[1].get("Price").is_missing());
    }

    #[test]
    fn test_read_records_rejects_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.json");
        fs::write(&path, r#"{"Price": 1.0}"#).unwrap();
        assert!(read_records(&path).is_err());
    }
}
