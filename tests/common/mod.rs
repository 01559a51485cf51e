#![allow(dead_code)]

use anyhow::Result;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

use immo_predictor::infra::DomainStore;
use immo_predictor::pipeline::processing::CategoricalDomains;
use immo_predictor::PropertyRecord;

pub const FEATURES: [&str; 15] = [
    "LivingArea",
    "BedroomCount",
    "PropertySubType",
    "Condition",
    "EPCScore",
    "Furnished",
    "Terrace",
    "TerraceArea",
    "Garden",
    "GardenArea",
    "Facades",
    "SwimmingPool",
    "PopDensity",
    "MedianPropertyValue",
    "MedianIncome",
];

/// A listing in the shape the predictor receives from clients.
pub fn sample_record() -> Value {
    json!({
        "PostalCode": 9940,
        "PropertySubType": "House",
        "BedroomCount": 3,
        "LivingArea": 155,
        "Condition": "GOOD",
        "EPCScore": "B",
        "Furnished": 0,
        "Terrace": 0,
        "TerraceArea": null,
        "Garden": 1,
        "GardenArea": 35,
        "Facades": 3,
        "SwimmingPool": 0,
        "EnergyConsumptionPerSqm": 200,
        "Latitude": 51.111,
        "Longitude": 3.700
    })
}

/// Training listings: two sales and one rejected annuity listing.
pub fn sample_listings() -> Value {
    let mut villa = sample_record();
    villa["PropertySubType"] = json!("Villa");
    villa["Price"] = json!(545000);
    villa["SaleType"] = json!("residential_sale");

    let mut house = sample_record();
    house["Price"] = json!(325000);
    house["SaleType"] = json!("residential_sale");

    let mut annuity = sample_record();
    annuity["PropertySubType"] = json!("Castle");
    annuity["Price"] = json!(99000);
    annuity["SaleType"] = json!("annuity_lump_sum");

    json!([villa, house, annuity])
}

pub fn write_json(path: &Path, value: &Value) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Write reference tables, a fitted domain table, a model and a config file
/// into `dir`. Returns the config path.
pub fn write_fixture(dir: &Path) -> Result<PathBuf> {
    let data = dir.join("data");
    fs::create_dir_all(&data)?;

    write_json(
        &data.join("postal_mapping.json"),
        &json!([
            { "PostalCode": 9940, "Refnis": 44021 },
            { "PostalCode": 9000, "Refnis": "44021" }
        ]),
    )?;
    write_json(
        &data.join("pop_density.json"),
        &json!([{ "Refnis": 44021, "PopDensity": 312.5 }]),
    )?;
    write_json(
        &data.join("property_value.json"),
        &json!([{ "Refnis": 44021, "MedianPropertyValue": 285000 }]),
    )?;
    write_json(
        &data.join("household_income.json"),
        &json!([{ "Refnis": 44021, "MedianIncome": 21000 }]),
    )?;

    let features: Vec<String> = FEATURES.iter().map(|f| f.to_string()).collect();
    let listings = records(&sample_listings())?;
    let domains = CategoricalDomains::fit(&listings, &features);
    DomainStore::new(dir.join("models/domains.json")).save(&domains)?;

    let mut weights = vec![0.0; FEATURES.len()];
    weights[0] = 0.1;
    write_json(
        &dir.join("models/model.json"),
        &json!({ "feature_names": features, "weights": weights, "intercept": 5.0 }),
    )?;

    let feature_list = FEATURES
        .iter()
        .map(|f| format!("\"{}\"", f))
        .collect::<Vec<_>>()
        .join(", ");
    let config = format!(
        r#"
[reference]
postal_mapping = "data/postal_mapping.json"
population_density = "data/pop_density.json"
household_income = "data/household_income.json"
property_value = "data/property_value.json"

[pipeline]
steps = ["filter_rows", "replace_nulls", "join_data", "drop_columns", "encode_categorical", "rescale"]
features = [{}]

[model]
artifact = "models/model.json"
domains = "models/domains.json"
"#,
        feature_list
    );
    let config_path = dir.join("config.toml");
    fs::write(&config_path, config)?;
    Ok(config_path)
}

pub fn records(value: &Value) -> Result<Vec<PropertyRecord>> {
    let items = value.as_array().cloned().unwrap_or_default();
    Ok(items
        .into_iter()
        .map(PropertyRecord::from_json)
        .collect::<Result<Vec<_>, _>>()?)
}
