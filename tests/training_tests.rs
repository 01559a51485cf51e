mod common;

use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use tempfile::tempdir;

use immo_predictor::infra::DomainStore;
use immo_predictor::pipeline::processing::{CategoricalDomains, Encoded};
use immo_predictor::pipeline::PipelineConfig;
use immo_predictor::reference::ReferenceDataStore;
use immo_predictor::{Config, PipelineError, PredictionService, TrainingUseCase};

fn use_case(config: &Config) -> Result<TrainingUseCase> {
    let reference = ReferenceDataStore::new(config.reference.clone()).load()?;
    Ok(TrainingUseCase::new(config.pipeline.clone(), reference)?)
}

#[test]
fn test_training_set_filters_and_rescales_targets() -> Result<()> {
    let temp_dir = tempdir()?;
    let config = Config::load(&common::write_fixture(temp_dir.path())?)?;
    let use_case = use_case(&config)?;
    let domains = Arc::new(DomainStore::new(&config.model.domains).load()?);

    let listings = common::records(&common::sample_listings())?;
    let set = use_case.build_features(listings, domains)?;

    // The annuity listing never reaches the rows
    assert_eq!(set.rows.len(), 2);
    assert_eq!(set.targets.len(), 2);
    assert_eq!(set.rejected, 0);
    assert!((set.targets[0] - 545001f64.log10()).abs() < 1e-12);
    assert!(set.rows.iter().all(|row| row.names() == set.feature_names.as_slice()));
    Ok(())
}

#[test]
fn test_training_contract_matches_inference_contract() -> Result<()> {
    let temp_dir = tempdir()?;
    let config = Config::load(&common::write_fixture(temp_dir.path())?)?;
    let domains = Arc::new(DomainStore::new(&config.model.domains).load()?);
    let set = use_case(&config)?.build_features(common::records(&common::sample_listings())?, domains)?;

    let service = PredictionService::from_config(&config)?;
    assert_eq!(set.contract, service.pipeline().contract());
    Ok(())
}

#[test]
fn test_fitted_domains_ignore_listing_order() -> Result<()> {
    let temp_dir = tempdir()?;
    let config = Config::load(&common::write_fixture(temp_dir.path())?)?;
    let use_case = use_case(&config)?;

    let mut listings = common::records(&common::sample_listings())?;
    let forward = use_case.fit_domains(&listings);
    listings.reverse();
    let reversed = use_case.fit_domains(&listings);

    assert_eq!(forward, reversed);
    let sub_type = forward.get("PropertySubType").unwrap();
    assert_eq!(sub_type.encode("House"), Encoded::Known(0));
    assert_eq!(sub_type.encode("Villa"), Encoded::Known(1));
    // Rejected by the filter, so never fitted
    assert_eq!(sub_type.encode("Castle"), Encoded::Unknown);
    Ok(())
}

#[test]
fn test_encoding_is_stable_across_batches() -> Result<()> {
    let temp_dir = tempdir()?;
    let config = Config::load(&common::write_fixture(temp_dir.path())?)?;
    let use_case = use_case(&config)?;
    let domains = Arc::new(DomainStore::new(&config.model.domains).load()?);

    let listings = common::records(&common::sample_listings())?;
    let house_only = vec![listings[1].clone()];
    let both = use_case.build_features(listings, Arc::clone(&domains))?;
    let single = use_case.build_features(house_only, domains)?;

    assert_eq!(
        both.rows[1].get("PropertySubType"),
        single.rows[0].get("PropertySubType")
    );
    Ok(())
}

#[test]
fn test_listing_without_enrichment_is_counted_not_kept() -> Result<()> {
    let temp_dir = tempdir()?;
    let config = Config::load(&common::write_fixture(temp_dir.path())?)?;
    let domains = Arc::new(DomainStore::new(&config.model.domains).load()?);

    let mut raw = common::sample_listings();
    raw[0]["PostalCode"] = json!(1000);
    let set = use_case(&config)?.build_features(common::records(&raw)?, domains)?;

    assert_eq!(set.rows.len(), 1);
    assert_eq!(set.rejected, 1);
    Ok(())
}

#[test]
fn test_unknown_step_fails_before_any_record() -> Result<()> {
    let temp_dir = tempdir()?;
    let config = Config::load(&common::write_fixture(temp_dir.path())?)?;
    let reference = ReferenceDataStore::new(config.reference.clone()).load()?;

    let mut pipeline = PipelineConfig::with_features(["LivingArea"]);
    pipeline.steps.push("fetch_remote_step".to_string());

    match TrainingUseCase::new(pipeline, reference) {
        Err(PipelineError::UnknownStep(name)) => assert_eq!(name, "fetch_remote_step"),
        Err(other) => panic!("expected UnknownStep, got {}", other),
        Ok(_) => panic!("expected UnknownStep"),
    }
    Ok(())
}

#[test]
fn test_domain_table_survives_store_round_trip() -> Result<()> {
    let temp_dir = tempdir()?;
    let store = DomainStore::new(temp_dir.path().join("domains.json"));
    let listings = common::records(&common::sample_listings())?;
    let features: Vec<String> = common::FEATURES.iter().map(|f| f.to_string()).collect();
    let domains = CategoricalDomains::fit(&listings, &features);

    store.save(&domains)?;
    assert_eq!(store.load()?, domains);
    Ok(())
}
