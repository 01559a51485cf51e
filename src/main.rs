use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use immo_predictor::config::Config;
use immo_predictor::infra::record_source::{read_record, read_records};
use immo_predictor::infra::DomainStore;
use immo_predictor::logging;
use immo_predictor::observability;
use immo_predictor::reference::ReferenceDataStore;
use immo_predictor::{PredictionService, TrainingUseCase};

#[derive(Parser)]
#[command(name = "immo_predictor")]
#[command(about = "Property sale price prediction and feature pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration (falls back to IMMO_CONFIG, then config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the rolling JSON log file
    #[arg(long, global = true, default_value = "logs")]
    log_dir: PathBuf,

    /// Write a Prometheus metrics snapshot to this file on exit
    #[arg(long, global = true)]
    metrics_out: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict the sale price of a single property record
    Predict {
        /// JSON object holding the raw record
        #[arg(long)]
        input: PathBuf,
    },
    /// Fit and persist the categorical domain table from training listings
    FitDomains {
        /// JSON array of listings
        #[arg(long)]
        input: PathBuf,
    },
    /// Build the model-ready training set from listings
    BuildFeatures {
        /// JSON array of listings
        #[arg(long)]
        input: PathBuf,
        /// Where to write the training set
        #[arg(long)]
        output: PathBuf,
    },
    /// Load every configured resource and check the feature contract
    Validate,
}

fn main() -> anyhow::Result<ExitCode> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let _guard = logging::init_logging(&cli.log_dir).context("Failed to initialize logging")?;
    let metrics_handle = match &cli.metrics_out {
        Some(_) => Some(observability::init()?),
        None => None,
    };

    let config_path = Config::locate(cli.config.as_deref());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    info!(path = %config_path.display(), "Configuration loaded");

    // One store per process; every command reads the tables through it
    let reference = ReferenceDataStore::new(config.reference.clone());

    let exit = match cli.command {
        Commands::Predict { input } => predict(&config, &reference, &input)?,
        Commands::FitDomains { input } => {
            fit_domains(&config, &reference, &input)?;
            ExitCode::SUCCESS
        }
        Commands::BuildFeatures { input, output } => {
            build_features(&config, &reference, &input, &output)?;
            ExitCode::SUCCESS
        }
        Commands::Validate => {
            let service = PredictionService::from_store(&config, &reference)
                .context("Configured resources failed validation")?;
            println!("✅ Configuration valid");
            println!("   Features: {}", service.pipeline().feature_names().len());
            println!("   Contract: {}", service.pipeline().contract());
            ExitCode::SUCCESS
        }
    };

    if let (Some(path), Some(handle)) = (&cli.metrics_out, &metrics_handle) {
        fs::write(path, handle.render())
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
    }

    Ok(exit)
}

fn predict(config: &Config, reference: &ReferenceDataStore, input: &Path) -> anyhow::Result<ExitCode> {
    let service =
        PredictionService::from_store(config, reference).context("Failed to start predictor")?;
    let record = read_record(input)?;

    match service.predict(&record) {
        Ok(prediction) => {
            println!("{}", prediction.formatted_price());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(error = %e, "Prediction request failed");
            let body = serde_json::json!({ "error": e.kind(), "message": e.to_string() });
            println!("{}", body);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn training_use_case(config: &Config, reference: &ReferenceDataStore) -> anyhow::Result<TrainingUseCase> {
    Ok(TrainingUseCase::new(config.pipeline.clone(), reference.load()?)?)
}

fn fit_domains(config: &Config, reference: &ReferenceDataStore, input: &Path) -> anyhow::Result<()> {
    let records = read_records(input)?;
    let domains = training_use_case(config, reference)?.fit_domains(&records);
    let store = DomainStore::new(&config.model.domains);
    store.save(&domains)?;
    println!("✅ Domains written to {}", store.path().display());
    Ok(())
}

fn build_features(
    config: &Config,
    reference: &ReferenceDataStore,
    input: &Path,
    output: &Path,
) -> anyhow::Result<()> {
    let records = read_records(input)?;
    let domains = Arc::new(DomainStore::new(&config.model.domains).load()?);
    let set = training_use_case(config, reference)?.build_features(records, domains)?;

    fs::write(output, serde_json::to_string_pretty(&set)?)
        .with_context(|| format!("Failed to write training set to {}", output.display()))?;

    println!("\n📊 Training set:");
    println!("   Rows: {}", set.rows.len());
    println!("   Rejected: {}", set.rejected);
    println!("   Contract: {}", set.contract);
    println!("   Output file: {}", output.display());
    Ok(())
}
