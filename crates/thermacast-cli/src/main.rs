//! Train/predict command line.
//!
//! ```bash
//! thermacast train \
//!     --measurements measurements.json --hvacs hvacs.json \
//!     --openings openings.json --forecasts forecasts.json \
//!     --config thermacast.yaml --output model.json
//!
//! thermacast predict --model model.json --input request.json
//! ```
//!
//! Raw data files are JSON arrays of the record types in
//! `thermacast-common`; the predict input follows the `ModelInput` wire
//! shape.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use thermacast_common::{
    AppConfig, ForecastRecord, HvacRecord, MeasurementRecord, OpeningRecord, Result,
    ThermacastError,
};
use thermacast_features::assemble::FeatureTable;
use thermacast_features::{assemble_features, cache, load_wide_table, split_round_robin};
use thermacast_model::ModelArtifact;
use thermacast_predictor::{ModelHandle, ModelInput};
use thermacast_trainer::train_model;

#[derive(Parser)]
#[command(name = "thermacast", about = "Indoor temperature forecasting")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build features from raw sensor exports and train a model.
    Train {
        #[arg(long)]
        measurements: PathBuf,
        #[arg(long)]
        hvacs: PathBuf,
        #[arg(long)]
        openings: PathBuf,
        #[arg(long)]
        forecasts: PathBuf,
        /// Feature snapshot; reused when present, written after assembly
        /// otherwise.
        #[arg(long)]
        cache: Option<PathBuf>,
        /// YAML configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Where to write the trained model artifact.
        #[arg(long, default_value = "model.json")]
        output: PathBuf,
    },
    /// Run one prediction against a trained model artifact.
    Predict {
        #[arg(long)]
        model: PathBuf,
        /// Prediction request in the ModelInput wire shape.
        #[arg(long)]
        input: PathBuf,
        /// Prediction output file; stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

fn load_config(path: &Option<PathBuf>) -> Result<AppConfig> {
    match path {
        Some(path) => {
            let file = File::open(path)?;
            serde_yaml::from_reader(BufReader::new(file)).map_err(|e| {
                ThermacastError::ConfigError(format!("cannot parse {}: {e}", path.display()))
            })
        }
        None => Ok(AppConfig::default()),
    }
}

struct RawDataFiles<'a> {
    measurements: &'a Path,
    hvacs: &'a Path,
    openings: &'a Path,
    forecasts: &'a Path,
}

fn build_table(files: &RawDataFiles<'_>, config: &AppConfig) -> Result<FeatureTable> {
    let measurements: Vec<MeasurementRecord> = load_json(files.measurements)?;
    let hvacs: Vec<HvacRecord> = load_json(files.hvacs)?;
    let openings: Vec<OpeningRecord> = load_json(files.openings)?;
    let forecasts: Vec<ForecastRecord> = load_json(files.forecasts)?;

    let wide = load_wide_table(&measurements, &hvacs, &openings, &forecasts)?;
    assemble_features(&wide, &config.features)
}

fn run_train(
    files: RawDataFiles<'_>,
    cache_path: Option<&Path>,
    config_path: &Option<PathBuf>,
    output: &Path,
) -> Result<()> {
    let config = load_config(config_path)?;

    let table = match cache_path {
        Some(path) => cache::load_or_build(path, || build_table(&files, &config))?,
        None => build_table(&files, &config)?,
    };

    let split = split_round_robin(&table);
    let (model, report) = train_model(&split, &config.training)?;
    info!(
        test_loss = report.test.loss,
        test_mae = report.test.mae,
        test_examples = report.test.n_examples,
        "Held-out evaluation"
    );

    let artifact = ModelArtifact::new(
        split.train.label_names(),
        split.train.control_names(),
        model,
    );
    artifact.save(output)
}

fn run_predict(model: &Path, input: &Path, output: &Option<PathBuf>) -> Result<()> {
    let handle = ModelHandle::load(model)?;
    let request: ModelInput = load_json(input)?;
    let prediction = handle.predict(&request)?;

    match output {
        Some(path) => {
            let file = File::create(path)?;
            serde_json::to_writer_pretty(BufWriter::new(file), &prediction)?;
            info!(path = %path.display(), "Wrote prediction");
        }
        None => {
            serde_json::to_writer_pretty(std::io::stdout().lock(), &prediction)?;
            println!();
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Train {
            measurements,
            hvacs,
            openings,
            forecasts,
            cache,
            config,
            output,
        } => run_train(
            RawDataFiles {
                measurements: &measurements,
                hvacs: &hvacs,
                openings: &openings,
                forecasts: &forecasts,
            },
            cache.as_deref(),
            &config,
            &output,
        ),
        Commands::Predict {
            model,
            input,
            output,
        } => run_predict(&model, &input, &output),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
