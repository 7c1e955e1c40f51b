//! Loan Eligibility Service
//!
//! Trains a logistic-regression loan approval model from a CSV dataset and
//! serves predictions over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use loan_eligibility::commands;
use ml_model::TrainingConfig;
use tracing_subscriber::EnvFilter;

/// Loan Eligibility Service
#[derive(Parser)]
#[command(name = "loan-eligibility")]
#[command(about = "Train and serve a loan approval model")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the model on a CSV dataset and write the artifact
    Train {
        /// Path to the training CSV (defaults to `LOAN_DATASET_PATH`)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Directory for the artifact files (defaults to `LOAN_ARTIFACT_DIR`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum number of training epochs
        #[arg(short, long, default_value = "300")]
        epochs: usize,

        /// Batch size for training
        #[arg(short, long, default_value = "64")]
        batch_size: usize,

        /// Learning rate
        #[arg(short, long, default_value = "0.05")]
        learning_rate: f64,

        /// Fraction of rows held out for evaluation
        #[arg(long, default_value = "0.2")]
        test_ratio: f64,

        /// Seed for the split and batch shuffling
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Export a decision-only classifier (no approval confidence)
        #[arg(long)]
        decision_only: bool,
    },

    /// Serve predictions over HTTP
    Serve {
        /// Address to bind (defaults to `LOAN_BIND_ADDR`)
        #[arg(short, long)]
        bind: Option<SocketAddr>,

        /// Directory holding the artifact files (defaults to `LOAN_ARTIFACT_DIR`)
        #[arg(short, long)]
        artifacts: Option<PathBuf>,
    },

    /// Classify one applicant record stored as JSON
    Predict {
        /// Path to the JSON record, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Directory holding the artifact files (defaults to `LOAN_ARTIFACT_DIR`)
        #[arg(short, long)]
        artifacts: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber; RUST_LOG takes precedence over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;

    match cli.command {
        Commands::Train {
            data,
            output,
            epochs,
            batch_size,
            learning_rate,
            test_ratio,
            seed,
            decision_only,
        } => {
            let data = data
                .or(config.dataset_path)
                .context("No dataset given. Pass --data or set LOAN_DATASET_PATH")?;
            let output = output.unwrap_or(config.artifact_dir);

            let training_config = TrainingConfig {
                learning_rate,
                epochs,
                batch_size,
                test_ratio,
                seed,
                ..TrainingConfig::default()
            };

            tokio::task::spawn_blocking(move || {
                commands::train::run(&data, &output, &training_config, decision_only)
            })
            .await??;
        }
        Commands::Serve { bind, artifacts } => {
            let addr = bind.unwrap_or(config.bind_addr);
            let artifacts = artifacts.unwrap_or(config.artifact_dir);
            commands::serve::run(addr, &artifacts).await?;
        }
        Commands::Predict { input, artifacts } => {
            let artifacts = artifacts.unwrap_or(config.artifact_dir);
            commands::predict::run(&artifacts, &input)?;
        }
    }

    Ok(())
}
