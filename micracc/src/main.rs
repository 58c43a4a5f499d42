//! micracc - MICR recognition accuracy harness
//!
//! Drives a batch of check recognition jobs under a concurrency cap,
//! scores each outcome against recorded (or operator-corrected) ground
//! truth, and reports match statistics plus the check ids the human
//! review workflow needs to look at.

use std::cell::RefCell;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use micracc::services::{AnyRecognizer, FixtureRecognizer, JsonGroundTruth, RemoteRecognizer};
use micracc::services::DirImageSource;
use micracc::{run_accuracy_batch, AccuracyTally, BatchOptions, EvaluationLedger, TracingReporter};
use micracc_common::config::TomlConfig;
use micracc_common::Error;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for micracc
#[derive(Parser, Debug)]
#[command(name = "micracc")]
#[command(about = "MICR recognition accuracy harness")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, default_value = "micracc.toml", env = "MICRACC_CONFIG")]
    config: PathBuf,

    /// First check id in the run (inclusive)
    #[arg(long, env = "MICRACC_FIRST_CHECK")]
    first_check: Option<u32>,

    /// Last check id in the run (inclusive)
    #[arg(long, env = "MICRACC_LAST_CHECK")]
    last_check: Option<u32>,

    /// Maximum recognition requests outstanding at once
    #[arg(long, env = "MICRACC_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Include matched check ids in the final report
    #[arg(long)]
    show_matches: bool,

    /// Remote recognition service endpoint (overrides config)
    #[arg(long, env = "MICRACC_ENDPOINT")]
    endpoint: Option<String>,

    /// Evaluation ledger document (overrides config)
    #[arg(long, env = "MICRACC_LEDGER")]
    ledger: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "micracc=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting micracc accuracy harness");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Configuration priority: CLI/env overrides on top of the TOML file
    let mut config = TomlConfig::load(&args.config)?;
    if let Some(first_check) = args.first_check {
        config.batch.first_check = first_check;
    }
    if let Some(last_check) = args.last_check {
        config.batch.last_check = last_check;
    }
    if let Some(concurrency) = args.concurrency {
        config.batch.max_concurrency = concurrency;
    }
    if args.show_matches {
        config.batch.show_matches = true;
    }
    if let Some(endpoint) = args.endpoint {
        config.recognition.endpoint = Some(endpoint);
    }
    if let Some(ledger) = args.ledger {
        config.paths.ledger = Some(ledger);
    }
    config.validate()?;

    // All input documents load before any classification begins;
    // a bad one kills the run here.
    let ledger = match &config.paths.ledger {
        Some(path) => EvaluationLedger::load(path)?,
        None => EvaluationLedger::default(),
    };
    let ground_truth = JsonGroundTruth::load(&config.paths.ground_truth)?;
    let images = DirImageSource::new(&config.paths.images_dir, &config.paths.image_extension);

    let recognizer = match (&config.recognition.endpoint, &config.recognition.fixtures) {
        (Some(endpoint), _) => {
            info!("Delegating recognition to {}", endpoint);
            AnyRecognizer::Remote(RemoteRecognizer::new(
                endpoint.clone(),
                Duration::from_secs(config.recognition.timeout_seconds),
            )?)
        }
        (None, Some(fixtures)) => {
            info!("Serving recognition from fixtures");
            AnyRecognizer::Fixture(FixtureRecognizer::load(fixtures)?)
        }
        (None, None) => {
            return Err(Error::Config(
                "no recognition backend configured: set recognition.endpoint or recognition.fixtures"
                    .to_string(),
            )
            .into());
        }
    };

    let tally = RefCell::new(AccuracyTally::new(
        ledger,
        config.batch.show_matches,
        Box::new(TracingReporter),
    ));

    let options = BatchOptions {
        first_check: config.batch.first_check,
        last_check: config.batch.last_check,
        max_concurrency: config.batch.max_concurrency,
    };
    let outcome = run_accuracy_batch(&recognizer, &ground_truth, &images, &tally, options).await;

    // Cleanup path: partial statistics still get reported when the
    // batch died partway through.
    tally.borrow().report();

    outcome?;
    Ok(())
}
