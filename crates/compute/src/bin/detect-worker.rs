//! detect-worker: runs station readings through anomaly detection.
//!
//! Subcommands:
//! - `run`: read JSON-lines readings from a file or stdin, print one JSON
//!   detection per line
//! - `export-model`: write the untrained model artifact for the configured
//!   architecture

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use hydrowatch_compute::{Architecture, Detector, LstmAutoencoder};
use hydrowatch_core::config::{load_dotenv, Config};
use hydrowatch_core::Reading;

// ── CLI ─────────────────────────────────────────────────────────────

/// Anomaly detection worker for DWLR station telemetry.
#[derive(Parser, Debug)]
#[command(name = "detect-worker", version, about)]
struct Cli {
    /// Config profile; keys are looked up as `{PROFILE}_{KEY}` first.
    #[arg(long, global = true, env = "HYDROWATCH_PROFILE")]
    profile: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect anomalies in a stream of JSON readings, one per line.
    Run {
        /// Input file, or `-` for stdin.
        #[arg(long, short, default_value = "-")]
        input: String,
    },
    /// Write the fallback model as a JSON artifact.
    ExportModel {
        /// Destination path (defaults to MODEL_PATH).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();
    let cli = Cli::parse();

    let config = match &cli.profile {
        Some(p) => Config::for_profile(p),
        None => Config::from_env(),
    };
    config.log_summary();

    match cli.command {
        Command::Run { input } => run(&config, &input).await,
        Command::ExportModel { output } => export_model(&config, output),
    }
}

async fn run(config: &Config, input: &str) -> anyhow::Result<()> {
    let detector = Detector::from_config(config)?;

    let reader: Box<dyn tokio::io::AsyncRead + Unpin> = if input == "-" {
        Box::new(tokio::io::stdin())
    } else {
        Box::new(tokio::fs::File::open(input).await?)
    };
    let mut lines = BufReader::new(reader).lines();
    let mut stdout = tokio::io::stdout();

    let mut line_no = 0u64;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reading = match Reading::from_json(line) {
            Ok(r) => r,
            Err(e) => {
                warn!(line = line_no, error = %e, "skipping unparseable reading");
                continue;
            }
        };

        let location = reading.location().to_string();
        let timestamp = reading.timestamp;
        let detection = detector.detect(reading).await;

        let out = serde_json::json!({
            "line": line_no,
            "location": location,
            "timestamp": timestamp,
            "detection": detection,
        });
        stdout.write_all(format!("{out}\n").as_bytes()).await?;
    }
    stdout.flush().await?;

    let metrics = detector.metrics();
    info!(
        ingested = metrics.readings_ingested,
        scored = metrics.windows_scored,
        anomalies = metrics.anomalies_detected,
        alerts_sent = metrics.alerts_sent,
        alerts_skipped = metrics.alerts_skipped,
        alerts_failed = metrics.alerts_failed,
        "input exhausted"
    );
    Ok(())
}

fn export_model(config: &Config, output: Option<PathBuf>) -> anyhow::Result<()> {
    config.validate()?;
    let path = output.unwrap_or_else(|| config.detection.model_path.clone());
    let model = LstmAutoencoder::untrained(
        Architecture::from_config(&config.detection),
        config.detection.seed,
    )?;
    model.save(&path)?;
    info!(path = %path.display(), "model artifact written");
    Ok(())
}
