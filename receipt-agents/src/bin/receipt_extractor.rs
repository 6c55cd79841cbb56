use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use std::io::Read;
use std::path::PathBuf;

use extractors::spoken_summary;
use receipt_agents::{AgentConfig, ReceiptPipeline};

#[derive(Parser, Debug)]
#[command(name = "receipt-extractor", about = "Turn receipt OCR text into a validated receipt record")]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .args(["text_file", "text", "stdin"]),
))]
struct Cli {
    /// Path to a file holding OCR text
    #[arg(long, value_name = "PATH", group = "input")]
    text_file: Option<PathBuf>,

    /// Raw OCR text
    #[arg(long, group = "input")]
    text: Option<String>,

    /// Read OCR text from standard input
    #[arg(long, group = "input")]
    stdin: bool,

    /// Config file (defaults to <config dir>/receipt-extractor/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Never call the model; use the local parser only
    #[arg(long)]
    force_local: bool,

    /// Model ID to try, in order (repeatable; overrides the configured sequence)
    #[arg(long = "model", value_name = "ID")]
    models: Vec<String>,

    /// Print the spoken summary instead of JSON
    #[arg(long)]
    summary: bool,

    /// Also print the guardrail report
    #[arg(long)]
    report: bool,

    /// Also print health and allergen insights for the items
    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let (mut config, config_path) =
        AgentConfig::load(cli.config.as_deref()).context("Failed to load receipt-extractor config")?;
    match &config_path {
        Some(path) => tracing::info!(path = %path.display(), "Loaded config"),
        None => tracing::info!("No config file found, using defaults"),
    }

    if cli.force_local {
        config.force_local = true;
    }
    if !cli.models.is_empty() {
        config.model.sequence = cli.models.clone();
    }

    let text = match (&cli.text_file, &cli.text, cli.stdin) {
        (Some(path), None, false) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read text file at {:?}", path))?,
        (None, Some(text), false) => text.clone(),
        (None, None, true) => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read standard input")?;
            buffer
        }
        _ => unreachable!("clap enforces exactly one input"),
    };

    let pipeline = ReceiptPipeline::from_config(&config)?;
    let outcome = pipeline.process_text(&text).await;

    if let Some(reason) = &outcome.fallback_reason {
        tracing::warn!(reason = %reason, "Used the local parser after a model failure");
    }

    if cli.summary {
        println!("{}", spoken_summary(&outcome.receipt));
    } else {
        println!("{}", serde_json::to_string_pretty(&outcome.receipt)?);
    }

    if cli.report {
        println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    }

    if cli.health {
        let insights = pipeline.analyze_health(&outcome.receipt).await;
        println!("{}", serde_json::to_string_pretty(&insights)?);
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
