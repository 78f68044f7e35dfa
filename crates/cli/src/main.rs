use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use slipscan_ocr::{JsonRecognizer, OcrResult, PipelineConfig, ReceiptPipeline};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;

type Pipeline = ReceiptPipeline<JsonRecognizer>;

#[derive(Parser)]
#[command(name = "slipscan", version)]
#[command(about = "Rebuild reading order and receipt fields from recorded OCR output")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// TOML file overriding thresholds and correction tables
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// Recognizer output files (JSON)
    files: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Process every file dropped into DIR until interrupted
    Watch { dir: PathBuf },
}

#[derive(Serialize)]
struct Report<'a> {
    file: &'a Path,
    #[serde(flatten)]
    result: &'a OcrResult,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries only JSON.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let pipeline = Arc::new(
        ReceiptPipeline::with_config(JsonRecognizer, &config).context("Invalid configuration")?,
    );

    match cli.command {
        Some(Command::Watch { dir }) => watch(pipeline, &dir, cli.pretty).await,
        None => process_all(pipeline, cli.files, cli.pretty).await,
    }
}

/// Reads `path` asynchronously, then runs recognition and analysis on a blocking task.
async fn analyze_file(pipeline: Arc<Pipeline>, path: &Path) -> Result<OcrResult> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let result = tokio::task::spawn_blocking(move || pipeline.process_bytes(&bytes))
        .await
        .context("Analysis task panicked")??;
    Ok(result)
}

/// Each file runs on its own task; nothing is shared between runs but the pipeline.
async fn process_all(pipeline: Arc<Pipeline>, files: Vec<PathBuf>, pretty: bool) -> Result<()> {
    if files.is_empty() {
        bail!("No input files given");
    }

    let mut tasks = JoinSet::new();
    for (idx, path) in files.into_iter().enumerate() {
        let pipeline = Arc::clone(&pipeline);
        tasks.spawn(async move {
            let result = analyze_file(pipeline, &path).await;
            (idx, path, result)
        });
    }

    let mut outcomes = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        outcomes.push(joined.context("Processing task panicked")?);
    }
    outcomes.sort_by_key(|(idx, _, _)| *idx);

    let total = outcomes.len();
    let mut failed = 0;
    for (_, path, result) in outcomes {
        match result {
            Ok(result) => println!("{}", render(&path, &result, pretty)?),
            Err(e) => {
                failed += 1;
                tracing::warn!("Failed to process {}: {e:#}", path.display());
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {total} files failed");
    }
    Ok(())
}

async fn watch(pipeline: Arc<Pipeline>, dir: &Path, pretty: bool) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<PathBuf>(64);
    // The watcher must be kept alive for the duration of the loop.
    let _watcher = slipscan_ocr::spawn_intake_watcher(dir, tx)
        .with_context(|| format!("Failed to watch {}", dir.display()))?;

    tracing::info!("Watching intake folder: {}", dir.display());

    while let Some(path) = rx.recv().await {
        tracing::info!("Processing: {}", path.display());
        match analyze_file(Arc::clone(&pipeline), &path).await {
            Ok(result) => println!("{}", render(&path, &result, pretty)?),
            Err(e) => tracing::warn!("Failed to process {}: {e:#}", path.display()),
        }
    }
    Ok(())
}

fn render(path: &Path, result: &OcrResult, pretty: bool) -> Result<String> {
    let report = Report { file: path, result };
    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    Ok(json)
}
