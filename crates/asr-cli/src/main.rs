//! # asr
//!
//! Entry point: `asr serve` runs the HTTP API, `asr batch` transcribes a CSV
//! dataset through it, `asr download-model` pre-fetches the model files.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use asr_batch::{BatchConfig, BatchDriver};
use asr_logging::LoggingConfig;
use asr_server::{AsrServer, ServerConfig};
use asr_settings::{AsrSettings, ModelSettings};
use asr_transcription::model::{DEFAULT_HF_REPO, default_model_dir, ensure_model};
use asr_transcription::{AcousticModel, Wav2Vec2Engine};
use clap::{Args, Parser, Subcommand};

/// Speech-to-text service and batch driver.
#[derive(Parser, Debug)]
#[command(name = "asr", version, about = "Speech-to-text service and batch driver")]
struct Cli {
    /// Settings file (default `~/.asr/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log level directive (overrides settings; `RUST_LOG` still wins).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit JSON log lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve `GET /ping` and `POST /asr`.
    Serve(ServeArgs),
    /// Transcribe every row of a CSV dataset via a running service.
    Batch(BatchArgs),
    /// Download the model files and exit.
    DownloadModel(ModelArgs),
}

#[derive(Args, Debug, Default)]
struct ModelArgs {
    /// Model directory.
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// `HuggingFace` repository holding the ONNX export.
    #[arg(long)]
    model_repo: Option<String>,
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Host to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Concurrent inference slots.
    #[arg(long)]
    workers: Option<usize>,

    /// Fail instead of downloading missing model files.
    #[arg(long)]
    no_download: bool,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args, Debug, Default)]
struct BatchArgs {
    /// CSV dataset, rewritten in place.
    dataset: Option<PathBuf>,

    /// Full URL of the `/asr` endpoint.
    #[arg(long)]
    endpoint: Option<String>,

    /// Directory relative `filename` values resolve against.
    #[arg(long)]
    audio_root: Option<PathBuf>,

    /// Connection budget in seconds.
    #[arg(long)]
    connect_timeout_secs: Option<u64>,

    /// Response read budget in seconds.
    #[arg(long)]
    read_timeout_secs: Option<u64>,
}

impl ModelArgs {
    fn apply(&self, settings: &mut ModelSettings) {
        if let Some(ref dir) = self.model_dir {
            settings.dir = Some(dir.to_string_lossy().into_owned());
        }
        if let Some(ref repo) = self.model_repo {
            settings.repo = Some(repo.clone());
        }
    }
}

impl ServeArgs {
    fn apply(&self, settings: &mut AsrSettings) {
        if let Some(ref host) = self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(workers) = self.workers {
            settings.server.inference_workers = workers;
        }
        if self.no_download {
            settings.model.auto_download = false;
        }
        self.model.apply(&mut settings.model);
    }
}

impl BatchArgs {
    fn apply(&self, settings: &mut AsrSettings) {
        let batch = &mut settings.batch;
        if let Some(ref dataset) = self.dataset {
            batch.dataset = dataset.to_string_lossy().into_owned();
        }
        if let Some(ref endpoint) = self.endpoint {
            batch.endpoint.clone_from(endpoint);
        }
        if let Some(ref root) = self.audio_root {
            batch.audio_root = Some(root.to_string_lossy().into_owned());
        }
        if let Some(secs) = self.connect_timeout_secs {
            batch.connect_timeout_secs = secs;
        }
        if let Some(secs) = self.read_timeout_secs {
            batch.read_timeout_secs = secs;
        }
    }
}

impl Cli {
    /// Settings file, then env, then these flags.
    fn resolve_settings(&self) -> Result<AsrSettings> {
        let mut settings = match self.settings {
            Some(ref path) => asr_settings::load_settings_from_path(path),
            None => asr_settings::load_settings(),
        }
        .context("Failed to load settings")?;

        if let Some(ref level) = self.log_level {
            settings.logging.level.clone_from(level);
        }
        if self.log_json {
            settings.logging.json = true;
        }
        match self.command {
            Command::Serve(ref args) => args.apply(&mut settings),
            Command::Batch(ref args) => args.apply(&mut settings),
            Command::DownloadModel(ref args) => args.apply(&mut settings.model),
        }

        settings.validate().context("Invalid settings")?;
        Ok(settings)
    }
}

fn model_location(settings: &ModelSettings) -> (PathBuf, String) {
    let dir = settings
        .dir
        .as_ref()
        .map_or_else(default_model_dir, PathBuf::from);
    let repo = settings
        .repo
        .clone()
        .unwrap_or_else(|| DEFAULT_HF_REPO.to_string());
    (dir, repo)
}

async fn serve(settings: &AsrSettings) -> Result<()> {
    let (model_dir, repo) = model_location(&settings.model);
    if settings.model.auto_download {
        ensure_model(&model_dir, &repo)
            .await
            .with_context(|| format!("Failed to fetch model from {repo}"))?;
    }

    let engine = Wav2Vec2Engine::new(model_dir.clone())
        .await
        .with_context(|| format!("Failed to load model from {}", model_dir.display()))?;
    let model: Arc<dyn AcousticModel> = engine;

    let server = AsrServer::new(ServerConfig::from(&settings.server), model);
    let handle = server.listen().await.context("Failed to bind server")?;
    tracing::info!("asr service listening on http://{}", handle.addr);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    let _ = server.shutdown().drain(handle.into_task(), None).await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn batch(settings: &AsrSettings) -> Result<()> {
    let driver = BatchDriver::new(BatchConfig::from(&settings.batch))
        .context("Failed to set up batch driver")?;
    let summary = driver
        .run()
        .await
        .with_context(|| format!("Batch run over '{}' failed", settings.batch.dataset))?;
    println!("{summary}");
    Ok(())
}

async fn download_model(settings: &AsrSettings) -> Result<()> {
    let (model_dir, repo) = model_location(&settings.model);
    ensure_model(&model_dir, &repo)
        .await
        .with_context(|| format!("Failed to fetch model from {repo}"))?;
    println!("Model files ready at {}", model_dir.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.resolve_settings()?;

    asr_logging::init_subscriber(&LoggingConfig::new(
        settings.logging.level.clone(),
        settings.logging.json,
    ))
    .context("Failed to initialize logging")?;

    match cli.command {
        Command::Serve(_) => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("Failed to start runtime")?
            .block_on(serve(&settings)),
        // one request in flight at a time; no need for worker threads
        Command::Batch(_) => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start runtime")?
            .block_on(batch(&settings)),
        Command::DownloadModel(_) => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start runtime")?
            .block_on(download_model(&settings)),
    }
}
