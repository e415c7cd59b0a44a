use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use batchqc::config::{self, Settings};
use batchqc::llm::{GeminiClient, GroqClient};
use batchqc::pipeline::QcPipeline;
use batchqc::report::Mailer;
use batchqc::watcher::{self, FolderWatcher};

#[derive(Parser, Debug)]
#[command(name = "batchqc", version, about = "QC pipeline for scanned batch-production sheets")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch a folder for new batch sheets (the default mode)
    Watch {
        /// Folder to watch; defaults to the configured scan directory
        dir: Option<PathBuf>,
    },
    /// Process a single image file and exit
    File { path: PathBuf },
    /// Process every image in a folder and exit
    Folder { dir: PathBuf },
}

fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
    tracing::info!("batchqc starting v{}", config::APP_VERSION);

    let cli = Cli::parse();
    let settings = Settings::from_env();
    let pipeline = match build_pipeline(&settings) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize LLM clients");
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Command::File { path }) => {
            process_one(&pipeline, &path);
        }
        Some(Command::Folder { dir }) => {
            process_folder(&pipeline, &dir);
        }
        Some(Command::Watch { dir }) => {
            watch_folder(&pipeline, &dir.unwrap_or_else(|| settings.scan_dir.clone()));
        }
        None => {
            watch_folder(&pipeline, &settings.scan_dir);
        }
    }
}

fn build_pipeline(settings: &Settings) -> Result<QcPipeline, batchqc::llm::LlmError> {
    let vision = GeminiClient::new(
        &settings.gemini_base_url,
        settings.gemini_api_key.clone(),
        &settings.gemini_model,
        settings.llm_timeout_secs,
    )?;
    let chat = GroqClient::new(
        &settings.groq_base_url,
        settings.groq_api_key.clone(),
        &settings.groq_model,
        settings.llm_timeout_secs,
    )?;
    let mailer = Mailer::from_settings(settings);
    if mailer.is_none() {
        tracing::warn!("EMAIL / EMAIL_PASSWORD not set, reports will not be emailed");
    }
    Ok(QcPipeline::new(
        Box::new(vision),
        Box::new(chat),
        mailer,
        settings.history_dir.clone(),
    ))
}

fn process_one(pipeline: &QcPipeline, path: &Path) {
    match pipeline.process_file(path) {
        Ok(report) => {
            tracing::info!(summary = %report.summary, "Summary report");
        }
        Err(e) => {
            tracing::error!(file = %path.display(), error = %e, "Processing failed, skipping this file");
        }
    }
}

fn process_folder(pipeline: &QcPipeline, dir: &Path) {
    let mut images: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| watcher::is_image_file(p))
            .collect(),
        Err(e) => {
            tracing::error!(dir = %dir.display(), error = %e, "Cannot read folder");
            std::process::exit(1);
        }
    };
    if images.is_empty() {
        tracing::info!(dir = %dir.display(), "No image files found");
        return;
    }
    images.sort();
    for image in &images {
        process_one(pipeline, image);
    }
}

fn watch_folder(pipeline: &QcPipeline, dir: &Path) -> ! {
    if let Err(e) = std::fs::create_dir_all(dir) {
        tracing::error!(dir = %dir.display(), error = %e, "Cannot create watch folder");
        std::process::exit(1);
    }
    let watcher = match FolderWatcher::new(dir, watcher::DEFAULT_POLL_INTERVAL) {
        Ok(w) => w,
        Err(e) => {
            tracing::error!(dir = %dir.display(), error = %e, "Cannot watch folder");
            std::process::exit(1);
        }
    };
    tracing::info!(dir = %dir.display(), "Watching for new batch sheets");
    watcher.watch(|path| process_one(pipeline, path))
}
