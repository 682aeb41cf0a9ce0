use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yt_batch_transcriber::cli::Cli;
use yt_batch_transcriber::config::RunConfig;
use yt_batch_transcriber::fetch::YtDlpFetcher;
use yt_batch_transcriber::input;
use yt_batch_transcriber::runner::{BatchRunner, UniformPacer};
use yt_batch_transcriber::transcribe::{Transcriber, WhisperApiTranscriber};
use yt_batch_transcriber::utils;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yt_batch_transcriber=info,ytbatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let input_file = cli.input_file.clone();

    let fetcher = YtDlpFetcher::new();

    // Check for required external dependencies (non-fatal in Docker)
    let mut missing_deps = Vec::new();
    if !fetcher.check_availability().await {
        missing_deps.push("yt-dlp - required for downloading audio");
    }
    // ffmpeg performs the MP3 extraction for yt-dlp
    if !utils::check_command_available("ffmpeg").await {
        missing_deps.push("ffmpeg - required for MP3 conversion");
    }
    if !missing_deps.is_empty() {
        eprintln!("⚠️  Dependency check warnings:");
        for dep in missing_deps {
            eprintln!("   • {}", dep);
        }
        eprintln!("   (Continuing anyway - tools may be available)");
    }

    // Fatal configuration errors abort here, before any item is touched.
    let config = RunConfig::from_cli(cli)?;
    let urls = input::read_urls(&input_file)?;

    tracing::info!("Found {} URLs to process", urls.len());

    fs_err::create_dir_all(&config.output_dir)?;

    let transcriber = config
        .api_key
        .as_ref()
        .filter(|_| !config.skip_transcription)
        .map(|key| Box::new(WhisperApiTranscriber::new(key.clone())) as Box<dyn Transcriber>);

    let pacer = UniformPacer::new(config.min_delay_secs, config.max_delay_secs)?;
    let mut runner = BatchRunner::new(
        Box::new(fetcher),
        transcriber,
        Box::new(pacer),
        config.output_dir.clone(),
    );

    let outcomes = runner.run(&urls).await;

    let completed = outcomes.iter().filter(|o| o.is_completed()).count();
    tracing::info!(
        "Batch processing completed: {} succeeded, {} failed",
        completed,
        outcomes.len() - completed
    );

    // Per-item failures never affect the exit status once the batch has started.
    Ok(())
}
