//! YouTube Batch Transcriber - A Rust CLI tool for batch audio download and transcription
//!
//! This library downloads the audio track of each URL in a work list as MP3 (via
//! yt-dlp/ffmpeg), optionally transcribes it with the OpenAI Whisper API, and paces
//! items with a randomized delay to stay under external rate limits.

pub mod cli;
pub mod config;
pub mod fetch;
pub mod input;
pub mod runner;
pub mod transcribe;
pub mod utils;

pub use cli::Cli;
pub use config::RunConfig;
pub use fetch::{MediaFetcher, YtDlpFetcher};
pub use runner::{BatchRunner, ItemOutcome, Pacer, UniformPacer};
pub use transcribe::{Transcriber, WhisperApiTranscriber};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Fatal configuration errors that abort the run before any item is processed
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("an API key is required for transcription. Provide it with --api-key or set the OPENAI_API_KEY environment variable")]
    MissingApiKey,

    #[error("invalid delay range: --min-delay {min} is greater than --max-delay {max}")]
    InvalidDelayRange { min: u64, max: u64 },
}
