use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ytbatch",
    about = "Batch-download YouTube videos as MP3 and transcribe them with rate limiting",
    version,
    long_about = "Reads a list of video URLs from a file, downloads each one's audio track as MP3 \
using yt-dlp, optionally transcribes it with the OpenAI Whisper API, and waits a random delay \
between items to avoid triggering rate limits. Individual item failures never stop the batch."
)]
pub struct Cli {
    /// File containing video URLs, one per line (blank lines are ignored)
    #[arg(long, value_name = "FILE")]
    pub input_file: PathBuf,

    /// Output directory for downloaded audio and transcripts
    #[arg(long, value_name = "DIR", default_value = "downloads")]
    pub output_dir: PathBuf,

    /// OpenAI API key (falls back to the OPENAI_API_KEY environment variable)
    #[arg(long, value_name = "KEY", env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Minimum delay between items in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub min_delay: u64,

    /// Maximum delay between items in seconds
    #[arg(long, value_name = "SECS", default_value_t = 120)]
    pub max_delay: u64,

    /// Skip the transcription step (download audio only)
    #[arg(long)]
    pub skip_transcription: bool,
}
