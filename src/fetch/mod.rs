use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::Result;

/// Trait for fetching a remote video's audio track into a local file.
///
/// Implementations return the explicit path of the produced file rather than
/// leaving callers to guess it from directory contents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download and transcode the audio for `url` into `output_dir`, returning
    /// the path of the produced audio file.
    async fn fetch_audio(&self, url: &str, output_dir: &Path) -> Result<PathBuf>;
}

/// Media fetcher backed by the yt-dlp command-line tool (with ffmpeg doing the
/// MP3 extraction).
pub struct YtDlpFetcher {
    yt_dlp_path: String,
}

impl YtDlpFetcher {
    pub fn new() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
        }
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> bool {
        let output = Command::new(&self.yt_dlp_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        matches!(output, Ok(out) if out.status.success())
    }
}

impl Default for YtDlpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch_audio(&self, url: &str, output_dir: &Path) -> Result<PathBuf> {
        tracing::info!("Downloading audio from: {}", url);

        fs_err::create_dir_all(output_dir)?;

        // Name output files by the source's title; ffmpeg rewrites the
        // extension when it extracts the MP3.
        let output_template = output_dir.join("%(title)s.%(ext)s");

        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        progress.enable_steady_tick(Duration::from_millis(120));
        progress.set_message(format!("Downloading audio with yt-dlp: {}", url));

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--output",
                &output_template.to_string_lossy(),
                "--format",
                "bestaudio/best",
                "--extract-audio",
                "--audio-format",
                "mp3",
                "--audio-quality",
                "192K",
                "--no-playlist",
                "--no-warnings",
                // Ask yt-dlp for the final file path instead of inferring it
                // from directory listings afterwards.
                "--print",
                "after_move:filepath",
                "--no-simulate",
                url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        progress.finish_and_clear();

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp failed for {}: {}", url, error.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let audio_path = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .map(PathBuf::from)
            .ok_or_else(|| anyhow::anyhow!("yt-dlp did not report an output file for {}", url))?;

        if !audio_path.is_file() {
            anyhow::bail!(
                "yt-dlp reported {} but the file does not exist",
                audio_path.display()
            );
        }

        tracing::info!("Download complete: {}", audio_path.display());
        Ok(audio_path)
    }
}
