use anyhow::Context;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::format_file_size;
use crate::Result;

const TRANSCRIPTION_URL: &str = "https://api.openai.com/v1/audio/transcriptions";
const TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Suffix appended to the audio file's stem when naming the transcript
pub const TRANSCRIPT_SUFFIX: &str = "_transcript.txt";

// The Whisper API rejects uploads above this size.
const MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

/// Trait for converting an audio file into a text transcript file.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe the audio file and return the path of the written transcript.
    async fn transcribe(&self, audio_path: &Path) -> Result<PathBuf>;
}

/// Transcriber backed by the OpenAI Whisper API.
pub struct WhisperApiTranscriber {
    client: reqwest::Client,
    api_key: String,
}

impl WhisperApiTranscriber {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    async fn request_transcript(&self, audio_path: &Path) -> Result<String> {
        let content = fs_err::read(audio_path)?;
        let filename = audio_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.mp3".to_string());

        let form = Form::new()
            .part(
                "file",
                Part::bytes(content)
                    .file_name(filename)
                    .mime_str("audio/mpeg")
                    .context("valid mime string")?,
            )
            .text("model", TRANSCRIPTION_MODEL)
            .text("response_format", "text");

        let response = self
            .client
            .post(TRANSCRIPTION_URL)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("failed to issue transcription request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to read response body>"));
            let message = extract_api_error(&body).unwrap_or(body);
            anyhow::bail!("transcription request failed: HTTP {}: {}", status, message);
        }

        Ok(response.text().await?)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Pull the human-readable message out of an OpenAI error body, if it is one.
fn extract_api_error(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorResponse>(body)
        .ok()
        .map(|response| response.error.message)
}

#[async_trait]
impl Transcriber for WhisperApiTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<PathBuf> {
        tracing::info!("Transcribing audio file: {}", audio_path.display());

        let file_size = fs_err::metadata(audio_path)?.len();
        tracing::info!("File size: {}", format_file_size(file_size));
        if file_size > MAX_UPLOAD_BYTES {
            tracing::warn!(
                "{} exceeds the {} Whisper API upload limit; the request will likely be rejected",
                format_file_size(file_size),
                format_file_size(MAX_UPLOAD_BYTES)
            );
        }

        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        progress.enable_steady_tick(Duration::from_millis(120));
        progress.set_message("Transcribing with Whisper...");

        let transcript = self.request_transcript(audio_path).await;
        progress.finish_and_clear();
        let transcript = transcript?;

        let transcript_path = transcript_path_for(audio_path);
        fs_err::write(&transcript_path, transcript)
            .context("failed to write transcript file")?;

        tracing::info!("Transcription saved to: {}", transcript_path.display());
        Ok(transcript_path)
    }
}

/// Transcript file path for a given audio file: same directory, audio stem plus
/// a fixed suffix.
pub fn transcript_path_for(audio_path: &Path) -> PathBuf {
    let stem = audio_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string());

    audio_path.with_file_name(format!("{}{}", stem, TRANSCRIPT_SUFFIX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_path_appends_suffix_next_to_audio() {
        let path = transcript_path_for(Path::new("/tmp/downloads/My Talk.mp3"));
        assert_eq!(
            path,
            Path::new("/tmp/downloads/My Talk_transcript.txt")
        );
    }

    #[test]
    fn transcript_path_handles_files_without_extension() {
        let path = transcript_path_for(Path::new("/tmp/downloads/raw"));
        assert_eq!(path, Path::new("/tmp/downloads/raw_transcript.txt"));
    }

    #[test]
    fn api_error_body_yields_its_message() {
        let body = r#"{"error":{"message":"Invalid file format.","type":"invalid_request_error","param":null,"code":null}}"#;
        assert_eq!(
            extract_api_error(body).as_deref(),
            Some("Invalid file format.")
        );
    }

    #[test]
    fn non_json_error_body_is_passed_through() {
        assert!(extract_api_error("<html>Bad Gateway</html>").is_none());
    }
}
