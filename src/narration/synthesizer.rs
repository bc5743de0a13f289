//! Core `NarrationSynthesizer` trait and the ElevenLabs implementation.
//!
//! The synthesized audio is streamed to a sibling `*.part` file through a
//! fixed-size write buffer and renamed onto the destination only once the
//! whole body has been written.  The `*.part` file is guarded by
//! [`PartialFile`], so neither an error nor a cancelled future leaves a
//! truncated artifact behind.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::artifact::PartialFile;
use crate::config::NarrationConfig;

// ---------------------------------------------------------------------------
// AudioArtifact
// ---------------------------------------------------------------------------

/// A synthesized audio file on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioArtifact {
    /// Location of the audio file.
    pub path: PathBuf,
    /// Playback length when the producer knows it; `None` means the consumer
    /// has to probe the file.
    pub duration: Option<Duration>,
}

impl AudioArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

// ---------------------------------------------------------------------------
// NarrationError
// ---------------------------------------------------------------------------

/// Errors that can occur during speech synthesis.
#[derive(Debug, Error)]
pub enum NarrationError {
    /// No API key configured; no request was sent.
    #[error("speech-synthesis API key is not configured")]
    MissingCredential,

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("speech-synthesis request timed out")]
    Timeout,

    /// The service answered with a non-success status (e.g. 401 bad key).
    #[error("speech-synthesis service returned HTTP {0}")]
    Status(u16),

    /// The service returned a success status with no audio bytes.
    #[error("speech-synthesis service returned an empty audio stream")]
    EmptyAudio,

    /// Writing the audio file failed.
    #[error("failed to write audio file: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for NarrationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NarrationError::Timeout
        } else {
            NarrationError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// NarrationSynthesizer trait
// ---------------------------------------------------------------------------

/// Async trait for the narration stage.
///
/// # Contract
///
/// - On success exactly one file exists at `destination` (overwritten if it
///   already existed) and the returned artifact points at it.
/// - On failure `destination` is left as it was.
#[async_trait]
pub trait NarrationSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        destination: &Path,
    ) -> Result<AudioArtifact, NarrationError>;
}

// ---------------------------------------------------------------------------
// ElevenLabsSynthesizer
// ---------------------------------------------------------------------------

/// Calls the ElevenLabs `/v1/text-to-speech/{voice_id}` endpoint.
pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    config: NarrationConfig,
}

impl ElevenLabsSynthesizer {
    pub fn from_config(config: &NarrationConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/text-to-speech/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.voice_id
        )
    }
}

#[async_trait]
impl NarrationSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        destination: &Path,
    ) -> Result<AudioArtifact, NarrationError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(NarrationError::MissingCredential)?;

        let body = serde_json::json!({
            "text": text,
            "model_id": self.config.model_id,
            "voice_settings": {
                "stability": self.config.stability,
                "similarity_boost": self.config.similarity_boost
            }
        });

        let mut response = self
            .client
            .post(self.endpoint())
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .header("xi-api-key", key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NarrationError::Status(status.as_u16()));
        }

        let partial = PartialFile::for_destination(destination);
        let bytes = stream_to_file(&mut response, partial.path(), self.config.chunk_size).await?;
        if bytes == 0 {
            return Err(NarrationError::EmptyAudio);
        }

        partial.commit(destination).await?;
        log::info!(
            "narration: wrote {bytes} bytes to {}",
            destination.display()
        );
        Ok(AudioArtifact::new(destination))
    }
}

/// Copy the response body into `path`, flushing every `chunk_size` bytes.
/// Returns the number of bytes written.
async fn stream_to_file(
    response: &mut reqwest::Response,
    path: &Path,
    chunk_size: usize,
) -> Result<u64, NarrationError> {
    let file = tokio::fs::File::create(path).await?;
    let mut writer = BufWriter::with_capacity(chunk_size.max(1), file);
    let mut total = 0u64;

    while let Some(chunk) = response.chunk().await? {
        writer.write_all(&chunk).await?;
        total += chunk.len() as u64;
    }

    writer.flush().await?;
    Ok(total)
}

// ---------------------------------------------------------------------------
// MockSynthesizer (tests only)
// ---------------------------------------------------------------------------

/// Test double: writes fixed bytes to the destination, or fails with the
/// given HTTP status.
#[cfg(test)]
pub enum MockSynthesizer {
    Ok(Vec<u8>),
    Status(u16),
}

#[cfg(test)]
#[async_trait]
impl NarrationSynthesizer for MockSynthesizer {
    async fn synthesize(
        &self,
        _text: &str,
        destination: &Path,
    ) -> Result<AudioArtifact, NarrationError> {
        match self {
            MockSynthesizer::Ok(bytes) => {
                tokio::fs::write(destination, bytes).await?;
                Ok(AudioArtifact::new(destination).with_duration(Duration::from_secs(3)))
            }
            MockSynthesizer::Status(code) => Err(NarrationError::Status(*code)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
