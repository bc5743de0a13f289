//! Core `VideoComposer` trait and the ffmpeg implementation.
//!
//! # Render flow
//!
//! ```text
//! scratch dir (TempDir) ─┐
//!                        ├─ duration  ← AudioArtifact::duration | ffprobe
//!                        ├─ captions.ass ← plan_captions + render_ass
//!                        ├─ ffmpeg: color source + audio + ass filter
//!                        │     -shortest -t <audio duration>  → render.mp4
//!                        └─ persist render.mp4 → destination
//! ```
//!
//! The scratch directory is a [`tempfile::TempDir`] owned by the `compose`
//! call, so it is removed when the call returns on any path, including
//! early `?` returns, encoder failures, and cancellation by a timeout.
//! Nothing is written at `destination` until the encoder has succeeded.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use thiserror::Error;

use crate::artifact::persist;
use crate::config::VideoConfig;
use crate::narration::AudioArtifact;

use super::captions::{plan_captions, render_ass};
use super::probe::probe_duration;

/// Caption script written inside the scratch directory; ffmpeg runs with the
/// scratch directory as its working directory so no filter escaping is needed.
const CAPTIONS_FILE: &str = "captions.ass";

// ---------------------------------------------------------------------------
// ComposeError
// ---------------------------------------------------------------------------

/// Errors that can occur while compositing a video.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// The audio duration could not be determined.
    #[error("could not determine audio duration: {0}")]
    Probe(String),

    /// The audio duration is zero, negative or not a number.
    #[error("audio duration {0} s cannot be rendered")]
    InvalidDuration(f64),

    /// Scratch directory or caption file I/O failed.
    #[error("compositing I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The encoder binary could not be started.
    #[error("failed to launch encoder: {0}")]
    Launch(String),

    /// The encoder ran but exited unsuccessfully.
    #[error("encoder exited with {status}: {stderr}")]
    Encoder { status: String, stderr: String },

    /// The encoder reported success but wrote nothing.
    #[error("encoder produced no output at {0}")]
    MissingOutput(PathBuf),
}

// ---------------------------------------------------------------------------
// VideoArtifact
// ---------------------------------------------------------------------------

/// A composited video file on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoArtifact {
    pub path: PathBuf,
    /// Length the video was capped to (the audio duration).
    pub duration: Duration,
}

// ---------------------------------------------------------------------------
// VideoComposer trait
// ---------------------------------------------------------------------------

/// Async trait for the video compositing stage.
///
/// Implementations report failures as [`ComposeError`]; falling back to the
/// audio artifact is the caller's decision.
#[async_trait]
pub trait VideoComposer: Send + Sync {
    async fn compose(
        &self,
        audio: &AudioArtifact,
        text: &str,
        destination: &Path,
    ) -> Result<VideoArtifact, ComposeError>;
}

// ---------------------------------------------------------------------------
// FfmpegComposer
// ---------------------------------------------------------------------------

/// Renders captions over a solid background with the `ffmpeg` CLI.
pub struct FfmpegComposer {
    config: VideoConfig,
    scratch_root: Option<PathBuf>,
}

impl FfmpegComposer {
    /// `scratch_root` is the parent for per-render scratch directories;
    /// `None` uses the system temp directory.
    pub fn from_config(config: &VideoConfig, scratch_root: Option<PathBuf>) -> Self {
        Self {
            config: config.clone(),
            scratch_root,
        }
    }

    fn scratch_dir(&self) -> std::io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("compose-");
        match &self.scratch_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
    }
}

#[async_trait]
impl VideoComposer for FfmpegComposer {
    async fn compose(
        &self,
        audio: &AudioArtifact,
        text: &str,
        destination: &Path,
    ) -> Result<VideoArtifact, ComposeError> {
        let scratch = self.scratch_dir()?;

        let duration = match audio.duration {
            Some(d) => d,
            None => probe_duration(&self.config.ffprobe_bin, &audio.path).await?,
        };
        let secs = duration.as_secs_f64();
        if !(secs.is_finite() && secs > 0.0) {
            return Err(ComposeError::InvalidDuration(secs));
        }

        let plan = plan_captions(text, secs, &self.config);
        log::debug!(
            "composer: {} caption events over {secs:.3}s ({:?})",
            plan.events.len(),
            self.config.caption_style
        );
        tokio::fs::write(
            scratch.path().join(CAPTIONS_FILE),
            render_ass(&plan, &self.config),
        )
        .await?;

        let audio_path = absolutize(&audio.path)?;
        let render_name = render_file_name(destination);
        let args = encoder_args(&self.config, &audio_path, secs, Path::new(&render_name));
        log::info!(
            "composer: rendering {}x{} video → {}",
            self.config.width,
            self.config.height,
            destination.display()
        );

        let output = tokio::process::Command::new(&self.config.ffmpeg_bin)
            .args(&args)
            .current_dir(scratch.path())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                ComposeError::Launch(format!("{}: {e}", self.config.ffmpeg_bin.display()))
            })?;

        if !output.status.success() {
            return Err(ComposeError::Encoder {
                status: output.status.to_string(),
                stderr: tail(&String::from_utf8_lossy(&output.stderr), 512),
            });
        }

        let rendered = scratch.path().join(&render_name);
        if !tokio::fs::try_exists(&rendered).await.unwrap_or(false) {
            return Err(ComposeError::MissingOutput(destination.to_path_buf()));
        }

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        persist(&rendered, destination).await?;

        Ok(VideoArtifact {
            path: destination.to_path_buf(),
            duration,
        })
    }
}

/// Output name inside the scratch directory; keeps the destination's
/// extension so ffmpeg picks the same container.
fn render_file_name(destination: &Path) -> String {
    let ext = destination
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp4");
    format!("render.{ext}")
}

/// ffmpeg arguments for one render.  Expects to run inside the scratch
/// directory holding [`CAPTIONS_FILE`].
///
/// The output is capped twice: `-shortest` ends at the shorter input and
/// `-t` at the audio duration (floored to milliseconds).
pub fn encoder_args(
    config: &VideoConfig,
    audio: &Path,
    duration_secs: f64,
    destination: &Path,
) -> Vec<OsString> {
    let secs = fmt_secs(duration_secs);
    let source = format!(
        "color=c={}:s={}x{}:r={}:d={secs}",
        config.background, config.width, config.height, config.fps
    );

    let mut args: Vec<OsString> = ["-y", "-hide_banner", "-loglevel", "error", "-f", "lavfi", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(source.into());
    args.push("-i".into());
    args.push(audio.into());
    args.extend(
        [
            "-vf".to_string(),
            format!("ass={CAPTIONS_FILE}"),
            "-map".into(),
            "0:v:0".into(),
            "-map".into(),
            "1:a:0".into(),
            "-c:v".into(),
            config.video_codec.clone(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-c:a".into(),
            config.audio_codec.clone(),
            "-shortest".into(),
            "-t".into(),
            secs,
            "-movflags".into(),
            "+faststart".into(),
        ]
        .into_iter()
        .map(OsString::from),
    );
    args.push(destination.into());
    args
}

/// Seconds with millisecond precision, rounded down so the cap never exceeds
/// the real duration.
fn fmt_secs(secs: f64) -> String {
    format!("{:.3}", (secs * 1000.0).floor() / 1000.0)
}

fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Last `max` bytes of `s` (on a char boundary), trimmed.
fn tail(s: &str, max: usize) -> String {
    let s = s.trim();
    if s.len() <= max {
        return s.to_string();
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    s[start..].to_string()
}

// ---------------------------------------------------------------------------
// MockComposer (tests only)
// ---------------------------------------------------------------------------

/// Test double: writes a placeholder file, or fails like a missing encoder.
#[cfg(test)]
pub enum MockComposer {
    Ok,
    Fail,
}

#[cfg(test)]
#[async_trait]
impl VideoComposer for MockComposer {
    async fn compose(
        &self,
        audio: &AudioArtifact,
        _text: &str,
        destination: &Path,
    ) -> Result<VideoArtifact, ComposeError> {
        match self {
            MockComposer::Ok => {
                tokio::fs::write(destination, b"video").await?;
                Ok(VideoArtifact {
                    path: destination.to_path_buf(),
                    duration: audio.duration.unwrap_or_default(),
                })
            }
            MockComposer::Fail => Err(ComposeError::Launch("ffmpeg: not found".into())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
