//! Pipeline orchestrator: drives one script through refine → narrate →
//! compose → publish.
//!
//! [`PipelineOrchestrator`] holds one `Arc<dyn …>` per stage and is shared by
//! every request.  Each call to [`run`](PipelineOrchestrator::run) gets its own
//! [`PipelineRun`] (fresh UUID, own artifact names), so concurrent requests
//! never touch each other's files.
//!
//! # Pipeline flow
//!
//! ```text
//! raw text
//!   └─▶ refiner.refine                     [Refine]
//!         ├─ Ok   → first non-empty line
//!         └─ Err  → polish_locally(raw)
//!   └─▶ narrator.synthesize                [Narrate]
//!         ├─ Ok   → audio_path
//!         └─ Err  → audio_path = null
//!   └─▶ composer.compose (only with audio) [Compose]
//!         ├─ Ok   → video_path
//!         └─ Err  → video_path = audio_path
//!   └─▶ publisher.publish                  [Publish]
//!         ├─ Minted  → mint_id
//!         ├─ Skipped → "placeholder_mint_id"
//!         └─ Err     → mint_id = null
//! ```
//!
//! Every stage call is bounded by `tokio::time::timeout`; an elapsed budget
//! degrades exactly like that stage's error.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::{AppConfig, PipelineConfig};
use crate::narration::{ElevenLabsSynthesizer, NarrationSynthesizer};
use crate::publish::{AssetPublisher, CrossmintPublisher, Metadata};
use crate::script::{headline, polish_locally, ApiRefiner, FallbackRefiner, ScriptRefiner};
use crate::video::{FfmpegComposer, VideoComposer};

use super::state::{PipelineResult, PipelineRun};

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Errors that abort a run.  Stage failures never show up here; they degrade
/// to fallback values instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The asset directory could not be created.
    #[error("failed to create asset directory {}: {source}", path.display())]
    AssetDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// StageTimeouts
// ---------------------------------------------------------------------------

/// Wall-clock budget for each stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTimeouts {
    pub refine: Duration,
    pub narrate: Duration,
    pub compose: Duration,
    pub publish: Duration,
}

impl From<&PipelineConfig> for StageTimeouts {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            refine: Duration::from_secs(config.refine_timeout_secs),
            narrate: Duration::from_secs(config.narrate_timeout_secs),
            compose: Duration::from_secs(config.compose_timeout_secs),
            publish: Duration::from_secs(config.publish_timeout_secs),
        }
    }
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

// ---------------------------------------------------------------------------
// PipelineOrchestrator
// ---------------------------------------------------------------------------

/// Sequences the four stages for one request at a time.
///
/// ```rust,no_run
/// use creator_studio::config::AppConfig;
/// use creator_studio::pipeline::PipelineOrchestrator;
///
/// # async fn example() -> Result<(), creator_studio::pipeline::PipelineError> {
/// let orchestrator = PipelineOrchestrator::from_config(&AppConfig::default());
/// let result = orchestrator.run("dogs are great").await?;
/// println!("{}", result.refined_script);
/// # Ok(())
/// # }
/// ```
pub struct PipelineOrchestrator {
    refiner: Arc<dyn ScriptRefiner>,
    narrator: Arc<dyn NarrationSynthesizer>,
    composer: Arc<dyn VideoComposer>,
    publisher: Arc<dyn AssetPublisher>,
    assets_dir: PathBuf,
    recipient: String,
    timeouts: StageTimeouts,
}

impl PipelineOrchestrator {
    /// Create an orchestrator from explicit stage implementations.
    ///
    /// # Arguments
    ///
    /// * `refiner`   : script refinement (e.g. `FallbackRefiner<ApiRefiner>`).
    /// * `narrator`  : speech synthesis (e.g. `ElevenLabsSynthesizer`).
    /// * `composer`  : video compositing (e.g. `FfmpegComposer`).
    /// * `publisher` : ledger registration (e.g. `CrossmintPublisher`).
    /// * `assets_dir`: directory receiving the per-request artifacts.
    pub fn new(
        refiner: Arc<dyn ScriptRefiner>,
        narrator: Arc<dyn NarrationSynthesizer>,
        composer: Arc<dyn VideoComposer>,
        publisher: Arc<dyn AssetPublisher>,
        assets_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            refiner,
            narrator,
            composer,
            publisher,
            assets_dir: assets_dir.into(),
            recipient: crate::config::PublishConfig::default().recipient,
            timeouts: StageTimeouts::default(),
        }
    }

    /// Build the production stages from `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        let refiner = FallbackRefiner::new(ApiRefiner::from_config(&config.script));
        let narrator = ElevenLabsSynthesizer::from_config(&config.narration);
        let composer = FfmpegComposer::from_config(&config.video, config.assets.scratch_dir.clone());
        let publisher = CrossmintPublisher::from_config(&config.publish);

        Self::new(
            Arc::new(refiner),
            Arc::new(narrator),
            Arc::new(composer),
            Arc::new(publisher),
            config.assets.dir.clone(),
        )
        .with_recipient(config.publish.recipient.clone())
        .with_timeouts(StageTimeouts::from(&config.pipeline))
    }

    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = recipient.into();
        self
    }

    pub fn with_timeouts(mut self, timeouts: StageTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    // -----------------------------------------------------------------------
    // Run
    // -----------------------------------------------------------------------

    /// Process `raw` to completion.
    ///
    /// Only [`PipelineError`] aborts the run; every stage failure is absorbed
    /// into the returned [`PipelineResult`].
    pub async fn run(&self, raw: &str) -> Result<PipelineResult, PipelineError> {
        let mut run = PipelineRun::new();
        log::info!("pipeline[{}]: received {} chars", run.id(), raw.len());

        // ── 1. Refine ────────────────────────────────────────────────────
        run.advance();
        let refined_script = self.refine(raw).await;
        log::debug!("pipeline[{}]: refined = {:?}", run.id(), refined_script);

        tokio::fs::create_dir_all(&self.assets_dir)
            .await
            .map_err(|source| PipelineError::AssetDir {
                path: self.assets_dir.clone(),
                source,
            })?;

        // ── 2. Narrate ───────────────────────────────────────────────────
        run.advance();
        let destination = self.assets_dir.join(run.artifact_name("narration", "mp3"));
        let audio = match bounded(
            self.timeouts.narrate,
            self.narrator.synthesize(&refined_script, &destination),
        )
        .await
        {
            Some(Ok(audio)) => Some(audio),
            Some(Err(e)) => {
                log::warn!("pipeline[{}]: narration failed: {e}", run.id());
                None
            }
            None => {
                log::warn!("pipeline[{}]: narration timed out", run.id());
                None
            }
        };

        // ── 3. Compose ───────────────────────────────────────────────────
        run.advance();
        let video_path = match &audio {
            Some(audio) => {
                let destination = self.assets_dir.join(run.artifact_name("video", "mp4"));
                match bounded(
                    self.timeouts.compose,
                    self.composer.compose(audio, &refined_script, &destination),
                )
                .await
                {
                    Some(Ok(video)) => Some(video.path),
                    Some(Err(e)) => {
                        log::warn!(
                            "pipeline[{}]: compositing failed ({e}), returning audio",
                            run.id()
                        );
                        Some(audio.path.clone())
                    }
                    None => {
                        log::warn!(
                            "pipeline[{}]: compositing timed out, returning audio",
                            run.id()
                        );
                        Some(audio.path.clone())
                    }
                }
            }
            None => {
                log::info!("pipeline[{}]: no narration, skipping compositing", run.id());
                None
            }
        };
        let audio_path = audio.map(|a| a.path);

        // ── 4. Publish ───────────────────────────────────────────────────
        run.advance();
        let metadata = publication_metadata(
            &refined_script,
            audio_path.as_deref(),
            video_path.as_deref(),
        );
        let mint_id = match bounded(
            self.timeouts.publish,
            self.publisher.publish(&self.recipient, &metadata),
        )
        .await
        {
            Some(Ok(publication)) => Some(publication.id().to_string()),
            Some(Err(e)) => {
                log::warn!("pipeline[{}]: publishing failed: {e}", run.id());
                None
            }
            None => {
                log::warn!("pipeline[{}]: publishing timed out", run.id());
                None
            }
        };

        run.advance();
        Ok(PipelineResult {
            refined_script,
            audio_path,
            video_path,
            mint_id,
        })
    }

    /// Refined headline, or the local polish when refinement fails, times out
    /// or yields no usable line.
    async fn refine(&self, raw: &str) -> String {
        match bounded(self.timeouts.refine, self.refiner.refine(raw)).await {
            Some(Ok(text)) => match headline(&text) {
                Some(line) => line.to_string(),
                None => {
                    log::warn!("pipeline: refined script is blank, polishing locally");
                    polish_locally(raw)
                }
            },
            Some(Err(e)) => {
                log::warn!("pipeline: refinement failed ({e}), polishing locally");
                polish_locally(raw)
            }
            None => {
                log::warn!("pipeline: refinement timed out, polishing locally");
                polish_locally(raw)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `None` when `budget` elapses first.  The stage future is dropped, which
/// kills any child process it spawned.
async fn bounded<F: Future>(budget: Duration, fut: F) -> Option<F::Output> {
    tokio::time::timeout(budget, fut).await.ok()
}

fn publication_metadata(
    script: &str,
    audio_path: Option<&Path>,
    video_path: Option<&Path>,
) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("script".into(), script.to_string());
    metadata.insert(
        "date_created".into(),
        chrono::Utc::now().format("%Y-%m-%d").to_string(),
    );
    if let Some(path) = audio_path {
        metadata.insert("audio_path".into(), path.display().to_string());
    }
    if let Some(path) = video_path {
        metadata.insert("video_path".into(), path.display().to_string());
    }
    metadata
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::narration::MockSynthesizer;
    use crate::publish::{MockPublisher, Publication, PublishError, PLACEHOLDER_MINT_ID};
    use crate::script::{MockRefiner, RefineError};
    use crate::video::MockComposer;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Refiner that never answers within any sane budget.
    struct StalledRefiner;

    #[async_trait]
    impl ScriptRefiner for StalledRefiner {
        async fn refine(&self, _raw: &str) -> Result<String, RefineError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("too late".into())
        }
    }

    /// Publisher that keeps the metadata it was given.
    #[derive(Default)]
    struct RecordingPublisher {
        seen: Mutex<Option<(String, Metadata)>>,
    }

    #[async_trait]
    impl AssetPublisher for RecordingPublisher {
        async fn publish(
            &self,
            recipient: &str,
            metadata: &Metadata,
        ) -> Result<Publication, PublishError> {
            *self.seen.lock().unwrap() = Some((recipient.to_string(), metadata.clone()));
            Ok(Publication::Skipped)
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn orchestrator(
        assets: &Path,
        refiner: impl ScriptRefiner + 'static,
        narrator: impl NarrationSynthesizer + 'static,
        composer: impl VideoComposer + 'static,
        publisher: impl AssetPublisher + 'static,
    ) -> PipelineOrchestrator {
        PipelineOrchestrator::new(
            Arc::new(refiner),
            Arc::new(narrator),
            Arc::new(composer),
            Arc::new(publisher),
            assets,
        )
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn unreachable_refiner_uses_local_polish() {
        let dir = tempfile::tempdir().unwrap();
        let orc = orchestrator(
            dir.path(),
            MockRefiner::Fail,
            MockSynthesizer::Ok(b"mp3".to_vec()),
            MockComposer::Ok,
            MockPublisher::Skipped,
        );

        let result = orc.run("hello world").await.unwrap();
        assert_eq!(result.refined_script, "Hello World. Enjoy!");
    }

    #[tokio::test]
    async fn narration_failure_continues_without_audio() {
        let dir = tempfile::tempdir().unwrap();
        let orc = orchestrator(
            dir.path(),
            MockRefiner::Ok("Dogs are great.".into()),
            MockSynthesizer::Status(401),
            MockComposer::Ok,
            MockPublisher::Skipped,
        );

        let result = orc.run("dogs are great").await.unwrap();
        assert_eq!(result.refined_script, "Dogs are great.");
        assert!(result.audio_path.is_none());
        assert!(result.video_path.is_none());
        assert_eq!(result.mint_id.as_deref(), Some(PLACEHOLDER_MINT_ID));
    }

    #[tokio::test]
    async fn all_stages_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let orc = orchestrator(
            dir.path(),
            MockRefiner::Ok("Dogs are great.\nNote: kept it short.".into()),
            MockSynthesizer::Ok(b"mp3".to_vec()),
            MockComposer::Ok,
            MockPublisher::Minted("mint-1".into()),
        );

        let result = orc.run("dogs are great").await.unwrap();
        assert_eq!(result.refined_script, "Dogs are great.");

        let audio = result.audio_path.expect("audio path");
        let video = result.video_path.expect("video path");
        assert!(audio.exists());
        assert!(video.exists());
        assert_ne!(audio, video);
        assert!(audio.starts_with(dir.path()));
        assert_eq!(video.extension().and_then(|e| e.to_str()), Some("mp4"));
        assert_eq!(result.mint_id.as_deref(), Some("mint-1"));
    }

    #[tokio::test]
    async fn compose_failure_returns_audio_path() {
        let dir = tempfile::tempdir().unwrap();
        let orc = orchestrator(
            dir.path(),
            MockRefiner::Ok("Short.".into()),
            MockSynthesizer::Ok(b"mp3".to_vec()),
            MockComposer::Fail,
            MockPublisher::Minted("mint-2".into()),
        );

        let result = orc.run("short").await.unwrap();
        assert!(result.audio_path.is_some());
        assert_eq!(result.video_path, result.audio_path);
    }

    #[tokio::test]
    async fn publish_failure_is_null_not_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let orc = orchestrator(
            dir.path(),
            MockRefiner::Ok("Short.".into()),
            MockSynthesizer::Ok(b"mp3".to_vec()),
            MockComposer::Ok,
            MockPublisher::Fail,
        );

        let result = orc.run("short").await.unwrap();
        assert!(result.mint_id.is_none());
        assert!(result.video_path.is_some());
    }

    #[tokio::test]
    async fn refine_timeout_degrades_like_failure() {
        let dir = tempfile::tempdir().unwrap();
        let orc = orchestrator(
            dir.path(),
            StalledRefiner,
            MockSynthesizer::Status(500),
            MockComposer::Ok,
            MockPublisher::Skipped,
        )
        .with_timeouts(StageTimeouts {
            refine: Duration::from_millis(50),
            ..StageTimeouts::default()
        });

        let result = orc.run("hello world").await.unwrap();
        assert_eq!(result.refined_script, "Hello World. Enjoy!");
    }

    #[tokio::test]
    async fn blank_refinement_uses_local_polish() {
        let dir = tempfile::tempdir().unwrap();
        let orc = orchestrator(
            dir.path(),
            MockRefiner::Ok(" \n\t\n".into()),
            MockSynthesizer::Status(500),
            MockComposer::Ok,
            MockPublisher::Skipped,
        );

        let result = orc.run("cats").await.unwrap();
        assert_eq!(result.refined_script, "Cats. Enjoy!");
    }

    #[tokio::test]
    async fn publisher_receives_script_and_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = Arc::new(RecordingPublisher::default());
        let orc = PipelineOrchestrator::new(
            Arc::new(MockRefiner::Ok("Dogs are great.".into())),
            Arc::new(MockSynthesizer::Ok(b"mp3".to_vec())),
            Arc::new(MockComposer::Ok),
            Arc::clone(&publisher) as Arc<dyn AssetPublisher>,
            dir.path(),
        )
        .with_recipient("email:someone@example.com:solana");

        let result = orc.run("dogs").await.unwrap();

        let (recipient, metadata) = publisher.seen.lock().unwrap().take().unwrap();
        assert_eq!(recipient, "email:someone@example.com:solana");
        assert_eq!(metadata["script"], "Dogs are great.");
        assert_eq!(metadata["date_created"].len(), 10);
        assert_eq!(
            metadata["video_path"],
            result.video_path.unwrap().display().to_string()
        );
        assert!(metadata.contains_key("audio_path"));
    }

    #[tokio::test]
    async fn concurrent_runs_use_distinct_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let orc = orchestrator(
            dir.path(),
            MockRefiner::Ok("Same text.".into()),
            MockSynthesizer::Ok(b"mp3".to_vec()),
            MockComposer::Ok,
            MockPublisher::Skipped,
        );

        let (a, b) = tokio::join!(orc.run("same"), orc.run("same"));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.audio_path, b.audio_path);
        assert_ne!(a.video_path, b.video_path);
    }

    #[tokio::test]
    async fn uncreatable_asset_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let orc = orchestrator(
            &blocker.join("assets"),
            MockRefiner::Ok("Text.".into()),
            MockSynthesizer::Ok(b"mp3".to_vec()),
            MockComposer::Ok,
            MockPublisher::Skipped,
        );

        let err = orc.run("text").await.unwrap_err();
        assert!(matches!(err, PipelineError::AssetDir { .. }));
        assert!(err.to_string().contains("not-a-dir"));
    }

    #[test]
    fn timeouts_follow_config() {
        let config = PipelineConfig {
            refine_timeout_secs: 1,
            narrate_timeout_secs: 2,
            compose_timeout_secs: 3,
            publish_timeout_secs: 4,
        };
        let t = StageTimeouts::from(&config);
        assert_eq!(t.refine, Duration::from_secs(1));
        assert_eq!(t.publish, Duration::from_secs(4));
    }
}
