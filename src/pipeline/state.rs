//! Pipeline stage machine and the per-request result record.
//!
//! [`PipelineStage`] is strictly linear; [`PipelineRun`] tracks one request's
//! position in it and logs every transition under the request id.
//! [`PipelineResult`] is the aggregate returned to the HTTP gateway.

use std::path::PathBuf;

use serde::Serialize;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// PipelineStage
// ---------------------------------------------------------------------------

/// Stages of one pipeline run.
///
/// ```text
/// Start ─▶ Refine ─▶ Narrate ─▶ Compose ─▶ Publish ─▶ Done
/// ```
///
/// There are no branches: a failing stage degrades to its fallback value and
/// the run still advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineStage {
    #[default]
    Start,
    Refine,
    Narrate,
    Compose,
    Publish,
    Done,
}

impl PipelineStage {
    /// The stage that follows `self`, or `None` after `Done`.
    ///
    /// ```
    /// use creator_studio::pipeline::PipelineStage;
    ///
    /// assert_eq!(PipelineStage::Start.next(), Some(PipelineStage::Refine));
    /// assert_eq!(PipelineStage::Publish.next(), Some(PipelineStage::Done));
    /// assert_eq!(PipelineStage::Done.next(), None);
    /// ```
    pub fn next(self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Start => Some(PipelineStage::Refine),
            PipelineStage::Refine => Some(PipelineStage::Narrate),
            PipelineStage::Narrate => Some(PipelineStage::Compose),
            PipelineStage::Compose => Some(PipelineStage::Publish),
            PipelineStage::Publish => Some(PipelineStage::Done),
            PipelineStage::Done => None,
        }
    }

    /// Short label used in log lines.
    pub fn label(self) -> &'static str {
        match self {
            PipelineStage::Start => "start",
            PipelineStage::Refine => "refine",
            PipelineStage::Narrate => "narrate",
            PipelineStage::Compose => "compose",
            PipelineStage::Publish => "publish",
            PipelineStage::Done => "done",
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineRun
// ---------------------------------------------------------------------------

/// One request's walk through the stages.
#[derive(Debug)]
pub struct PipelineRun {
    id: Uuid,
    stage: PipelineStage,
}

impl PipelineRun {
    /// Start a run with a fresh random id.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            stage: PipelineStage::Start,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Move to the next stage and return it.  Stays at `Done` once reached.
    pub fn advance(&mut self) -> PipelineStage {
        if let Some(next) = self.stage.next() {
            log::info!(
                "pipeline[{}]: {} → {}",
                self.id,
                self.stage.label(),
                next.label()
            );
            self.stage = next;
        }
        self.stage
    }

    /// Artifact file name namespaced by this run, e.g. `narration-<id>.mp3`.
    pub fn artifact_name(&self, stem: &str, extension: &str) -> String {
        format!("{stem}-{}.{extension}", self.id.simple())
    }
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// PipelineResult
// ---------------------------------------------------------------------------

/// Aggregate output of one run, serialised as the `data` field of the
/// `/generate` response.
///
/// `audio_path` is `null` when narration failed; `video_path` holds the audio
/// path when compositing degraded and `null` when there was no audio;
/// `mint_id` is the placeholder when publishing was skipped and `null` when it
/// failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    pub refined_script: String,
    pub audio_path: Option<PathBuf>,
    pub video_path: Option<PathBuf>,
    pub mint_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
