//! Video compositing stage: narration audio + script → captioned vertical video.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                VideoComposer (trait)                 │
//! │                                                      │
//! │   ┌──────────────┐    ┌──────────────────┐          │
//! │   │  probe       │    │  captions        │          │
//! │   │ - ffprobe    │    │ - plan_captions  │          │
//! │   │   duration   │    │ - render_ass     │          │
//! │   └──────┬───────┘    └────────┬─────────┘          │
//! │          └──────────┬──────────┘                     │
//! │                     ▼                                │
//! │            FfmpegComposer::compose                   │
//! │            (scratch TempDir, ffmpeg CLI)             │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod captions;
pub mod composer;
pub mod probe;

pub use captions::{plan_captions, render_ass, CaptionEvent, CaptionLayer, CaptionPlan};
pub use composer::{ComposeError, FfmpegComposer, VideoArtifact, VideoComposer};
pub use probe::probe_duration;

#[cfg(test)]
pub use composer::MockComposer;
