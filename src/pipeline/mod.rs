//! Pipeline orchestrator module for Creator Studio.
//!
//! This module sequences the four content stages for one request and exposes
//! the result record the HTTP gateway serialises.
//!
//! # Architecture
//!
//! ```text
//! POST /generate { text }
//!        │
//!        ▼
//! PipelineOrchestrator::run()  ← one call per request, shared via Arc
//!        │
//!        ├─ ScriptRefiner::refine          → Refine
//!        ├─ NarrationSynthesizer::synthesize → Narrate
//!        ├─ VideoComposer::compose          → Compose
//!        └─ AssetPublisher::publish         → Publish
//!        │
//!        ▼
//! PipelineResult { refined_script, audio_path, video_path, mint_id }
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use creator_studio::config::AppConfig;
//! use creator_studio::pipeline::PipelineOrchestrator;
//!
//! #[tokio::main]
//! async fn main() {
//!     let orchestrator = PipelineOrchestrator::from_config(&AppConfig::default());
//!     match orchestrator.run("hello world").await {
//!         Ok(result) => println!("{}", result.refined_script),
//!         Err(e) => eprintln!("{e}"),
//!     }
//! }
//! ```

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{PipelineError, PipelineOrchestrator, StageTimeouts};
pub use state::{PipelineResult, PipelineRun, PipelineStage};
