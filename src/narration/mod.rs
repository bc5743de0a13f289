//! Narration stage: text → synthesized speech file.
//!
//! [`NarrationSynthesizer`] is the stage interface; [`ElevenLabsSynthesizer`]
//! is the production backend.  Failures are returned as [`NarrationError`]
//! and it is up to the pipeline to decide what a missing narration means.

pub mod synthesizer;

pub use synthesizer::{AudioArtifact, ElevenLabsSynthesizer, NarrationError, NarrationSynthesizer};

#[cfg(test)]
pub use synthesizer::MockSynthesizer;
