//! Script refinement stage.
//!
//! This module provides:
//! * [`ScriptRefiner`]: async trait implemented by all refiner backends.
//! * [`ApiRefiner`]: OpenAI-compatible chat-completions refiner.
//! * [`FallbackRefiner`]: wraps any refiner; polishes locally on failure.
//! * [`polish_locally`]: the pure, deterministic local polish.
//! * [`RefineError`]: error variants for refinement.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use creator_studio::config::AppConfig;
//! use creator_studio::script::{ApiRefiner, FallbackRefiner, ScriptRefiner};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let refiner = FallbackRefiner::new(ApiRefiner::from_config(&config.script));
//!
//!     let refined = refiner.refine("hey guys dogs are great").await.unwrap();
//!     println!("{refined}");
//! }
//! ```

pub mod fallback;
pub mod prompt;
pub mod refiner;

pub use fallback::{polish_locally, FallbackRefiner};
pub use prompt::headline;
pub use refiner::{ApiRefiner, RefineError, ScriptRefiner};

#[cfg(test)]
pub use refiner::MockRefiner;
