//! Configuration module for Creator Studio.
//!
//! Provides `AppConfig` (top-level settings), one sub-config per pipeline
//! stage, `AppPaths` for the platform config directory, and TOML persistence
//! via `AppConfig::load` / `AppConfig::save_to`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, AssetConfig, CaptionStyle, NarrationConfig, PipelineConfig, PublishConfig,
    ScriptConfig, ServerConfig, VideoConfig,
};
