//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\creator-studio\
//!   macOS:   ~/Library/Application Support/creator-studio/
//!   Linux:   ~/.config/creator-studio/
//!
//! The settings file location can be overridden with the
//! `CREATOR_STUDIO_CONFIG` environment variable.

use std::path::PathBuf;

/// Environment variable naming an explicit `settings.toml` path.
pub const CONFIG_PATH_ENV: &str = "CREATOR_STUDIO_CONFIG";

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory holding `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "creator-studio";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => config_dir.join("settings.toml"),
        };

        Self {
            config_dir,
            settings_file,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
