//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and handed to each stage's
//! constructor.  Credentials are plain `Option<String>` fields: absent (or
//! empty) means the stage degrades, present means it calls out.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// Bind address of the HTTP gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
        }
    }
}

// ---------------------------------------------------------------------------
// AssetConfig
// ---------------------------------------------------------------------------

/// Where generated artifacts are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory for narration and video files; also served under `/assets`.
    pub dir: PathBuf,
    /// Parent directory for per-render scratch directories.  `None` uses the
    /// system temp directory.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("assets"),
            scratch_dir: None,
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptConfig
// ---------------------------------------------------------------------------

/// Settings for the script refinement stage (OpenAI-compatible chat API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// Base URL of the API endpoint.
    ///
    /// - Mistral: `https://api.mistral.ai`
    /// - OpenAI: `https://api.openai.com`
    pub base_url: String,
    /// API key.  `None` makes the refiner fall back to the local polish.
    pub api_key: Option<String>,
    /// Model identifier sent to the API.
    pub model: String,
    /// Sampling temperature (0.0 – 1.0).
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Maximum seconds to wait for a response.
    pub timeout_secs: u64,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.mistral.ai".into(),
            api_key: None,
            model: "mistral-small-latest".into(),
            temperature: 0.3,
            max_tokens: 512,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// NarrationConfig
// ---------------------------------------------------------------------------

/// Settings for the ElevenLabs speech-synthesis stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    pub base_url: String,
    /// `xi-api-key` header value.  `None` makes synthesis fail immediately.
    pub api_key: Option<String>,
    /// Voice identifier (default: "Rachel").
    pub voice_id: String,
    pub model_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
    /// Size in bytes of the write buffer used while streaming audio to disk.
    pub chunk_size: usize,
    pub timeout_secs: u64,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".into(),
            api_key: None,
            voice_id: "21m00Tcm4TlvDq8ikWAM".into(),
            model_id: "eleven_monolingual_v1".into(),
            stability: 0.5,
            similarity_boost: 0.5,
            chunk_size: 1024,
            timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// VideoConfig
// ---------------------------------------------------------------------------

/// How captions are laid over the video track.
///
/// | Variant    | Visual                                                    |
/// |------------|-----------------------------------------------------------|
/// | Static     | The whole script, centred, for the full duration          |
/// | WordByWord | One word at a time plus an optional blinking call-to-action |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CaptionStyle {
    Static,
    WordByWord,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self::Static
    }
}

/// Settings for the ffmpeg-based video compositing stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Frame width in pixels (vertical 9:16 by default).
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    pub fps: u32,
    /// Background colour understood by ffmpeg's `color` source.
    pub background: String,
    pub font: String,
    pub font_size: u32,
    /// Caption colour as `#RRGGBB`.
    pub text_color: String,
    pub caption_style: CaptionStyle,
    /// Word-by-word only: draw the active word in `highlight_color`.
    pub highlight_active_word: bool,
    pub highlight_color: String,
    /// Word-by-word only: decorative overlay near the bottom of the frame.
    pub call_to_action: Option<String>,
    /// Blink period of the call-to-action overlay, in seconds.
    pub cta_period_secs: f64,
    /// Fraction of each period (0.0 – 1.0) during which the overlay is shown.
    pub cta_duty_cycle: f64,
    pub ffmpeg_bin: PathBuf,
    pub ffprobe_bin: PathBuf,
    pub video_codec: String,
    pub audio_codec: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 24,
            background: "black".into(),
            font: "DejaVu Sans".into(),
            font_size: 72,
            text_color: "#FFFFFF".into(),
            caption_style: CaptionStyle::default(),
            highlight_active_word: true,
            highlight_color: "#FFD700".into(),
            call_to_action: Some("Follow for more!".into()),
            cta_period_secs: 1.0,
            cta_duty_cycle: 0.5,
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            ffprobe_bin: PathBuf::from("ffprobe"),
            video_codec: "libx264".into(),
            audio_codec: "aac".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// PublishConfig
// ---------------------------------------------------------------------------

/// Settings for the Crossmint NFT publishing stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub base_url: String,
    /// `X-CLIENT-SECRET` header value.
    pub api_key: Option<String>,
    /// `X-PROJECT-ID` header value.
    pub project_id: Option<String>,
    pub collection: String,
    /// Recipient locator, e.g. `email:someone@example.com:solana`.
    pub recipient: String,
    pub asset_name: String,
    pub image_url: String,
    pub description: String,
    pub compress: bool,
    pub timeout_secs: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            base_url: "https://staging.crossmint.com/api".into(),
            api_key: None,
            project_id: None,
            collection: "default".into(),
            recipient: "email:testuser@example.com:solana".into(),
            asset_name: "Creator Studio Asset License".into(),
            image_url: "https://avatars.githubusercontent.com/u/158211379?s=200&v=4".into(),
            description: "This NFT certifies the ownership of a digital asset created by \
                          the Creator's Studio Agent."
                .into(),
            compress: false,
            timeout_secs: 30,
        }
    }
}

impl PublishConfig {
    /// `true` only when both credential fields are present and non-empty.
    pub fn has_credentials(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.api_key) && present(&self.project_id)
    }
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Per-stage time budgets enforced by the orchestrator.  A stage that runs
/// past its budget degrades exactly as if it had failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub refine_timeout_secs: u64,
    pub narrate_timeout_secs: u64,
    pub compose_timeout_secs: u64,
    pub publish_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            refine_timeout_secs: 45,
            narrate_timeout_secs: 90,
            compose_timeout_secs: 300,
            publish_timeout_secs: 45,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use creator_studio::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let mut config = AppConfig::load().unwrap();
/// config.apply_env_overrides();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub assets: AssetConfig,
    pub script: ScriptConfig,
    pub narration: NarrationConfig,
    pub video: VideoConfig,
    pub publish: PublishConfig,
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`
    /// (or the file named by `CREATOR_STUDIO_CONFIG`).
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Write configuration as TOML, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Overlay credentials from the process environment.
    ///
    /// Reads `MISTRAL_API_KEY`, `ELEVENLABS_API_KEY`, `CROSSMINT_API_KEY` and
    /// `CROSSMINT_PROJECT_ID`.  Unset or empty variables leave the file value
    /// untouched.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Same as [`apply_env_overrides`](Self::apply_env_overrides) with an
    /// injectable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("MISTRAL_API_KEY") {
            self.script.api_key = Some(key);
        }
        if let Some(key) = get("ELEVENLABS_API_KEY") {
            self.narration.api_key = Some(key);
        }
        if let Some(key) = get("CROSSMINT_API_KEY") {
            self.publish.api_key = Some(key);
        }
        if let Some(id) = get("CROSSMINT_PROJECT_ID") {
            self.publish.project_id = Some(id);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
