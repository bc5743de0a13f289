//! Application entry point: Creator Studio.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load `.env`, parse the command line, then load [`AppConfig`] from disk
//!    (defaults on first run) and apply credential overrides from the
//!    environment.
//! 3. Build the [`PipelineOrchestrator`] from config.
//! 4. `--stdin`: run the pipeline once on standard input and print the result.
//!    Otherwise serve the HTTP API until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::io::AsyncReadExt;

use creator_studio::config::{paths::CONFIG_PATH_ENV, AppConfig};
use creator_studio::{pipeline::PipelineOrchestrator, server};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "creator-studio")]
#[command(about = "Turn a raw script into a narrated, captioned short video")]
#[command(version)]
struct Cli {
    /// Run the pipeline once on a script read from standard input and print
    /// the result as JSON instead of serving HTTP
    #[arg(long)]
    stdin: bool,

    /// Path to settings.toml
    #[arg(short, long, env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = dotenvy::dotenv() {
        log::debug!("no .env loaded: {e}");
    }

    let cli = Cli::parse();
    log::info!("Creator Studio starting up");

    let loaded = match &cli.config {
        Some(path) => {
            log::info!("loading configuration from {}", path.display());
            AppConfig::load_from(path)
        }
        None => AppConfig::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    config.apply_env_overrides();

    if config.script.api_key.is_none() {
        log::warn!("MISTRAL_API_KEY not set; scripts will be polished locally");
    }
    if config.narration.api_key.is_none() {
        log::warn!("ELEVENLABS_API_KEY not set; narration will be skipped");
    }
    if !config.publish.has_credentials() {
        log::info!("Crossmint credentials not set; mint ids will be placeholders");
    }

    tokio::fs::create_dir_all(&config.assets.dir)
        .await
        .with_context(|| format!("failed to create {}", config.assets.dir.display()))?;

    let orchestrator = Arc::new(PipelineOrchestrator::from_config(&config));

    if !cli.stdin {
        return server::serve(&config.server, orchestrator).await;
    }

    let mut raw = String::new();
    tokio::io::stdin()
        .read_to_string(&mut raw)
        .await
        .context("failed to read script from stdin")?;
    if raw.trim().is_empty() {
        bail!("no script on stdin");
    }

    let result = orchestrator.run(&raw).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
