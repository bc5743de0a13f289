//! Core `ScriptRefiner` trait and `ApiRefiner` implementation.
//!
//! `ApiRefiner` calls any OpenAI-compatible `/v1/chat/completions` endpoint
//! (Mistral, OpenAI, Groq, Ollama in OpenAI mode …).  All connection details
//! come from [`ScriptConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ScriptConfig;
use crate::script::prompt::{build_prompt, extract_refined};

// ---------------------------------------------------------------------------
// RefineError
// ---------------------------------------------------------------------------

/// Errors that can occur during script refinement.
#[derive(Debug, Error)]
pub enum RefineError {
    /// No API key configured; no request was sent.
    #[error("text-generation API key is not configured")]
    MissingCredential,

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The endpoint answered with a non-success status.
    #[error("text-generation service returned HTTP {0}")]
    Status(u16),

    /// The request did not complete within the configured timeout.
    #[error("text-generation request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse text-generation response: {0}")]
    Parse(String),

    /// The model returned no usable text content.
    #[error("text-generation service returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for RefineError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RefineError::Timeout
        } else {
            RefineError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptRefiner trait
// ---------------------------------------------------------------------------

/// Async trait for the script refinement stage.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn ScriptRefiner>` across request handlers.
#[async_trait]
pub trait ScriptRefiner: Send + Sync {
    /// Polish `raw` into a short-form video script.
    async fn refine(&self, raw: &str) -> Result<String, RefineError>;
}

// ---------------------------------------------------------------------------
// ApiRefiner
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct ApiRefiner {
    client: reqwest::Client,
    config: ScriptConfig,
}

impl ApiRefiner {
    /// Build an `ApiRefiner` from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`.
    pub fn from_config(config: &ScriptConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl ScriptRefiner for ApiRefiner {
    async fn refine(&self, raw: &str) -> Result<String, RefineError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(RefineError::MissingCredential)?;

        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let body = serde_json::json!({
            "model":       self.config.model,
            "messages": [
                { "role": "user", "content": build_prompt(raw) }
            ],
            "temperature": self.config.temperature,
            "max_tokens":  self.config.max_tokens
        });

        log::debug!("refiner: POST {url} (model={})", self.config.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefineError::Status(status.as_u16()));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RefineError::Parse(e.to_string()))?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(RefineError::EmptyResponse)?;

        let refined = extract_refined(content);
        if refined.is_empty() {
            return Err(RefineError::EmptyResponse);
        }

        Ok(refined)
    }
}

// ---------------------------------------------------------------------------
// MockRefiner (tests only)
// ---------------------------------------------------------------------------

/// Test double returning a fixed reply or a fixed failure.
#[cfg(test)]
pub enum MockRefiner {
    Ok(String),
    Fail,
}

#[cfg(test)]
#[async_trait]
impl ScriptRefiner for MockRefiner {
    async fn refine(&self, _raw: &str) -> Result<String, RefineError> {
        match self {
            MockRefiner::Ok(text) => Ok(text.clone()),
            MockRefiner::Fail => Err(RefineError::Request("connection refused".into())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
