//! Core `AssetPublisher` trait and the Crossmint implementation.
//!
//! Outcomes are three-way:
//!
//! | Result                         | Meaning                               |
//! |--------------------------------|---------------------------------------|
//! | `Ok(Publication::Minted(_))`   | the ledger assigned an identifier     |
//! | `Ok(Publication::Skipped)`     | no credentials, nothing was sent      |
//! | `Err(PublishError)`            | a request was attempted and failed    |

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::PublishConfig;

/// Identifier reported when publishing was skipped for lack of credentials.
pub const PLACEHOLDER_MINT_ID: &str = "placeholder_mint_id";

/// Caller-supplied metadata attributes (ordered for stable payloads).
pub type Metadata = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Publication
// ---------------------------------------------------------------------------

/// What the ledger returned for one certified asset.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicationRecord {
    pub id: String,
    pub metadata: Metadata,
}

/// Successful publisher outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Publication {
    Minted(PublicationRecord),
    Skipped,
}

impl Publication {
    /// The assigned id, or [`PLACEHOLDER_MINT_ID`] when skipped.
    pub fn id(&self) -> &str {
        match self {
            Publication::Minted(record) => &record.id,
            Publication::Skipped => PLACEHOLDER_MINT_ID,
        }
    }
}

// ---------------------------------------------------------------------------
// PublishError
// ---------------------------------------------------------------------------

/// Errors that can occur while publishing.
#[derive(Debug, Error)]
pub enum PublishError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("ledger request timed out")]
    Timeout,

    /// The ledger answered with a non-success status.
    #[error("ledger service returned HTTP {0}")]
    Status(u16),

    /// The response was not JSON or carried no `id`.
    #[error("failed to parse ledger response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for PublishError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PublishError::Timeout
        } else {
            PublishError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// AssetPublisher trait
// ---------------------------------------------------------------------------

/// Async trait for the publishing stage.
#[async_trait]
pub trait AssetPublisher: Send + Sync {
    async fn publish(
        &self,
        recipient: &str,
        metadata: &Metadata,
    ) -> Result<Publication, PublishError>;
}

// ---------------------------------------------------------------------------
// CrossmintPublisher
// ---------------------------------------------------------------------------

/// Mints an NFT through the Crossmint collections API.
pub struct CrossmintPublisher {
    client: reqwest::Client,
    config: PublishConfig,
}

impl CrossmintPublisher {
    pub fn from_config(config: &PublishConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/2022-06-09/collections/{}/nfts",
            self.config.base_url.trim_end_matches('/'),
            self.config.collection
        )
    }

    /// Request body: the fixed asset description merged with `metadata`.
    fn payload(&self, recipient: &str, metadata: &Metadata) -> serde_json::Value {
        serde_json::json!({
            "recipient": recipient,
            "metadata": {
                "name": self.config.asset_name,
                "image": self.config.image_url,
                "description": self.config.description,
                "attributes": metadata
            },
            "compress": self.config.compress
        })
    }
}

#[async_trait]
impl AssetPublisher for CrossmintPublisher {
    async fn publish(
        &self,
        recipient: &str,
        metadata: &Metadata,
    ) -> Result<Publication, PublishError> {
        let (Some(key), Some(project)) = (
            self.config.api_key.as_deref().filter(|s| !s.is_empty()),
            self.config.project_id.as_deref().filter(|s| !s.is_empty()),
        ) else {
            log::warn!("publisher: ledger credentials missing, using placeholder mint id");
            return Ok(Publication::Skipped);
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("X-CLIENT-SECRET", key)
            .header("X-PROJECT-ID", project)
            .json(&self.payload(recipient, metadata))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Status(status.as_u16()));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PublishError::Parse(e.to_string()))?;

        let id = json["id"]
            .as_str()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PublishError::Parse("response carries no id".into()))?;

        log::info!("publisher: minted {id}");
        Ok(Publication::Minted(PublicationRecord {
            id: id.to_string(),
            metadata: metadata.clone(),
        }))
    }
}

// ---------------------------------------------------------------------------
// MockPublisher (tests only)
// ---------------------------------------------------------------------------

/// Test double for the three publisher outcomes.
#[cfg(test)]
pub enum MockPublisher {
    Minted(String),
    Skipped,
    Fail,
}

#[cfg(test)]
#[async_trait]
impl AssetPublisher for MockPublisher {
    async fn publish(
        &self,
        _recipient: &str,
        metadata: &Metadata,
    ) -> Result<Publication, PublishError> {
        match self {
            MockPublisher::Minted(id) => Ok(Publication::Minted(PublicationRecord {
                id: id.clone(),
                metadata: metadata.clone(),
            })),
            MockPublisher::Skipped => Ok(Publication::Skipped),
            MockPublisher::Fail => Err(PublishError::Status(500)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
