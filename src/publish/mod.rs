//! Publishing stage: certify the finished asset on an external ledger.
//!
//! [`AssetPublisher`] is the stage interface; [`CrossmintPublisher`] mints an
//! NFT through Crossmint, or reports [`Publication::Skipped`] without any
//! network traffic when credentials are absent.

pub mod publisher;

pub use publisher::{
    AssetPublisher, CrossmintPublisher, Metadata, Publication, PublicationRecord, PublishError,
    PLACEHOLDER_MINT_ID,
};

#[cfg(test)]
pub use publisher::MockPublisher;
