//! Search backend port.

use async_trait::async_trait;
use thiserror::Error;

use crate::adapters::http::RequestError;
use crate::domain::offer::RawOffer;

/// Failure of one backend call. "No results" and "missing credentials" are
/// not errors; adapters return an empty list for those.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Request(#[from] RequestError),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// One external marketplace/search backend.
///
/// New backends register by implementing this trait; the orchestrator needs
/// no change beyond a registry entry.
#[async_trait]
pub trait OfferSource: Send + Sync {
    /// Registry name this adapter serves.
    fn name(&self) -> &'static str;

    /// Search the backend for the keyword.
    ///
    /// Missing credentials and an empty keyword soft-disable the source and
    /// yield `Ok` with no offers. Network and protocol failures propagate to
    /// the orchestrator, which isolates them.
    async fn search_offers(&self, keyword: &str) -> Result<Vec<RawOffer>, SourceError>;
}
