//! Persistence collaborator port.
//!
//! The core never opens or manages storage itself; it consumes the source
//! registry and hands merged offers to a bulk insert.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::offer::{NormalizedOffer, SourceId};
use crate::domain::shipping::ShippingRule;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait OfferStore: Send + Sync {
    /// Enabled entries of the source registry, name to opaque id.
    async fn list_enabled_sources(&self) -> Result<Vec<(String, SourceId)>, StoreError>;

    /// Persist one refresh operation's merged offers.
    async fn bulk_insert_offers(&self, offers: &[NormalizedOffer]) -> Result<(), StoreError>;

    /// Enabled shipping rules for the estimator.
    async fn list_enabled_shipping_rules(&self) -> Result<Vec<ShippingRule>, StoreError>;
}
