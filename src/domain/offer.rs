//! Offer records
//!
//! `RawOffer` is what a single backend returns; `NormalizedOffer` is the
//! common shape handed to the store after stamping and total computation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier of a registered source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId(pub i64);

/// Identifier of the item a refresh was requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub i64);

/// One offer as mapped from a backend response. Fields a backend cannot
/// provide stay `None`; they are never zero-filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOffer {
    pub title: Option<String>,
    /// Price in the source currency, whole units (yen).
    pub price: Option<i64>,
    /// Shipping cost when the backend states it. `Some(0)` means postage
    /// included; `None` means unknown.
    pub shipping: Option<i64>,
    pub stock_status: Option<String>,
    pub url: Option<String>,
    /// Source-specific relevance score in 0..=1, if the backend has one.
    pub confidence: Option<f64>,
    /// Free-text snippet the price was extracted from, if any.
    pub raw_text: Option<String>,
}

/// Offer in the common schema, immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedOffer {
    pub item_id: ItemId,
    pub source_id: Option<SourceId>,
    pub title: Option<String>,
    pub price: Option<i64>,
    pub shipping: Option<i64>,
    /// `price + shipping.unwrap_or(0)`, present iff `price` is present.
    pub total: Option<i64>,
    pub stock_status: Option<String>,
    pub url: Option<String>,
    pub confidence: Option<f64>,
    pub fetched_at: DateTime<Utc>,
    pub raw_text: Option<String>,
}

/// Stamp raw offers from one source with the identifiers of the fetch that
/// produced them and compute totals.
pub fn normalize_offers(
    raw: Vec<RawOffer>,
    item_id: ItemId,
    source_id: Option<SourceId>,
    fetched_at: DateTime<Utc>,
) -> Vec<NormalizedOffer> {
    raw.into_iter()
        .map(|offer| {
            let total = offer.price.map(|p| p + offer.shipping.unwrap_or(0));
            NormalizedOffer {
                item_id,
                source_id,
                title: offer.title,
                price: offer.price,
                shipping: offer.shipping,
                total,
                stock_status: offer.stock_status,
                url: offer.url,
                confidence: offer.confidence,
                fetched_at,
                raw_text: offer.raw_text,
            }
        })
        .collect()
}
