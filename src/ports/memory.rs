//! In-memory persistence collaborator, used by tests and the demo CLI.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::offer::{NormalizedOffer, SourceId};
use crate::domain::shipping::ShippingRule;

use super::store::{OfferStore, StoreError};

/// Offer store that keeps everything in memory and records bulk inserts.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    sources: Vec<(String, SourceId)>,
    rules: Vec<ShippingRule>,
    offers: Arc<Mutex<Vec<NormalizedOffer>>>,
    fail_inserts: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the default source registry.
    pub fn with_default_sources() -> Self {
        Self::new().with_sources(vec![
            ("rakuten".to_string(), SourceId(1)),
            ("yahoo".to_string(), SourceId(2)),
            ("amazon".to_string(), SourceId(3)),
            ("tavily".to_string(), SourceId(4)),
        ])
    }

    pub fn with_sources(mut self, sources: Vec<(String, SourceId)>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_rules(mut self, rules: Vec<ShippingRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Make every bulk insert fail, for persistence-failure tests.
    pub fn with_failing_inserts(mut self) -> Self {
        self.fail_inserts = true;
        self
    }

    /// Snapshot of everything inserted so far.
    pub fn offers(&self) -> Vec<NormalizedOffer> {
        self.offers.lock().expect("offer lock poisoned").clone()
    }
}

#[async_trait]
impl OfferStore for InMemoryStore {
    async fn list_enabled_sources(&self) -> Result<Vec<(String, SourceId)>, StoreError> {
        Ok(self.sources.clone())
    }

    async fn bulk_insert_offers(&self, offers: &[NormalizedOffer]) -> Result<(), StoreError> {
        if self.fail_inserts {
            return Err(StoreError::Backend("insert rejected".to_string()));
        }
        self.offers
            .lock()
            .map_err(|_| StoreError::Backend("offer lock poisoned".to_string()))?
            .extend_from_slice(offers);
        Ok(())
    }

    async fn list_enabled_shipping_rules(&self) -> Result<Vec<ShippingRule>, StoreError> {
        Ok(self.rules.iter().filter(|r| r.enabled).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::offer::{normalize_offers, ItemId, RawOffer};

    #[tokio::test]
    async fn test_insert_then_read_back() {
        let store = InMemoryStore::with_default_sources();
        let offers = normalize_offers(
            vec![RawOffer::default()],
            ItemId(1),
            Some(SourceId(1)),
            chrono::Utc::now(),
        );

        store.bulk_insert_offers(&offers).await.unwrap();
        assert_eq!(store.offers().len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_rules_filtered() {
        let enabled = ShippingRule {
            carrier: "c".to_string(),
            service_name: "on".to_string(),
            max_l: None,
            max_w: None,
            max_h: None,
            max_weight: None,
            price: 100,
            packaging_cost: 0,
            enabled: true,
        };
        let mut disabled = enabled.clone();
        disabled.service_name = "off".to_string();
        disabled.enabled = false;

        let store = InMemoryStore::new().with_rules(vec![enabled, disabled]);
        let rules = store.list_enabled_shipping_rules().await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].service_name, "on");
    }

    #[tokio::test]
    async fn test_failing_inserts() {
        let store = InMemoryStore::new().with_failing_inserts();
        let result = store.bulk_insert_offers(&[]).await;
        assert!(matches!(result, Err(StoreError::Backend(_))));
    }
}
