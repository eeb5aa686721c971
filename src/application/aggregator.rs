//! Aggregation Orchestrator
//!
//! Fans one keyword out to every enabled source concurrently, isolates
//! per-source failures, stamps and merges the results, and hands them to
//! the persistence collaborator.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::task::JoinSet;

use crate::adapters::{AmazonSource, RakutenSource, TavilySource, YahooSource};
use crate::config::AppConfig;
use crate::domain::offer::{normalize_offers, ItemId, NormalizedOffer, RawOffer, SourceId};
use crate::ports::secrets::SecretStore;
use crate::ports::source::OfferSource;
use crate::ports::store::{OfferStore, StoreError};

/// Only a registry or persistence failure aborts a refresh; individual
/// source failures are recovered locally.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub struct Aggregator {
    store: Arc<dyn OfferStore>,
    sources: Vec<Arc<dyn OfferSource>>,
}

impl Aggregator {
    /// Orchestrator over the four production adapters.
    pub fn new(
        store: Arc<dyn OfferStore>,
        secrets: Arc<dyn SecretStore>,
        config: &AppConfig,
    ) -> Self {
        let http = config.http_client_config();
        let sources: Vec<Arc<dyn OfferSource>> = vec![
            Arc::new(RakutenSource::new(secrets.clone(), http.clone())),
            Arc::new(YahooSource::new(secrets.clone(), http.clone())),
            Arc::new(AmazonSource::new(
                secrets.clone(),
                &config.sources.amazon_locale,
                http.clone(),
            )),
            Arc::new(TavilySource::new(secrets, http)),
        ];
        Self { store, sources }
    }

    /// Orchestrator over caller-provided sources. Used by tests and by the
    /// integration suite to swap in scripted or re-pointed adapters.
    pub fn with_sources(store: Arc<dyn OfferStore>, sources: Vec<Arc<dyn OfferSource>>) -> Self {
        Self { store, sources }
    }

    /// Fetch offers for the keyword from every enabled source, persist the
    /// merged set, and return how many offers were handed off.
    pub async fn refresh(&self, item_id: ItemId, keyword: &str) -> Result<usize, RefreshError> {
        // Registry resolved once per call; only enabled sources run.
        let registry: HashMap<String, SourceId> = self
            .store
            .list_enabled_sources()
            .await?
            .into_iter()
            .collect();

        // One timestamp for the whole aggregation, so offers from this
        // refresh are comparably stamped regardless of source.
        let fetched_at = Utc::now();

        let mut tasks: JoinSet<(usize, Result<Vec<RawOffer>, _>)> = JoinSet::new();
        for (index, source) in self.sources.iter().enumerate() {
            let name = source.name();
            if !registry.contains_key(name) {
                tracing::debug!(source = name, "source not in enabled registry, skipping");
                continue;
            }
            let source = Arc::clone(source);
            let keyword = keyword.to_string();
            tasks.spawn(async move { (index, source.search_offers(&keyword).await) });
        }

        // Join barrier: nothing is merged until every source has finished.
        let mut per_source: Vec<(usize, Vec<RawOffer>)> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(raw))) => {
                    tracing::info!(
                        source = self.sources[index].name(),
                        offers = raw.len(),
                        "source returned offers"
                    );
                    per_source.push((index, raw));
                }
                Ok((index, Err(err))) => {
                    // Isolation contract: a failed source contributes zero
                    // offers and never aborts the batch.
                    tracing::warn!(
                        source = self.sources[index].name(),
                        error = %err,
                        "source failed, continuing without it"
                    );
                    per_source.push((index, Vec::new()));
                }
                Err(join_err) => {
                    tracing::error!(error = %join_err, "source task panicked");
                }
            }
        }
        per_source.sort_by_key(|(index, _)| *index);

        let mut offers: Vec<NormalizedOffer> = Vec::new();
        for (index, raw) in per_source {
            let source_id = registry.get(self.sources[index].name()).copied();
            offers.extend(normalize_offers(raw, item_id, source_id, fetched_at));
        }

        self.store.bulk_insert_offers(&offers).await?;
        tracing::info!(item_id = item_id.0, count = offers.len(), "refresh persisted offers");
        Ok(offers.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::memory::InMemoryStore;
    use crate::ports::source::SourceError;
    use async_trait::async_trait;

    /// Source with a scripted outcome.
    struct ScriptedSource {
        name: &'static str,
        outcome: Result<Vec<RawOffer>, String>,
    }

    impl ScriptedSource {
        fn ok(name: &'static str, offers: Vec<RawOffer>) -> Arc<dyn OfferSource> {
            Arc::new(Self {
                name,
                outcome: Ok(offers),
            })
        }

        fn failing(name: &'static str) -> Arc<dyn OfferSource> {
            Arc::new(Self {
                name,
                outcome: Err("backend exploded".to_string()),
            })
        }
    }

    #[async_trait]
    impl OfferSource for ScriptedSource {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn search_offers(&self, _keyword: &str) -> Result<Vec<RawOffer>, SourceError> {
            match &self.outcome {
                Ok(offers) => Ok(offers.clone()),
                Err(message) => Err(SourceError::Malformed(message.clone())),
            }
        }
    }

    fn priced(price: i64) -> RawOffer {
        RawOffer {
            price: Some(price),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_merges_offers_from_all_sources() {
        let store = Arc::new(InMemoryStore::with_default_sources());
        let aggregator = Aggregator::with_sources(
            store.clone(),
            vec![
                ScriptedSource::ok("rakuten", vec![priced(1000), priced(1200)]),
                ScriptedSource::ok("yahoo", vec![priced(900)]),
            ],
        );

        let count = aggregator.refresh(ItemId(1), "camera").await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(store.offers().len(), 3);
    }

    #[tokio::test]
    async fn test_failing_source_is_isolated() {
        let store = Arc::new(InMemoryStore::with_default_sources());
        let aggregator = Aggregator::with_sources(
            store.clone(),
            vec![
                ScriptedSource::failing("rakuten"),
                ScriptedSource::ok("yahoo", vec![priced(900), priced(950)]),
            ],
        );

        let count = aggregator.refresh(ItemId(1), "camera").await.unwrap();
        assert_eq!(count, 2);
        let offers = store.offers();
        assert!(offers.iter().all(|o| o.source_id == Some(SourceId(2))));
    }

    #[tokio::test]
    async fn test_all_sources_failing_returns_zero() {
        let store = Arc::new(InMemoryStore::with_default_sources());
        let aggregator = Aggregator::with_sources(
            store.clone(),
            vec![
                ScriptedSource::failing("rakuten"),
                ScriptedSource::failing("yahoo"),
            ],
        );

        let count = aggregator.refresh(ItemId(1), "camera").await.unwrap();
        assert_eq!(count, 0);
        assert!(store.offers().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_source_is_skipped() {
        let store = Arc::new(
            InMemoryStore::new().with_sources(vec![("yahoo".to_string(), SourceId(2))]),
        );
        let aggregator = Aggregator::with_sources(
            store.clone(),
            vec![
                ScriptedSource::ok("rakuten", vec![priced(1000)]),
                ScriptedSource::ok("yahoo", vec![priced(900)]),
            ],
        );

        let count = aggregator.refresh(ItemId(1), "camera").await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(store.offers()[0].source_id, Some(SourceId(2)));
    }

    #[tokio::test]
    async fn test_offers_share_one_fetch_timestamp() {
        let store = Arc::new(InMemoryStore::with_default_sources());
        let aggregator = Aggregator::with_sources(
            store.clone(),
            vec![
                ScriptedSource::ok("rakuten", vec![priced(1000)]),
                ScriptedSource::ok("yahoo", vec![priced(900)]),
                ScriptedSource::ok("tavily", vec![priced(800)]),
            ],
        );

        aggregator.refresh(ItemId(42), "camera").await.unwrap();
        let offers = store.offers();
        assert_eq!(offers.len(), 3);
        let stamp = offers[0].fetched_at;
        assert!(offers.iter().all(|o| o.fetched_at == stamp));
        assert!(offers.iter().all(|o| o.item_id == ItemId(42)));
    }

    #[tokio::test]
    async fn test_totals_computed_during_normalization() {
        let store = Arc::new(InMemoryStore::with_default_sources());
        let raw = RawOffer {
            price: Some(1000),
            shipping: Some(300),
            ..Default::default()
        };
        let aggregator = Aggregator::with_sources(
            store.clone(),
            vec![ScriptedSource::ok("rakuten", vec![raw, RawOffer::default()])],
        );

        aggregator.refresh(ItemId(1), "camera").await.unwrap();
        let offers = store.offers();
        assert_eq!(offers[0].total, Some(1300));
        assert_eq!(offers[1].total, None);
    }

    #[tokio::test]
    async fn test_persistence_failure_propagates() {
        let store = Arc::new(InMemoryStore::with_default_sources().with_failing_inserts());
        let aggregator = Aggregator::with_sources(
            store,
            vec![ScriptedSource::ok("rakuten", vec![priced(1000)])],
        );

        let result = aggregator.refresh(ItemId(1), "camera").await;
        assert!(matches!(result, Err(RefreshError::Store(_))));
    }
}
