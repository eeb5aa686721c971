//! Rakuten Ichiba Search Adapter
//!
//! Keyword search sorted ascending by item price, capped at ten results.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::adapters::http::{HttpClient, HttpClientConfig};
use crate::domain::offer::RawOffer;
use crate::ports::secrets::{get_secret_safe, SecretStore};
use crate::ports::source::{OfferSource, SourceError};

const DEFAULT_ENDPOINT: &str =
    "https://app.rakuten.co.jp/services/api/IchibaItem/Search/20170706";
const RESULT_LIMIT: &str = "10";

pub struct RakutenSource {
    secrets: Arc<dyn SecretStore>,
    endpoint: String,
    http: HttpClientConfig,
}

impl RakutenSource {
    pub fn new(secrets: Arc<dyn SecretStore>, http: HttpClientConfig) -> Self {
        Self {
            secrets,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            http,
        }
    }

    /// Point the adapter at a different endpoint, for tests.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl OfferSource for RakutenSource {
    fn name(&self) -> &'static str {
        "rakuten"
    }

    async fn search_offers(&self, keyword: &str) -> Result<Vec<RawOffer>, SourceError> {
        let Some(app_id) = get_secret_safe(self.secrets.as_ref(), "rakuten_app_id") else {
            return Ok(Vec::new());
        };
        if keyword.is_empty() {
            return Ok(Vec::new());
        }

        // Client scoped to this call; dropped on every return path.
        let client = HttpClient::with_config(self.http.clone())?;
        let response = client
            .get(
                &self.endpoint,
                &[
                    ("applicationId", app_id.as_str()),
                    ("keyword", keyword),
                    ("hits", RESULT_LIMIT),
                    ("sort", "+itemPrice"),
                ],
            )
            .await?;

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|err| SourceError::Malformed(err.to_string()))?;

        Ok(data
            .items
            .into_iter()
            .map(|entry| normalize_item(entry.item))
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "Items", default)]
    items: Vec<ItemEntry>,
}

#[derive(Debug, Deserialize)]
struct ItemEntry {
    #[serde(rename = "Item", default)]
    item: Item,
}

#[derive(Debug, Default, Deserialize)]
struct Item {
    #[serde(rename = "itemName")]
    item_name: Option<String>,
    #[serde(rename = "itemPrice")]
    item_price: Option<i64>,
    #[serde(rename = "postageFlag")]
    postage_flag: Option<i64>,
    #[serde(rename = "availability")]
    availability: Option<i64>,
    #[serde(rename = "itemUrl")]
    item_url: Option<String>,
}

fn normalize_item(item: Item) -> RawOffer {
    // postageFlag 1 means postage included; any other value leaves shipping unknown.
    let shipping = match item.postage_flag {
        Some(1) => Some(0),
        _ => None,
    };
    let stock_status = match item.availability {
        Some(flag) if flag != 0 => Some("available".to_string()),
        _ => None,
    };
    RawOffer {
        title: item.item_name,
        price: item.item_price,
        shipping,
        stock_status,
        url: item.item_url,
        confidence: None,
        raw_text: None,
    }
}
