//! Yahoo Shopping Search Adapter
//!
//! Keyword search sorted ascending by price; the boolean in-stock flag is
//! mapped to a stock-status string.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::adapters::http::{HttpClient, HttpClientConfig};
use crate::domain::offer::RawOffer;
use crate::ports::secrets::{get_secret_safe, SecretStore};
use crate::ports::source::{OfferSource, SourceError};

const DEFAULT_ENDPOINT: &str =
    "https://shopping.yahooapis.jp/ShoppingWebService/V3/itemSearch";
const RESULT_LIMIT: &str = "10";

pub struct YahooSource {
    secrets: Arc<dyn SecretStore>,
    endpoint: String,
    http: HttpClientConfig,
}

impl YahooSource {
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
impl OfferSource for YahooSource {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn search_offers(&self, keyword: &str) -> Result<Vec<RawOffer>, SourceError> {
        let Some(app_id) = get_secret_safe(self.secrets.as_ref(), "yahoo_client_id") else {
            return Ok(Vec::new());
        };
        if keyword.is_empty() {
            return Ok(Vec::new());
        }

        let client = HttpClient::with_config(self.http.clone())?;
        let response = client
            .get(
                &self.endpoint,
                &[
                    ("appid", app_id.as_str()),
                    ("query", keyword),
                    ("results", RESULT_LIMIT),
                    ("sort", "+price"),
                ],
            )
            .await?;

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|err| SourceError::Malformed(err.to_string()))?;

        Ok(data.hits.into_iter().map(normalize_hit).collect())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Default, Deserialize)]
struct Hit {
    name: Option<String>,
    price: Option<i64>,
    url: Option<String>,
    #[serde(rename = "inStock")]
    in_stock: Option<bool>,
    shipping: Option<Shipping>,
}

#[derive(Debug, Deserialize)]
struct Shipping {
    price: Option<i64>,
}

fn normalize_hit(hit: Hit) -> RawOffer {
    let stock_status = hit.in_stock.map(|in_stock| {
        if in_stock {
            "in_stock".to_string()
        } else {
            "out_of_stock".to_string()
        }
    });
    RawOffer {
        title: hit.name,
        price: hit.price,
        shipping: hit.shipping.and_then(|s| s.price),
        stock_status,
        url: hit.url,
        confidence: None,
        raw_text: None,
    }
}
