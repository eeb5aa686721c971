//! Tavily Web Search Fallback Adapter
//!
//! General-purpose search used when no marketplace covers the keyword. The
//! backend returns free-text snippets, so a price has to be extracted
//! heuristically from currency-marked numbers in the text. The relevance
//! score becomes the offer confidence and the snippet is kept.

use std::sync::Arc;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::adapters::http::{HttpClient, HttpClientConfig};
use crate::domain::offer::RawOffer;
use crate::ports::secrets::{get_secret_safe, SecretStore};
use crate::ports::source::{OfferSource, SourceError};

const DEFAULT_ENDPOINT: &str = "https://api.tavily.com/search";
const RESULT_LIMIT: u32 = 5;

/// Plausible yen range for an extracted price. Anything outside is treated
/// as an unrelated number (a year, a count, a phone fragment).
const MIN_PLAUSIBLE_PRICE: i64 = 100;
const MAX_PLAUSIBLE_PRICE: i64 = 10_000_000;

/// Matches `¥1,234` / `￥1,234` and `1234円`, two digits minimum.
static PRICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:¥|￥)\s*([0-9][0-9,]+)|([0-9][0-9,]+)\s*円")
        .expect("price pattern compiles")
});

pub struct TavilySource {
    secrets: Arc<dyn SecretStore>,
    endpoint: String,
    http: HttpClientConfig,
}

impl TavilySource {
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
impl OfferSource for TavilySource {
    fn name(&self) -> &'static str {
        "tavily"
    }

    async fn search_offers(&self, keyword: &str) -> Result<Vec<RawOffer>, SourceError> {
        let Some(api_key) = get_secret_safe(self.secrets.as_ref(), "tavily_api_key") else {
            return Ok(Vec::new());
        };
        if keyword.is_empty() {
            return Ok(Vec::new());
        }

        let client = HttpClient::with_config(self.http.clone())?;
        let response = client
            .post_json(
                &self.endpoint,
                &SearchRequest {
                    api_key: &api_key,
                    query: keyword,
                    search_depth: "basic",
                    max_results: RESULT_LIMIT,
                    include_raw_content: true,
                },
            )
            .await?;

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|err| SourceError::Malformed(err.to_string()))?;

        Ok(data.results.into_iter().map(normalize_result).collect())
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    max_results: u32,
    include_raw_content: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResult {
    title: Option<String>,
    url: Option<String>,
    content: Option<String>,
    raw_content: Option<String>,
    score: Option<f64>,
}

fn normalize_result(result: SearchResult) -> RawOffer {
    let price = extract_price(&[
        result.title.as_deref(),
        result.content.as_deref(),
        result.raw_content.as_deref(),
    ]);
    let raw_text = result.content.or(result.raw_content);
    RawOffer {
        title: result.title,
        price,
        shipping: None,
        stock_status: None,
        url: result.url,
        confidence: result.score,
        raw_text,
    }
}

/// Best-guess price from free text: collect every currency-marked number in
/// the plausible range and take the minimum. Zero candidates yield `None`;
/// multiple candidates are not an error.
fn extract_price(texts: &[Option<&str>]) -> Option<i64> {
    let mut candidates: Vec<i64> = Vec::new();
    for text in texts.iter().flatten() {
        for captures in PRICE_PATTERN.captures_iter(text) {
            let Some(digits) = captures.get(1).or_else(|| captures.get(2)) else {
                continue;
            };
            let Ok(value) = digits.as_str().replace(',', "").parse::<i64>() else {
                continue;
            };
            if (MIN_PLAUSIBLE_PRICE..=MAX_PLAUSIBLE_PRICE).contains(&value) {
                candidates.push(value);
            }
        }
    }
    candidates.into_iter().min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::secrets::MockSecretStore;

    #[tokio::test]
    async fn test_missing_api_key_soft_disables() {
        let mut store = MockSecretStore::new();
        store.expect_get_secret().returning(|_| Ok(None));
        let source = TavilySource::new(Arc::new(store), HttpClientConfig::default());

        let offers = source.search_offers("camera").await.unwrap();
        assert!(offers.is_empty());
    }

    #[test]
    fn test_extracts_minimum_of_multiple_candidates() {
        let price = extract_price(&[Some("special price ¥1,980 today, was 2500円")]);
        assert_eq!(price, Some(1980));
    }

    #[test]
    fn test_no_currency_marked_number_yields_none() {
        assert_eq!(extract_price(&[Some("released in 2019, 4th edition")]), None);
        assert_eq!(extract_price(&[None, None]), None);
    }

    #[test]
    fn test_fullwidth_yen_sign_and_comma_grouping() {
        assert_eq!(extract_price(&[Some("￥12,800 で販売中")]), Some(12800));
    }

    #[test]
    fn test_out_of_range_candidates_dropped() {
        // Below 100 and above 10,000,000 are implausible as prices.
        assert_eq!(extract_price(&[Some("¥99 shipping, item ¥350")]), Some(350));
        assert_eq!(extract_price(&[Some("serial 99999999円")]), None);
    }

    #[test]
    fn test_candidates_collected_across_texts() {
        let price = extract_price(&[Some("title ¥5,000"), Some("body says 3000円")]);
        assert_eq!(price, Some(3000));
    }

    #[test]
    fn test_normalize_keeps_score_and_snippet() {
        let offer = normalize_result(SearchResult {
            title: Some("camera for sale ¥8,800".to_string()),
            url: Some("https://example.com/listing".to_string()),
            content: Some("great camera, only ¥8,800".to_string()),
            raw_content: Some("longer page text".to_string()),
            score: Some(0.92),
        });

        assert_eq!(offer.price, Some(8800));
        assert_eq!(offer.confidence, Some(0.92));
        // Snippet prefers content over raw content.
        assert_eq!(offer.raw_text.as_deref(), Some("great camera, only ¥8,800"));
    }

    #[test]
    fn test_normalize_falls_back_to_raw_content() {
        let offer = normalize_result(SearchResult {
            raw_content: Some("full page, 2480円".to_string()),
            ..Default::default()
        });

        assert_eq!(offer.price, Some(2480));
        assert_eq!(offer.raw_text.as_deref(), Some("full page, 2480円"));
    }

    #[test]
    fn test_response_shape_parses() {
        let body = r#"{
            "results": [
                {"title": "listing", "url": "https://example.com",
                 "content": "text ¥1,500", "raw_content": null, "score": 0.7}
            ]
        }"#;

        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].score, Some(0.7));
    }
}
