//! Amazon PA-API Search Adapter
//!
//! SearchItems over a SigV4-signed POST. The locale selects host and
//! signing region. Title, listing price, and detail URL are extracted;
//! shipping, stock, and confidence are not available from this backend.

pub mod signing;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::adapters::http::{HttpClient, HttpClientConfig};
use crate::domain::offer::RawOffer;
use crate::ports::secrets::{get_secret_safe, SecretStore};
use crate::ports::source::{OfferSource, SourceError};

use signing::{sign, SigningParams};

const SERVICE: &str = "ProductAdvertisingAPI";
const URI_PATH: &str = "/paapi5/searchitems";
const AMZ_TARGET: &str = "com.amazon.paapi5.v1.ProductAdvertisingAPIv1.SearchItems";
const MARKETPLACE: &str = "www.amazon.co.jp";
const RESULT_LIMIT: u32 = 10;

pub struct AmazonSource {
    secrets: Arc<dyn SecretStore>,
    host: String,
    region: String,
    endpoint: String,
    http: HttpClientConfig,
}

impl AmazonSource {
    pub fn new(secrets: Arc<dyn SecretStore>, locale: &str, http: HttpClientConfig) -> Self {
        let (host, region) = host_region(locale);
        let endpoint = format!("https://{host}{URI_PATH}");
        Self {
            secrets,
            host: host.to_string(),
            region: region.to_string(),
            endpoint,
            http,
        }
    }

    /// Point the adapter at a different endpoint, for tests. The host still
    /// goes into the signed headers as configured.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// PA-API host and signing region for a marketplace locale. Unknown locales
/// fall back to JP.
fn host_region(locale: &str) -> (&'static str, &'static str) {
    match locale.to_uppercase().as_str() {
        "US" => ("webservices.amazon.com", "us-east-1"),
        _ => ("webservices.amazon.co.jp", "us-west-2"),
    }
}

#[async_trait]
impl OfferSource for AmazonSource {
    fn name(&self) -> &'static str {
        "amazon"
    }

    async fn search_offers(&self, keyword: &str) -> Result<Vec<RawOffer>, SourceError> {
        let access_key = get_secret_safe(self.secrets.as_ref(), "amazon_access_key");
        let secret_key = get_secret_safe(self.secrets.as_ref(), "amazon_secret_key");
        let partner_tag = get_secret_safe(self.secrets.as_ref(), "amazon_partner_tag");
        let (Some(access_key), Some(secret_key), Some(partner_tag)) =
            (access_key, secret_key, partner_tag)
        else {
            return Ok(Vec::new());
        };
        if keyword.is_empty() {
            return Ok(Vec::new());
        }

        let payload = SearchItemsRequest {
            keywords: keyword,
            partner_tag: &partner_tag,
            partner_type: "Associates",
            marketplace: MARKETPLACE,
            resources: &["ItemInfo.Title", "Offers.Listings.Price"],
            search_index: "All",
            item_count: RESULT_LIMIT,
        };
        // Serialized exactly once; the same bytes are hashed and sent.
        let body = serde_json::to_string(&payload)
            .map_err(|err| SourceError::Malformed(err.to_string()))?;

        let signed = sign(&SigningParams {
            access_key: &access_key,
            secret_key: &secret_key,
            host: &self.host,
            region: &self.region,
            service: SERVICE,
            uri_path: URI_PATH,
            amz_target: AMZ_TARGET,
            payload: &body,
            signed_at: Utc::now(),
        });
        let headers = request_headers(&self.host, &signed.amz_date, &signed.authorization)?;

        let client = HttpClient::with_config(self.http.clone())?;
        let response = client.post_raw(&self.endpoint, body, headers).await?;

        let data: SearchItemsResponse = response
            .json()
            .await
            .map_err(|err| SourceError::Malformed(err.to_string()))?;

        Ok(data
            .search_result
            .map(|result| result.items.into_iter().map(normalize_item).collect())
            .unwrap_or_default())
    }
}

fn request_headers(
    host: &str,
    amz_date: &str,
    authorization: &str,
) -> Result<HeaderMap, SourceError> {
    let pairs = [
        ("content-encoding", "amz-1.0"),
        ("content-type", "application/json; charset=utf-8"),
        ("host", host),
        ("x-amz-date", amz_date),
        ("x-amz-target", AMZ_TARGET),
        ("authorization", authorization),
    ];

    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let name = HeaderName::from_static(name);
        let value = HeaderValue::from_str(value)
            .map_err(|err| SourceError::Malformed(format!("invalid header value: {err}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[derive(Debug, Serialize)]
struct SearchItemsRequest<'a> {
    #[serde(rename = "Keywords")]
    keywords: &'a str,
    #[serde(rename = "PartnerTag")]
    partner_tag: &'a str,
    #[serde(rename = "PartnerType")]
    partner_type: &'a str,
    #[serde(rename = "Marketplace")]
    marketplace: &'a str,
    #[serde(rename = "Resources")]
    resources: &'a [&'a str],
    #[serde(rename = "SearchIndex")]
    search_index: &'a str,
    #[serde(rename = "ItemCount")]
    item_count: u32,
}

#[derive(Debug, Deserialize)]
struct SearchItemsResponse {
    #[serde(rename = "SearchResult")]
    search_result: Option<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(rename = "Items", default)]
    items: Vec<Item>,
}

#[derive(Debug, Default, Deserialize)]
struct Item {
    #[serde(rename = "ItemInfo")]
    item_info: Option<ItemInfo>,
    #[serde(rename = "DetailPageURL")]
    detail_page_url: Option<String>,
    #[serde(rename = "Offers")]
    offers: Option<Offers>,
}

#[derive(Debug, Deserialize)]
struct ItemInfo {
    #[serde(rename = "Title")]
    title: Option<Title>,
}

#[derive(Debug, Deserialize)]
struct Title {
    #[serde(rename = "DisplayValue")]
    display_value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Offers {
    #[serde(rename = "Listings", default)]
    listings: Vec<Listing>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(rename = "Price")]
    price: Option<Price>,
}

#[derive(Debug, Deserialize)]
struct Price {
    #[serde(rename = "Amount")]
    amount: Option<f64>,
}

fn normalize_item(item: Item) -> RawOffer {
    let title = item
        .item_info
        .and_then(|info| info.title)
        .and_then(|title| title.display_value);
    let price = item
        .offers
        .and_then(|offers| offers.listings.into_iter().next())
        .and_then(|listing| listing.price)
        .and_then(|price| price.amount)
        .map(|amount| amount.round() as i64);
    RawOffer {
        title,
        price,
        shipping: None,
        stock_status: None,
        url: item.detail_page_url,
        confidence: None,
        raw_text: None,
    }
}
