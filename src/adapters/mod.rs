//! Adapters Layer - Backend implementations
//!
//! One module per search backend, each implementing the `OfferSource` port,
//! plus the shared rate-limited HTTP client:
//! - Rakuten: Ichiba item search
//! - Yahoo: Shopping item search
//! - Amazon: PA-API with SigV4-signed requests
//! - Tavily: web search fallback with heuristic price extraction

pub mod amazon;
pub mod http;
pub mod rakuten;
pub mod tavily;
pub mod yahoo;

pub use amazon::AmazonSource;
pub use http::{HttpClient, HttpClientConfig, RequestError, RetryPolicy};
pub use rakuten::RakutenSource;
pub use tavily::TavilySource;
pub use yahoo::YahooSource;
