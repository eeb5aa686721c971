//! Rate-limited retrying HTTP client shared by all source adapters.

pub mod client;
pub mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, RequestError, RetryPolicy};
pub use rate_limit::RateLimiter;
