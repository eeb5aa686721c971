//! HTTP client with per-instance rate limiting and transient-error retry.
//!
//! One logical call spaces itself behind the rate gate, retries the statuses
//! providers use for throttling and transient faults, and honors a numeric
//! `Retry-After` header. A non-retryable error status surfaces immediately.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Response, StatusCode};
use serde::Serialize;
use thiserror::Error;

use super::rate_limit::RateLimiter;

const RETRYABLE_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Exponential backoff parameters: `delay = min(base * 2^attempt, max)`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(4),
        }
    }
}

/// Client tuning, usually taken from the `[http]` config section.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    /// Minimum spacing between call starts on one client instance.
    pub min_interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            min_interval: Duration::from_secs(1),
            retry: RetryPolicy::default(),
        }
    }
}

/// Rate-limited retrying client. Adapters create one per search call and
/// drop it when the call returns, so the gate never couples separate
/// refresh operations.
#[derive(Debug)]
pub struct HttpClient {
    http: reqwest::Client,
    retry: RetryPolicy,
    limiter: RateLimiter,
}

impl HttpClient {
    pub fn new() -> Result<Self, RequestError> {
        Self::with_config(HttpClientConfig::default())
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self, RequestError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            retry: config.retry,
            limiter: RateLimiter::new(config.min_interval),
        })
    }

    /// GET with query parameters.
    pub async fn get<Q: Serialize + ?Sized>(
        &self,
        url: &str,
        query: &Q,
    ) -> Result<Response, RequestError> {
        self.execute(|| self.http.get(url).query(query)).await
    }

    /// POST with a JSON body.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<Response, RequestError> {
        self.execute(|| self.http.post(url).json(body)).await
    }

    /// POST a pre-serialized body with explicit headers. Used by the signed
    /// adapter, where the bytes on the wire must match the signed payload.
    pub async fn post_raw(
        &self,
        url: &str,
        body: String,
        headers: HeaderMap,
    ) -> Result<Response, RequestError> {
        self.execute(|| {
            self.http
                .post(url)
                .headers(headers.clone())
                .body(body.clone())
        })
        .await
    }

    async fn execute<F>(&self, build_request: F) -> Result<Response, RequestError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            self.limiter.wait().await;
            match build_request().send().await {
                Ok(response) => {
                    let status = response.status();
                    if RETRYABLE_STATUSES.contains(&status) {
                        let retry_after = parse_retry_after(response.headers());
                        let body = response.text().await.unwrap_or_default();
                        tracing::debug!(%status, attempt, "retryable status from backend");
                        if attempt >= self.retry.max_retries {
                            return Err(RequestError::Status { status, body });
                        }
                        self.sleep_before_retry(attempt, retry_after).await;
                    } else if status.is_client_error() || status.is_server_error() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(RequestError::Status { status, body });
                    } else {
                        return Ok(response);
                    }
                }
                Err(err) => {
                    tracing::debug!(error = %err, attempt, "transport error");
                    if attempt >= self.retry.max_retries {
                        return Err(RequestError::Transport(err));
                    }
                    self.sleep_before_retry(attempt, None).await;
                }
            }
            attempt += 1;
        }
    }

    /// Only called with retry budget remaining.
    async fn sleep_before_retry(&self, attempt: u32, retry_after: Option<Duration>) {
        let backoff = self
            .retry
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        let mut delay = backoff.min(self.retry.max_delay);
        if let Some(requested) = retry_after {
            delay = delay.max(requested);
        }
        tokio::time::sleep(delay).await;
    }
}

/// Numeric `Retry-After` values only; HTTP-date forms are ignored.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_config() -> HttpClientConfig {
        HttpClientConfig {
            timeout: Duration::from_secs(5),
            min_interval: Duration::from_millis(1),
            retry: RetryPolicy {
                max_retries: 2,
                base_delay: Duration::from_millis(5),
                max_delay: Duration::from_millis(20),
            },
        }
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::with_config(fast_config()).unwrap();
        let response = client
            .get(&format!("{}/search", server.uri()), &[("q", "x")])
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_three_consecutive_503s_exhaust_the_budget() {
        let server = MockServer::start().await;
        // 1 initial attempt + 2 retries; the fourth response is never asked for.
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let client = HttpClient::with_config(fast_config()).unwrap();
        let result = client
            .get(&format!("{}/search", server.uri()), &[("q", "x")])
            .await;

        match result {
            Err(RequestError::Status { status, .. }) => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE)
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_recovers_after_transient_503() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("late ok"))
            .mount(&server)
            .await;

        let client = HttpClient::with_config(fast_config()).unwrap();
        let response = client
            .get(&format!("{}/search", server.uri()), &[("q", "x")])
            .await
            .unwrap();
        assert_eq!(response.text().await.unwrap(), "late ok");
    }

    #[tokio::test]
    async fn test_transport_failure_exhausts_into_transport_error() {
        // Nothing listens on this port; every attempt is refused.
        let client = HttpClient::with_config(fast_config()).unwrap();
        let result = client.get("http://127.0.0.1:1/search", &[("q", "x")]).await;

        match result {
            Err(RequestError::Transport(err)) => assert!(err.is_connect() || err.is_request()),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_retryable_status_fails_on_first_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::with_config(fast_config()).unwrap();
        let result = client
            .get(&format!("{}/search", server.uri()), &[("q", "x")])
            .await;

        match result {
            Err(RequestError::Status { status, body }) => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(body, "gone");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_retry_after_header_respected_when_larger() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(429).insert_header("Retry-After", "1"),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = HttpClient::with_config(fast_config()).unwrap();
        let started = std::time::Instant::now();
        let response = client
            .get(&format!("{}/search", server.uri()), &[("q", "x")])
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        // Backoff would be 5ms; Retry-After raised it to a full second.
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[test]
    fn test_parse_retry_after_numeric_only() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, "7".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(7)));

        headers.insert(RETRY_AFTER, "Wed, 21 Oct 2026 07:28:00 GMT".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), None);

        assert_eq!(parse_retry_after(&HeaderMap::new()), None);
    }

    #[test]
    fn test_default_policy_matches_contract() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_secs(4));
    }
}
