//! HTTP fetching with exponential backoff retry logic.
//!
//! # Architecture
//!
//! - [`Fetch`]: core trait, "GET this URL and give me the body"
//! - [`HttpFetcher`]: `reqwest` implementation with a per-request timeout
//! - [`RetryFetch`]: decorator that retries transient failures of any [`Fetch`]
//!
//! The pipeline only ever sees a `Fetch`, so tests drive it with in-memory
//! fakes and never touch the network.
//!
//! # Retry Strategy
//!
//! Only transient failures are retried: timeouts, connection errors, HTTP 429
//! and 5xx. A 404 or a 403 bot wall will not get better by asking again, so
//! those fail immediately and the source contributes zero results.

use rand::{Rng, rng};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};
use url::Url;

/// Browser-like UA; several listing sites serve an empty shell to unknown agents.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("HTTP {status} from {url}")]
    Status { status: StatusCode, url: String },
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl FetchError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout(_) => true,
            FetchError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            FetchError::Request(e) => e.is_timeout() || e.is_connect() || e.is_request(),
        }
    }
}

/// Fetch the body of a URL as text.
pub trait Fetch {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// Plain `reqwest` fetcher. One client is shared by every request of a run.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(url.to_string())
                } else {
                    FetchError::Request(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            bytes = body.len(),
            "Fetched page"
        );
        Ok(body)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`Fetch`] implementation.
///
/// The delay between retries follows:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> RetryFetch<T>
where
    T: Fetch,
{
    /// Wrap `inner`, retrying transient failures up to `max_retries` times.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let http = HttpFetcher::new(Duration::from_secs(30))?;
    /// let fetcher = RetryFetch::new(http, 2, Duration::from_millis(500));
    /// ```
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(8),
        }
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> Fetch for RetryFetch<T>
where
    T: Fetch,
{
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempt += 1;
                    let total_dt = total_t0.elapsed();

                    if !e.is_transient() {
                        return Err(e);
                    }
                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "fetch exhausted retries"
                        );
                        return Err(e);
                    }

                    let mut delay = self
                        .base_delay
                        .saturating_mul(1u32 << (attempt - 1).min(16));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + Duration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Fails with the given statuses in order, then succeeds.
    struct Flaky {
        failures: Vec<StatusCode>,
        calls: Cell<usize>,
    }

    impl Fetch for Flaky {
        async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
            let n = self.calls.get();
            self.calls.set(n + 1);
            match self.failures.get(n) {
                Some(status) => Err(FetchError::Status {
                    status: *status,
                    url: url.to_string(),
                }),
                None => Ok("ok".to_string()),
            }
        }
    }

    fn url() -> Url {
        Url::parse("https://example.com/events").unwrap()
    }

    #[test]
    fn test_transient_classification() {
        let status = |s: StatusCode| FetchError::Status {
            status: s,
            url: "u".to_string(),
        };
        assert!(status(StatusCode::SERVICE_UNAVAILABLE).is_transient());
        assert!(status(StatusCode::TOO_MANY_REQUESTS).is_transient());
        assert!(!status(StatusCode::NOT_FOUND).is_transient());
        assert!(!status(StatusCode::FORBIDDEN).is_transient());
        assert!(FetchError::Timeout("u".to_string()).is_transient());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_then_succeeds() {
        let inner = Flaky {
            failures: vec![StatusCode::SERVICE_UNAVAILABLE, StatusCode::BAD_GATEWAY],
            calls: Cell::new(0),
        };
        let fetcher = RetryFetch::new(inner, 2, Duration::from_millis(10));
        let body = fetcher.fetch(&url()).await.unwrap();
        assert_eq!(body, "ok");
        assert_eq!(fetcher.inner.calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let inner = Flaky {
            failures: vec![StatusCode::SERVICE_UNAVAILABLE; 5],
            calls: Cell::new(0),
        };
        let fetcher = RetryFetch::new(inner, 2, Duration::from_millis(10));
        assert!(fetcher.fetch(&url()).await.is_err());
        assert_eq!(fetcher.inner.calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_does_not_retry_not_found() {
        let inner = Flaky {
            failures: vec![StatusCode::NOT_FOUND],
            calls: Cell::new(0),
        };
        let fetcher = RetryFetch::new(inner, 3, Duration::from_millis(10));
        let err = fetcher.fetch(&url()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status, .. } if status == StatusCode::NOT_FOUND));
        assert_eq!(fetcher.inner.calls.get(), 1);
    }
}
