//! JSON transport to the marketplace API.
//!
//! Wraps `reqwest::Client` with retry on transient failures (exponential
//! backoff plus jitter). A non-2xx answer carries the response text, or
//! `"<status> error from <METHOD> <path>"` when the body is empty.

use crate::config::Config;
use crate::metrics::METRICS;
use rand::Rng;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A failed API call, before it is attributed to a collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
    pub status: Option<u16>,
    pub message: String,
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {status}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Transient HTTP errors worth retrying.
fn is_retryable(status: StatusCode) -> bool {
    matches!(status.as_u16(), 408 | 429 | 500 | 502 | 503 | 504)
}

/// `base * 2^attempt` plus up to 50% jitter, capped at `cap`.
pub fn backoff_delay(base: Duration, attempt: u32, cap: Duration) -> Duration {
    let base_ms = base.as_millis() as u64;
    let exp = base_ms.saturating_mul(2u64.saturating_pow(attempt));
    let jitter = rand::thread_rng().gen_range(0..=exp / 2);
    Duration::from_millis(exp.saturating_add(jitter)).min(cap)
}

/// Marketplace API client.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    root: String,
    max_retries: u32,
    retry_base: Duration,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, crate::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| crate::Error::Config(format!("HTTP client build failed: {e}")))?;

        Ok(Self {
            http,
            root: config.api_root_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            retry_base: Duration::from_millis(config.retry_base_ms),
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// `GET {root}{path}?{query}`. An empty body decodes to `None`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, ApiFailure> {
        self.request(Method::GET, path, query, None).await
    }

    /// `POST {root}{path}` with a JSON body.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, ApiFailure> {
        let body = serde_json::to_value(body).map_err(|e| ApiFailure {
            status: None,
            message: format!("failed to encode body for POST {path}: {e}"),
        })?;
        self.request(Method::POST, path, &[], Some(&body)).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Option<T>, ApiFailure> {
        let url = format!("{}{}", self.root, path);
        let start = Instant::now();

        let mut last_err = None;
        // One initial attempt plus up to `max_retries` retries.
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                METRICS.http_retries.fetch_add(1, Ordering::Relaxed);
                tokio::time::sleep(backoff_delay(self.retry_base, attempt, Duration::MAX)).await;
            }

            let mut request = self.http.request(method.clone(), &url).query(query);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    warn!(attempt, %method, path, error = %e, "Request failed (retrying)");
                    last_err = Some(ApiFailure {
                        status: None,
                        message: format!("{method} {path} failed: {e}"),
                    });
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                let message = if text.is_empty() {
                    format!("{} error from {method} {path}", status.as_u16())
                } else {
                    text
                };
                let failure = ApiFailure {
                    status: Some(status.as_u16()),
                    message,
                };
                if is_retryable(status) && attempt < self.max_retries {
                    warn!(attempt, %method, path, status = %status, "Transient error (retrying)");
                    last_err = Some(failure);
                    continue;
                }
                METRICS.record_http_duration(start);
                return Err(failure);
            }

            let text = response.text().await.map_err(|e| ApiFailure {
                status: Some(status.as_u16()),
                message: format!("failed to read {method} {path} response: {e}"),
            })?;
            METRICS.record_http_duration(start);
            debug!(%method, path, bytes = text.len(), "Response received");

            if text.trim().is_empty() {
                return Ok(None);
            }
            return serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| ApiFailure {
                    status: Some(status.as_u16()),
                    message: format!("invalid JSON from {method} {path}: {e}"),
                });
        }

        METRICS.record_http_duration(start);
        Err(last_err.unwrap_or_else(|| ApiFailure {
            status: None,
            message: format!("{method} {path} failed after retries"),
        }))
    }
}
