//! # Paging HTTP Client
//!
//! Authenticated JSON requests with throttle retry and `Link` header paging.
//!
//! A `429` is retried after the server's `Retry-After` delay, or after
//! `attempt + 1` seconds when the header is missing. Any other status at or
//! above `300` fails immediately with the body attached. Running out of
//! retries is an error, never an empty result, and so is a call that
//! outlives its deadline.

use std::collections::HashSet;
use std::time::Duration;

use portfind_common::config::Config;
use portfind_protocols::link;
use reqwest::header::{ACCEPT, HeaderMap, LINK, RETRY_AFTER};
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApiError;

/// Upper bound on a server-requested delay.
const MAX_RETRY_AFTER_SECS: f64 = 300.0;

/// One response body plus the continuation link, if any.
#[derive(Debug)]
struct Page {
    body: String,
    next: Option<String>,
}

pub struct PagingHttpClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    max_retries: u32,
    call_timeout: Duration,
}

impl PagingHttpClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("portfind/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries.max(1),
            call_timeout: config.call_timeout,
        })
    }

    /// Builds `{base}/{segments...}?{query}`. Segments are percent-encoded,
    /// so serials and port ids may contain `/`.
    pub fn url(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|_| ApiError::InvalidUrl(self.base_url.clone()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// Fetches every page of a list endpoint, in arrival order.
    ///
    /// The whole walk, retries included, must finish within the call
    /// timeout. A continuation link pointing at an already fetched page is
    /// an error.
    pub async fn fetch_all_pages(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<Vec<Value>, ApiError> {
        let url = self.url(segments, query)?;
        self.within_deadline(&url, self.collect_pages(url.clone())).await
    }

    pub async fn get_json(&self, segments: &[&str]) -> Result<Value, ApiError> {
        let url = self.url(segments, &[])?;
        let page = self
            .within_deadline(&url, self.execute(Method::GET, url.clone()))
            .await?;
        decode(&url, &page.body)
    }

    pub async fn post_json(&self, segments: &[&str]) -> Result<Value, ApiError> {
        let url = self.url(segments, &[])?;
        let page = self
            .within_deadline(&url, self.execute(Method::POST, url.clone()))
            .await?;
        decode(&url, &page.body)
    }

    async fn collect_pages(&self, first: Url) -> Result<Vec<Value>, ApiError> {
        let path = first.path().to_string();
        let mut url = first;
        let mut fetched: HashSet<Url> = HashSet::new();
        let mut records: Vec<Value> = Vec::new();

        loop {
            let page = self.execute(Method::GET, url.clone()).await?;
            let items: Vec<Value> = decode(&url, &page.body)?;
            records.extend(items);
            fetched.insert(url);

            let Some(next) = page.next else {
                break;
            };
            let next = Url::parse(&next).map_err(|_| ApiError::InvalidUrl(next.clone()))?;
            if fetched.contains(&next) {
                return Err(ApiError::PagingLoop(next.to_string()));
            }
            url = next;
        }

        debug!(
            "Fetched {} records in {} page(s) from {path}",
            records.len(),
            fetched.len()
        );
        Ok(records)
    }

    async fn within_deadline<T>(
        &self,
        url: &Url,
        call: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<T, ApiError> {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .map_err(|_| ApiError::Timeout {
                path: url.path().to_string(),
                after: self.call_timeout,
            })?
    }

    async fn execute(&self, method: Method, url: Url) -> Result<Page, ApiError> {
        for attempt in 0..self.max_retries {
            let response = self
                .client
                .request(method.clone(), url.clone())
                .bearer_auth(&self.api_key)
                .header(ACCEPT, "application/json")
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                let delay = retry_after(response.headers())
                    .unwrap_or_else(|| Duration::from_secs(u64::from(attempt) + 1));
                warn!(
                    "Throttled on {} (attempt {}/{}), retrying in {:.1}s",
                    url.path(),
                    attempt + 1,
                    self.max_retries,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            let next = response
                .headers()
                .get(LINK)
                .and_then(|value| value.to_str().ok())
                .and_then(link::parse_link_next);
            let body = response.text().await?;

            if status.as_u16() >= 300 {
                return Err(ApiError::Status {
                    status: status.as_u16(),
                    body: body.trim().to_string(),
                });
            }
            return Ok(Page { body, next });
        }

        Err(ApiError::Throttled {
            attempts: self.max_retries,
        })
    }
}

/// `Retry-After` in seconds, integer or fractional.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let raw = headers.get(RETRY_AFTER)?.to_str().ok()?;
    let seconds: f64 = raw.trim().parse().ok()?;
    (seconds.is_finite() && seconds >= 0.0)
        .then(|| Duration::from_secs_f64(seconds.min(MAX_RETRY_AFTER_SECS)))
}

fn decode<T: serde::de::DeserializeOwned>(url: &Url, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|source| ApiError::Decode {
        path: url.path().to_string(),
        source,
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
