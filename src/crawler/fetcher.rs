//! Paper API fetcher
//!
//! This module handles every request to the paper API, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests for a single paper record
//! - The shared cooldown between consecutive calls
//! - Retry logic for transient failures
//! - Error classification

use crate::config::{Config, UserAgentConfig};
use crate::crawler::Cooldown;
use crate::paper::PaperRecord;
use crate::RippleError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors returned by a single paper fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error fetching {id}: {message}")]
    Network { id: String, message: String },

    #[error("request timeout fetching {id}")]
    Timeout { id: String },

    #[error("HTTP {status} fetching {id}")]
    Status { id: String, status: u16 },

    #[error("undecodable record for {id}: {message}")]
    Decode { id: String, message: String },
}

impl FetchError {
    /// The paper id whose fetch failed
    pub fn paper_id(&self) -> &str {
        match self {
            Self::Network { id, .. }
            | Self::Timeout { id }
            | Self::Status { id, .. }
            | Self::Decode { id, .. } => id,
        }
    }

    /// Short classification used in logs and the run ledger
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
            Self::Status { .. } => "status",
            Self::Decode { .. } => "decode",
        }
    }

    /// Returns true for faults worth another attempt
    ///
    /// | Condition | Retry |
    /// |-----------|-------|
    /// | Timeout | yes |
    /// | Connection / transport error | yes |
    /// | HTTP 429, HTTP 5xx | yes |
    /// | Other HTTP 4xx | no |
    /// | Undecodable body | no |
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network { .. } => true,
            Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Decode { .. } => false,
        }
    }
}

/// Source of paper records
///
/// The crawl engine only talks to this trait, so tests can drive it with an
/// in-memory graph.
#[async_trait]
pub trait PaperFetcher: Send + Sync {
    /// Fetches the full record of paper `id`
    async fn fetch_by_id(&self, id: &str) -> Result<PaperRecord, FetchError>;
}

/// Bounded exponential backoff for retryable faults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,

    /// Delay before the first retry; doubled for each further retry
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Single attempt, no retries
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before retry number `retry` (0-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(retry))
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Timeout applied to each whole request
///
/// # Example
///
/// ```no_run
/// use cite_ripple::config::UserAgentConfig;
/// use cite_ripple::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "CiteRipple".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(5)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches paper records from the paper API over HTTP
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: Url,
    cooldown: Cooldown,
    retry: RetryPolicy,
}

impl HttpFetcher {
    /// Creates a fetcher for the API rooted at `base_url`
    pub fn new(
        client: Client,
        base_url: &str,
        cooldown: Cooldown,
        retry: RetryPolicy,
    ) -> Result<Self, RippleError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase.into());
        }

        Ok(Self {
            client,
            base_url,
            cooldown,
            retry,
        })
    }

    /// Creates a fetcher from the `[fetcher]` and `[user-agent]` sections
    pub fn from_config(config: &Config) -> Result<Self, RippleError> {
        let client = build_http_client(&config.user_agent, config.fetcher.timeout())?;
        Self::new(
            client,
            &config.fetcher.api_base_url,
            Cooldown::new(config.fetcher.cooldown()),
            RetryPolicy::new(config.fetcher.max_retries, config.fetcher.retry_backoff()),
        )
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The cooldown shared by every call made through this fetcher
    pub fn cooldown(&self) -> &Cooldown {
        &self.cooldown
    }

    /// Returns `{base}/paper/{id}?include_unknown_references=true`
    pub fn paper_url(&self, id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("paper").push(id);
        }
        url.query_pairs_mut()
            .append_pair("include_unknown_references", "true");
        url
    }

    async fn fetch_once(&self, id: &str) -> Result<PaperRecord, FetchError> {
        let url = self.paper_url(id);
        self.cooldown
            .run(fetch_json::<PaperRecord>(&self.client, url, id))
            .await
    }
}

#[async_trait]
impl PaperFetcher for HttpFetcher {
    async fn fetch_by_id(&self, id: &str) -> Result<PaperRecord, FetchError> {
        let mut retry = 0;
        loop {
            match self.fetch_once(id).await {
                Ok(record) => {
                    if record.id != id {
                        tracing::warn!("Paper {} is served under id {}", id, record.id);
                    }
                    return Ok(record);
                }
                Err(e) if e.is_retryable() && retry < self.retry.max_retries => {
                    let delay = self.retry.delay_for(retry);
                    retry += 1;
                    tracing::warn!(
                        "Fetch of {} failed ({}), retry {}/{} in {:?}",
                        id,
                        e,
                        retry,
                        self.retry.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Sends one GET request and decodes the JSON body
///
/// Non-2xx statuses, transport failures and undecodable bodies are all
/// reported as `FetchError`s for paper `id`.
pub(crate) async fn fetch_json<T>(client: &Client, url: Url, id: &str) -> Result<T, FetchError>
where
    T: serde::de::DeserializeOwned,
{
    tracing::debug!("GET {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| classify_transport_error(id, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            id: id.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| classify_transport_error(id, e))?;

    serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
        id: id.to_string(),
        message: e.to_string(),
    })
}

fn classify_transport_error(id: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout { id: id.to_string() }
    } else if error.is_decode() {
        FetchError::Decode {
            id: id.to_string(),
            message: error.to_string(),
        }
    } else {
        FetchError::Network {
            id: id.to_string(),
            message: error.to_string(),
        }
    }
}
