//! HTTP client for page fetching with retry and error classification
//!
//! One client is one session: a user agent is picked from the configured pool
//! when the client is built and reused for every request. Retries happen
//! inside [`HttpClient::fetch_text`]; callers only see the final outcome.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::errors::{ConfigurationError, FetchError};
use crate::domain::repositories::PageFetcher;
use crate::infrastructure::config::ScraperConfig;

/// Longest server-requested wait that is honoured as-is
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Retry budget and backoff schedule
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Statuses worth another attempt
    pub retry_statuses: Vec<u16>,
    /// Delay before the second attempt; doubles each time after
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            retry_statuses: config.retry_statuses.clone(),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
        }
    }

    /// Backoff after the given failed attempt (1-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.backoff_base.saturating_mul(2_u32.pow(exponent))
    }

    fn should_retry(&self, error: &FetchError) -> bool {
        match error {
            FetchError::Status { status, .. } => self.retry_statuses.contains(status),
            other => other.is_retryable(),
        }
    }
}

/// HTTP client with a session user agent and internal retries
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    policy: RetryPolicy,
    user_agent: String,
}

impl HttpClient {
    /// Build a session from scraper configuration
    pub fn with_config(config: &ScraperConfig) -> Result<Self, ConfigurationError> {
        let pool: Vec<&String> = config.user_agents.iter().filter(|ua| !ua.trim().is_empty()).collect();
        if pool.is_empty() {
            return Err(ConfigurationError::EmptyUserAgentPool);
        }
        let user_agent = pool[fastrand::usize(..pool.len())].clone();

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(&user_agent)
            .cookie_store(true)
            .gzip(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| ConfigurationError::HttpClient(e.to_string()))?;

        debug!("HttpClient session user agent: {}", user_agent);

        Ok(Self {
            client,
            policy: RetryPolicy::from_config(config),
            user_agent,
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Fetch a page body, retrying transient failures within the budget
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        if Url::parse(url).is_err() {
            return Err(FetchError::InvalidUrl { url: url.to_string() });
        }

        let max_attempts = self.policy.max_attempts;
        let mut attempt = 1;
        loop {
            info!("🌐 HTTP GET (attempt {}/{}) : {}", attempt, max_attempts, url);

            let (error, retry_after) = match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => {
                    return read_body(response, url).await;
                }
                Ok(response) => {
                    let retry_after = response
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(parse_retry_after);
                    let error = FetchError::Status {
                        status: response.status().as_u16(),
                        url: url.to_string(),
                    };
                    (error, retry_after)
                }
                Err(e) => (classify_transport_error(&e, url), None),
            };

            if attempt >= max_attempts || !self.policy.should_retry(&error) {
                warn!("❌ Giving up on {} after {} attempt(s): {}", url, attempt, error);
                return Err(error);
            }

            let delay = retry_after
                .map_or_else(|| self.policy.backoff_for(attempt), |d| d.min(MAX_RETRY_AFTER));
            warn!("⚠️ Attempt {} failed for {}: {} (retrying in {:?})", attempt, url, error, delay);
            sleep(delay).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        Self::fetch_text(self, url).await
    }
}

async fn read_body(response: Response, url: &str) -> Result<String, FetchError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| classify_transport_error(&e, url))?;

    if text.trim().is_empty() && status != StatusCode::NO_CONTENT {
        return Err(FetchError::EmptyBody { url: url.to_string() });
    }

    debug!("Fetched {} ({} chars)", url, text.len());
    Ok(text)
}

fn classify_transport_error(error: &reqwest::Error, url: &str) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout { url: url.to_string() }
    } else if error.is_builder() {
        FetchError::InvalidUrl { url: url.to_string() }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

/// `Retry-After` as either delta-seconds or an HTTP date
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let date = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let wait = date.with_timezone(&chrono::Utc) - chrono::Utc::now();
    Some(wait.to_std().unwrap_or(Duration::ZERO))
}
