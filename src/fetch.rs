//! Resilient page fetching.
//!
//! [`Fetcher::fetch`] GETs a URL with a browser-like user agent, retrying
//! network errors, HTTP 429 and 5xx with exponential backoff. Other 4xx
//! responses fail immediately. `file://` URLs are read from disk so adapters
//! can run against saved pages.
//!
//! Every successful fetch carries a SHA-256 hex digest of the raw body,
//! stored with the race metadata as an audit trail.

use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::error::{IngestError, Result};

/// A fetched page body and its content hash.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub body: String,
    pub page_hash: String,
}

impl FetchedPage {
    pub fn from_bytes(url: &str, bytes: &[u8]) -> Self {
        Self {
            url: url.to_string(),
            body: String::from_utf8_lossy(bytes).into_owned(),
            page_hash: page_hash(bytes),
        }
    }
}

/// SHA-256 of `bytes`, lowercase hex.
pub fn page_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Delay before retry number `attempt` (1-based): `base^attempt` seconds.
fn backoff_delay(base_secs: f64, attempt: u32) -> Duration {
    let secs = base_secs.powi(attempt as i32).min(60.0);
    Duration::from_secs_f64(secs)
}

pub struct Fetcher {
    client: reqwest::Client,
    max_retries: u32,
    backoff_base_secs: f64,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            backoff_base_secs: config.backoff_base_secs,
        })
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        if let Some(path) = url.strip_prefix("file://") {
            return tokio::fs::read(path)
                .await
                .map(|bytes| FetchedPage::from_bytes(url, &bytes))
                .map_err(|e| IngestError::FetchExhausted {
                    url: url.to_string(),
                    attempts: 1,
                    last_error: e.to_string(),
                });
        }

        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let bytes = response.bytes().await.map_err(|e| {
                            IngestError::FetchExhausted {
                                url: url.to_string(),
                                attempts: attempt,
                                last_error: e.to_string(),
                            }
                        })?;
                        debug!(url, attempt, bytes = bytes.len(), "fetched page");
                        return Ok(FetchedPage::from_bytes(url, &bytes));
                    }

                    last_error = format!("HTTP {}", status);

                    // Client error other than 429: no retry
                    if status.is_client_error() && status.as_u16() != 429 {
                        return Err(IngestError::FetchExhausted {
                            url: url.to_string(),
                            attempts: attempt,
                            last_error,
                        });
                    }
                }
                Err(e) => last_error = e.to_string(),
            }

            if attempt < self.max_retries {
                let delay = backoff_delay(self.backoff_base_secs, attempt);
                warn!(
                    "Failed to GET {} ({}); retrying in {:.1}s (attempt {}/{})",
                    url,
                    last_error,
                    delay.as_secs_f64(),
                    attempt,
                    self.max_retries
                );
                tokio::time::sleep(delay).await;
            }
        }

        Err(IngestError::FetchExhausted {
            url: url.to_string(),
            attempts: self.max_retries,
            last_error,
        })
    }
}
