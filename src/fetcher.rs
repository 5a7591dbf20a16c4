use std::time::{Duration, Instant};

use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info};

use crate::settings::Settings;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("{url} did not answer within {secs}s")]
    Timeout { url: String, secs: u64 },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: StatusCode },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Single-shot GET of the vendor download page.
pub struct Fetcher {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(settings: &Settings) -> Result<Self, FetchError> {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            url: settings.url.clone(),
            timeout,
        })
    }

    /// Body text of a 2xx response, after redirects.
    pub async fn fetch(&self) -> Result<String, FetchError> {
        info!("Fetching {}", self.url);
        let start = Instant::now();

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status,
            });
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        debug!(
            bytes = body.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: self.url.clone(),
                secs: self.timeout.as_secs(),
            }
        } else {
            FetchError::Transport {
                url: self.url.clone(),
                source: err,
            }
        }
    }
}
