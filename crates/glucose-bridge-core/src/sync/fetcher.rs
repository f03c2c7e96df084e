//! HTTP retrieval of a pending batch.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::config::BridgeConfig;
use crate::error::FetchError;
use crate::token::{ImportToken, TOKEN_QUERY_PARAM};

/// Path of the batch endpoint below the base URL.
pub const BATCH_PATH: &str = "batch.php";

/// Source of raw batch bodies.
#[async_trait]
pub trait BatchFetcher: Send + Sync {
    /// Fetch the raw body for `token`. One attempt, no retry.
    async fn fetch(&self, token: &ImportToken) -> Result<Vec<u8>, FetchError>;
}

/// Fetches batches from the remote service with a single GET.
pub struct RemoteBatchFetcher {
    base_url: String,
    http_client: Client,
}

impl RemoteBatchFetcher {
    /// Build the fetcher and its HTTP client.
    ///
    /// # Errors
    /// Fails only when the TLS backend cannot be initialized.
    pub fn new(config: &BridgeConfig) -> Result<Self, FetchError> {
        let http_client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self {
            base_url: config.base_url.clone(),
            http_client,
        })
    }

    /// `{base_url}/batch.php?token={token}`, token percent-encoded.
    pub fn batch_url(&self, token: &ImportToken) -> Result<Url, FetchError> {
        let mut url = Url::parse(&format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            BATCH_PATH
        ))?;
        url.query_pairs_mut()
            .append_pair(TOKEN_QUERY_PARAM, token.as_str());
        Ok(url)
    }
}

#[async_trait]
impl BatchFetcher for RemoteBatchFetcher {
    async fn fetch(&self, token: &ImportToken) -> Result<Vec<u8>, FetchError> {
        let url = self.batch_url(token)?;
        tracing::debug!(host = url.host_str().unwrap_or(""), "Requesting batch");

        let resp = self.http_client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::RemoteRejected {
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await?;
        if body.is_empty() {
            return Err(FetchError::EmptyResponse);
        }

        tracing::debug!(bytes = body.len(), "Batch received");
        Ok(body.to_vec())
    }
}
