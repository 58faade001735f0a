//! HTTP implementation of the sync gateway.
//!
//! One resource per concern: progress is read and written under
//! `/progress/{contentId}`, analytics events are appended under
//! `/interactions/{contentId}`. Retry policy does not live here; the
//! reconciliation engine recovers failed writes through lock expiry.

use std::env;
use std::time::Duration;

use log::debug;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use player_core::model::{ContentId, Percentage, ProgressRecord};

use crate::contract::{GatewayError, InteractionEvent, SyncGateway};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct HttpGatewayConfig {
    pub base_url: String,
    pub api_key: String,
}

impl HttpGatewayConfig {
    /// Read configuration from `PLAYER_SYNC_BASE_URL` / `PLAYER_SYNC_API_KEY`.
    ///
    /// Returns `None` when no API key is configured, in which case callers
    /// typically fall back to an in-memory gateway.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("PLAYER_SYNC_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("PLAYER_SYNC_BASE_URL")
            .unwrap_or_else(|_| "https://progress.example.com/v1".into());
        Some(Self { base_url, api_key })
    }
}

/// Sync gateway backed by the remote progress API.
#[derive(Clone)]
pub struct HttpSyncGateway {
    client: Client,
    config: HttpGatewayConfig,
}

impl HttpSyncGateway {
    #[must_use]
    pub fn new(config: HttpGatewayConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn progress_url(&self, content_id: ContentId) -> String {
        format!(
            "{}/progress/{content_id}",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn interactions_url(&self, content_id: ContentId) -> String {
        format!(
            "{}/interactions/{content_id}",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    GatewayError::Unavailable(err.to_string())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WriteProgressBody {
    completion_percentage: Percentage,
}

#[async_trait::async_trait]
impl SyncGateway for HttpSyncGateway {
    async fn fetch_progress(
        &self,
        content_id: ContentId,
    ) -> Result<Option<ProgressRecord>, GatewayError> {
        let response = self
            .client
            .get(self.progress_url(content_id))
            .bearer_auth(&self.config.api_key)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        debug!("progress fetch for content {content_id}: {status}");

        // Absent is the normal first-visit answer, not an error.
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(GatewayError::Status(status.as_u16()));
        }

        let record: ProgressRecord = response
            .json()
            .await
            .map_err(|e| GatewayError::Protocol(e.to_string()))?;
        Ok(Some(record))
    }

    async fn write_progress(
        &self,
        content_id: ContentId,
        percentage: Percentage,
    ) -> Result<(), GatewayError> {
        let response = self
            .client
            .put(self.progress_url(content_id))
            .bearer_auth(&self.config.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&WriteProgressBody {
                completion_percentage: percentage,
            })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        debug!("progress write {percentage} for content {content_id}: {status}");

        if !status.is_success() {
            return Err(GatewayError::Status(status.as_u16()));
        }
        // No response payload is consumed beyond success/failure.
        Ok(())
    }

    async fn record_interaction(
        &self,
        content_id: ContentId,
        event: InteractionEvent,
    ) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.interactions_url(content_id))
            .bearer_auth(&self.config.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&event)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status.as_u16()));
        }
        Ok(())
    }
}
