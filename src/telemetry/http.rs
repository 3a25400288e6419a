//! HTTP Telemetry Source
//!
//! Polls the local telemetry bridge with a single `GET` per call.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{TelemetryPayload, TelemetrySource, DEFAULT_TELEMETRY_URL};
use crate::error::{MappingError, Result};

pub struct HttpTelemetrySource {
    client: Client,
    url: String,
}

impl HttpTelemetrySource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    /// Source whose requests give up after `timeout`.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build telemetry HTTP client")
            .map_err(MappingError::Fetch)?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Default for HttpTelemetrySource {
    fn default() -> Self {
        Self::new(DEFAULT_TELEMETRY_URL)
    }
}

#[async_trait]
impl TelemetrySource for HttpTelemetrySource {
    async fn fetch(&self) -> Result<TelemetryPayload> {
        debug!("Fetching telemetry from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("request to {} failed", self.url))
            .map_err(MappingError::Fetch)?
            .error_for_status()
            .context("telemetry endpoint returned an error status")
            .map_err(MappingError::Fetch)?;

        let body = response
            .bytes()
            .await
            .context("failed to read telemetry body")
            .map_err(MappingError::Fetch)?;

        serde_json::from_slice(&body)
            .context("telemetry body is not a buildings document")
            .map_err(MappingError::Decode)
    }
}
