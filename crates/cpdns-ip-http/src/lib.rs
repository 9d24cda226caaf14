// # HTTP IP Source
//
// Public IP discovery through a plain-text IP-echo endpoint
// (e.g. https://api.ipify.org).
//
// ## Behavior
//
// - Exactly one GET per `current()` call, no retry and no caching
// - 5 second timeout
// - Non-2xx status, transport failure or an empty body are `Network` errors;
//   the engine treats them as fatal for the run
// - The body is trimmed and returned as text, without address validation

use async_trait::async_trait;
use cpdns_core::traits::IpSource;
use cpdns_core::{Error, Result};
use std::time::Duration;

/// Default HTTP timeout for the IP-echo request
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// IP source backed by an HTTP IP-echo endpoint
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch the IP from
    url: String,

    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: endpoint returning the caller's IP as plain text
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create with a custom request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<String> {
        tracing::debug!("Fetching public IP from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::network(format!("IP echo request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::network(format!(
                "IP echo endpoint returned HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read IP echo response: {}", e)))?;

        let ip = body.trim();
        if ip.is_empty() {
            return Err(Error::network("IP echo endpoint returned an empty body"));
        }

        tracing::info!("Public IP: {}", ip);
        Ok(ip.to_string())
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
