//! Delivery of the response document to the orchestrator

use anyhow::{Context, Result};
use sesid_core::LifecycleResponse;
use std::time::Duration;
use tracing::{debug, info};

/// Default HTTP timeout for the response upload (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Uploads lifecycle responses to the event's callback URL
pub struct ResponseNotifier {
    client: reqwest::Client,
}

impl ResponseNotifier {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// PUT `response` as JSON to `url`; a non-2xx status is an error
    pub async fn send(&self, url: &str, response: &LifecycleResponse) -> Result<()> {
        // The callback URL is presigned; only its host goes to the log
        debug!("Uploading {:?} response to {}", response.status, redact(url));

        let reply = self
            .client
            .put(url)
            .json(response)
            .send()
            .await
            .context("Response upload failed")?;

        let status = reply.status();
        if !status.is_success() {
            let body = reply
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            anyhow::bail!("Response upload rejected: {} - {}", status, body);
        }

        info!("Response delivered ({})", status);
        Ok(())
    }
}

/// Strip the query string (which carries the signature) from a URL
fn redact(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}
