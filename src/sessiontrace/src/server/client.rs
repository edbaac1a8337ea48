use anyhow::{Context, Result};
use std::time::Duration;

use super::handlers::procs::PROCS_ENDPOINT;
use super::response::ProcessesResponse;

/// Talks to a running aggregator.
pub struct ServerClient {
    base_uri: String,
    client: reqwest::Client,
}

impl ServerClient {
    pub fn new(base_uri: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_uri: base_uri.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn get_url(&self, path: &str) -> String {
        format!("{}{}", self.base_uri, path)
    }

    pub async fn send_procs_request(&self) -> Result<ProcessesResponse> {
        let response = self
            .client
            .get(self.get_url(PROCS_ENDPOINT))
            .send()
            .await
            .context("failed to reach server")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("server returned {}: {}", status, body.trim());
        }
        response.json().await.context("malformed server response")
    }
}
