use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

use crate::agent::CONNS_ENDPOINT;
use crate::types::{Address, AgentProcessInfo};

/// Asks the agent on `host` which process owns local `port`.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// `Ok(None)` means the agent answered but found no process.
    async fn lookup(&self, host: &str, port: u32) -> Result<Option<AgentProcessInfo>>;
}

pub struct HttpAgentClient {
    client: reqwest::Client,
    agent_port: u32,
}

impl HttpAgentClient {
    pub fn new(agent_port: u32, connect_timeout: Duration, read_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .build()
            .context("failed to build agent HTTP client")?;

        Ok(Self { client, agent_port })
    }

    fn get_url(&self, host: &str) -> String {
        format!("http://{}{}", Address::new(host, self.agent_port), CONNS_ENDPOINT)
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn lookup(&self, host: &str, port: u32) -> Result<Option<AgentProcessInfo>> {
        let url = self.get_url(host);
        debug!("Requesting {} for port {}", url, port);

        let response = self
            .client
            .get(&url)
            .query(&[("port", port)])
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let info = response
                    .json::<AgentProcessInfo>()
                    .await
                    .with_context(|| format!("malformed response from {}", url))?;
                Ok(Some(info))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                anyhow::bail!("{} returned {}: {}", url, status, body.trim())
            }
        }
    }
}
