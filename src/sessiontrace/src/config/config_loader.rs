use anyhow::{Context, Result};
use config::{Config as RConfig, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::constants::{
    AGENT_CONNECT_TIMEOUT_MS, AGENT_READ_TIMEOUT_MS, DEFAULT_AGENT_PORT, DEFAULT_DSN,
    DEFAULT_PROXY_MGMT_ADDRESS, DEFAULT_SERVER_PORT, ENV_PREFIX, PROXY_CONNECT_TIMEOUT_MS,
    PROXY_READ_TIMEOUT_MS, REQUEST_TIMEOUT_MS,
};

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Config {
    pub debug: bool,
    pub log_file: Option<String>,
    pub agent: AgentConfig,
    pub server: ServerConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AgentConfig {
    pub listen_address: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    pub listen_address: String,
    pub dsn: String,
    /// Port every agent listens on.
    pub agent_port: u32,
    pub proxy_mgmt_address: String,
    pub proxy_connect_timeout_ms: u64,
    pub proxy_read_timeout_ms: u64,
    pub agent_connect_timeout_ms: u64,
    pub agent_read_timeout_ms: u64,
    pub request_timeout_ms: u64,
    /// 0 means unbounded
    pub agent_max_concurrency: usize,
}

impl ServerConfig {
    pub fn proxy_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.proxy_connect_timeout_ms)
    }

    pub fn proxy_read_timeout(&self) -> Duration {
        Duration::from_millis(self.proxy_read_timeout_ms)
    }

    pub fn agent_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.agent_connect_timeout_ms)
    }

    pub fn agent_read_timeout(&self) -> Duration {
        Duration::from_millis(self.agent_read_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            listen_address: format!("0.0.0.0:{}", DEFAULT_AGENT_PORT),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: format!("0.0.0.0:{}", DEFAULT_SERVER_PORT),
            dsn: DEFAULT_DSN.to_string(),
            agent_port: u32::from(DEFAULT_AGENT_PORT),
            proxy_mgmt_address: DEFAULT_PROXY_MGMT_ADDRESS.to_string(),
            proxy_connect_timeout_ms: PROXY_CONNECT_TIMEOUT_MS,
            proxy_read_timeout_ms: PROXY_READ_TIMEOUT_MS,
            agent_connect_timeout_ms: AGENT_CONNECT_TIMEOUT_MS,
            agent_read_timeout_ms: AGENT_READ_TIMEOUT_MS,
            request_timeout_ms: REQUEST_TIMEOUT_MS,
            agent_max_concurrency: 0,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, then the TOML file at `path` (if given), then
    /// `SESSIONTRACE__SECTION__KEY` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let defaults = Config::default();
        let mut builder = RConfig::builder();

        builder = builder
            .set_default("debug", false)?
            .set_default("agent.listen_address", defaults.agent.listen_address)?
            .set_default("server.listen_address", defaults.server.listen_address)?
            .set_default("server.dsn", defaults.server.dsn)?
            .set_default("server.agent_port", u64::from(defaults.server.agent_port))?
            .set_default("server.proxy_mgmt_address", defaults.server.proxy_mgmt_address)?
            .set_default("server.proxy_connect_timeout_ms", PROXY_CONNECT_TIMEOUT_MS)?
            .set_default("server.proxy_read_timeout_ms", PROXY_READ_TIMEOUT_MS)?
            .set_default("server.agent_connect_timeout_ms", AGENT_CONNECT_TIMEOUT_MS)?
            .set_default("server.agent_read_timeout_ms", AGENT_READ_TIMEOUT_MS)?
            .set_default("server.request_timeout_ms", REQUEST_TIMEOUT_MS)?
            .set_default("server.agent_max_concurrency", 0u64)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("failed to load config")?
            .try_deserialize()
            .context("failed to parse config")
    }
}
