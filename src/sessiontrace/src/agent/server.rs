use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::host_inspector::HostInspector;
use super::port_resolver::PortResolver;
use super::routes::ROUTES;
use super::state::AgentState;
use crate::config::AgentConfig;
use crate::http_server::{get_router, HttpServer};

/// The per-host HTTP agent answering `/conns` lookups.
pub struct AgentServer {
    inner: HttpServer,
}

impl AgentServer {
    pub async fn bind(config: &AgentConfig, inspector: Arc<dyn HostInspector>) -> anyhow::Result<Self> {
        let state = AgentState::new(PortResolver::new(inspector));
        let router = get_router(&ROUTES, state);
        let inner = HttpServer::bind("agent", &config.listen_address, router).await?;
        Ok(Self { inner })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Serves until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        self.inner.run(shutdown).await
    }
}
