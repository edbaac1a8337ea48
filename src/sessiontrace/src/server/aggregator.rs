use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;

use super::request::Correlator;
use super::routes::ROUTES;
use super::state::ServerState;
use crate::config::ServerConfig;
use crate::http_server::{get_router, HttpServer};

/// HTTP front of the correlation engine.
pub struct AggregatorServer {
    inner: HttpServer,
}

impl AggregatorServer {
    pub async fn bind(config: &ServerConfig, correlator: Correlator) -> anyhow::Result<Self> {
        let state = ServerState::new(correlator, config.request_timeout());
        let router = get_router(&ROUTES, state);
        let inner = HttpServer::bind("server", &config.listen_address, router).await?;
        Ok(Self { inner })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.inner.local_addr()
    }

    pub async fn run(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        self.inner.run(shutdown).await
    }
}
