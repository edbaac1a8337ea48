use anyhow::Context;
use axum::routing::MethodRouter;
use axum::Router;
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Builds a router from a static route table and hands it its state.
pub(crate) fn get_router<S>(routes: &[(&'static str, MethodRouter<S>)], state: S) -> Router
where
    S: Clone + Send + Sync + 'static,
{
    let mut router = Router::new();
    for (path, method_router) in routes {
        router = router.route(path, method_router.clone());
    }
    router.with_state(state)
}

/// A bound listener plus the router it will serve. Shared by the agent and
/// the aggregator, `role` only shows up in logs and errors.
pub(crate) struct HttpServer {
    role: &'static str,
    listener: TcpListener,
    router: Router,
}

impl HttpServer {
    pub(crate) async fn bind(
        role: &'static str,
        listen_address: &str,
        router: Router,
    ) -> anyhow::Result<Self> {
        let addr: SocketAddr = listen_address
            .parse()
            .with_context(|| format!("invalid {} listen address {}", role, listen_address))?;

        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                anyhow::bail!(
                    "Failed to start {}: port {} is already in use",
                    role,
                    addr.port()
                );
            }
            Err(e) => anyhow::bail!("Failed to bind to address {}: {}", addr, e),
        };

        Ok(Self {
            role,
            listener,
            router,
        })
    }

    pub(crate) fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until `shutdown` is cancelled.
    pub(crate) async fn run(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        info!("{} listening on {}", self.role, self.local_addr()?);
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .with_context(|| format!("{} server failed", self.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    #[tokio::test]
    async fn test_bind_port_in_use() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let err = HttpServer::bind("agent", &addr.to_string(), Router::new())
            .await
            .err()
            .unwrap();

        assert_eq!(
            err.to_string(),
            format!("Failed to start agent: port {} is already in use", addr.port())
        );
    }

    #[tokio::test]
    async fn test_bind_rejects_bad_address() {
        let err = HttpServer::bind("server", "not-an-address", Router::new())
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("invalid server listen address"));
    }

    #[tokio::test]
    async fn test_serves_route_table_until_shutdown() {
        async fn ping(axum::extract::State(reply): axum::extract::State<&'static str>) -> &'static str {
            reply
        }
        let routes = vec![("/ping", get(ping))];
        let server = HttpServer::bind("agent", "127.0.0.1:0", get_router(&routes, "pong"))
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(server.run(shutdown.clone()));

        let body = reqwest::get(format!("http://{}/ping", addr))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "pong");

        shutdown.cancel();
        handle.await.unwrap().unwrap();
    }
}
