use std::sync::Arc;
use tokio::task::JoinError;
use tracing::{error, info};

use super::sources::{ProxySource, SessionSource};
use crate::context::RequestContext;
use crate::error::CorrelationError;
use crate::types::{RoutingRecord, SessionRecord};

pub const SESSION_SOURCE: &str = "mysql";
pub const PROXY_SOURCE: &str = "tcpproxy";

#[derive(Debug, Default)]
pub struct Snapshot {
    pub sessions: Vec<SessionRecord>,
    pub routing: Vec<RoutingRecord>,
}

/// Fetches sessions and routing records concurrently.
#[derive(Clone)]
pub struct SnapshotFetcher {
    sessions: Arc<dyn SessionSource>,
    proxy: Arc<dyn ProxySource>,
}

fn settle<T>(
    joined: Result<anyhow::Result<T>, JoinError>,
    source_name: &'static str,
) -> Result<T, CorrelationError> {
    match joined {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(CorrelationError::SourceFetch { source_name, error }),
        Err(join_error) => Err(CorrelationError::SourceFetch {
            source_name,
            error: join_error.into(),
        }),
    }
}

impl SnapshotFetcher {
    pub fn new(sessions: Arc<dyn SessionSource>, proxy: Arc<dyn ProxySource>) -> Self {
        Self { sessions, proxy }
    }

    /// Returns once both sources delivered. The first failure is returned
    /// immediately and the other source is cancelled.
    #[tracing::instrument(skip_all)]
    pub async fn fetch(&self, ctx: &RequestContext) -> Result<Snapshot, CorrelationError> {
        let fetch_ctx = ctx.child();
        // whatever way we leave, the slower source is told to stop
        let _cancel_on_exit = fetch_ctx.cancel_on_drop();

        // Launch both sources on the child context
        let sessions_task = {
            let source = Arc::clone(&self.sessions);
            let ctx = fetch_ctx.clone();
            tokio::spawn(async move { source.fetch_sessions(&ctx).await })
        };
        let routing_task = {
            let source = Arc::clone(&self.proxy);
            let ctx = fetch_ctx.clone();
            tokio::spawn(async move { source.fetch_records(&ctx).await })
        };

        // Tag each failure with the source it came from
        let sessions = async { settle(sessions_task.await, SESSION_SOURCE) };
        let routing = async { settle(routing_task.await, PROXY_SOURCE) };

        // try_join! returns on the first error, the caller's context can still
        // cut the wait short
        let fetched = tokio::select! {
            fetched = async { tokio::try_join!(sessions, routing) } => fetched,
            _ = ctx.done() => Err(ctx.error()),
        };

        // sources that stopped because the caller gave up report as cancelled
        let fetched = match fetched {
            Err(_) if ctx.is_done() => Err(ctx.error()),
            fetched => fetched,
        };

        match fetched {
            Ok((sessions, routing)) => {
                info!(
                    "Fetched {} sessions and {} routing records",
                    sessions.len(),
                    routing.len()
                );
                Ok(Snapshot { sessions, routing })
            }
            Err(e) => {
                error!("Snapshot fetch failed: {}", e);
                Err(e)
            }
        }
    }
}
