use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::agent_client::AgentClient;
use crate::context::RequestContext;
use crate::error::CorrelationError;
use crate::types::{Address, AgentProcessInfo, JoinedRecord};

/// Looks up every joined record's origin on its host's agent.
#[derive(Clone)]
pub struct AgentFanoutExecutor {
    client: Arc<dyn AgentClient>,
    attempt_timeout: Duration,
    limit: Option<Arc<Semaphore>>,
}

impl AgentFanoutExecutor {
    /// `max_concurrency == 0` leaves the fan-out unbounded.
    pub fn new(client: Arc<dyn AgentClient>, attempt_timeout: Duration, max_concurrency: usize) -> Self {
        let limit = (max_concurrency > 0).then(|| Arc::new(Semaphore::new(max_concurrency)));
        Self {
            client,
            attempt_timeout,
            limit,
        }
    }

    /// Returns after every attempt finished. A failed attempt leaves only
    /// its own record without agent info.
    #[tracing::instrument(skip_all, fields(records = records.len()))]
    pub async fn resolve_all(&self, ctx: &RequestContext, records: &mut [JoinedRecord]) {
        info!("Resolving {} records against agents", records.len());
        let attempts = records
            .iter_mut()
            .map(|record| self.resolve_one(ctx, record));
        join_all(attempts).await;
    }

    async fn resolve_one(&self, ctx: &RequestContext, record: &mut JoinedRecord) {
        let origin = &record.routing.origin;
        match self.attempt(ctx, origin).await {
            Ok(Some(info)) => record.agent = Some(info),
            Ok(None) => debug!("No process found behind {}", origin),
            Err(e) => warn!("Session {}: {}", record.session.id, e),
        }
    }

    async fn attempt(
        &self,
        ctx: &RequestContext,
        origin: &Address,
    ) -> Result<Option<AgentProcessInfo>, CorrelationError> {
        // Wait for a slot when the fan-out is bounded
        let _permit = match &self.limit {
            Some(limit) => tokio::select! {
                permit = limit.acquire() => Some(permit.map_err(|e| attempt_error(origin, e.into()))?),
                _ = ctx.done() => return Err(ctx.error()),
            },
            None => None,
        };

        // One deadline covers connect and read together
        let lookup = tokio::time::timeout(
            self.attempt_timeout,
            self.client.lookup(&origin.host, origin.port),
        );
        tokio::select! {
            result = lookup => match result {
                Ok(Ok(found)) => Ok(found),
                Ok(Err(error)) => Err(attempt_error(origin, error)),
                Err(_) => Err(attempt_error(
                    origin,
                    anyhow::anyhow!("timed out after {:?}", self.attempt_timeout),
                )),
            },
            _ = ctx.done() => Err(ctx.error()),
        }
    }
}

fn attempt_error(origin: &Address, error: anyhow::Error) -> CorrelationError {
    CorrelationError::Attempt {
        agent: origin.host.clone(),
        error,
    }
}
