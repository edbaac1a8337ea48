use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::agent_client::{AgentClient, HttpAgentClient};
use super::fanout::AgentFanoutExecutor;
use super::joiner::CorrelationJoiner;
use super::response::{assemble, ProcessesResponse};
use super::snapshot::SnapshotFetcher;
use super::sources::{MysqlSessionSource, ProxySource, SessionSource, TcpProxySource};
use crate::address::AddressResolver;
use crate::config::ServerConfig;
use crate::context::RequestContext;
use crate::error::CorrelationError;
use crate::types::JoinedRecord;

/// Shared, read-only wiring used to start correlation requests.
#[derive(Clone)]
pub struct Correlator {
    fetcher: SnapshotFetcher,
    fanout: AgentFanoutExecutor,
}

impl Correlator {
    pub fn new(
        sessions: Arc<dyn SessionSource>,
        proxy: Arc<dyn ProxySource>,
        agents: Arc<dyn AgentClient>,
        config: &ServerConfig,
    ) -> Self {
        let attempt_timeout = config.agent_connect_timeout() + config.agent_read_timeout();
        Self {
            fetcher: SnapshotFetcher::new(sessions, proxy),
            fanout: AgentFanoutExecutor::new(agents, attempt_timeout, config.agent_max_concurrency),
        }
    }

    /// Wires MySQL, the TCP proxy and the HTTP agents from `config`.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let sessions = MysqlSessionSource::new(&config.dsn, config.request_timeout())?;
        let proxy = TcpProxySource::new(
            config.proxy_mgmt_address.clone(),
            config.proxy_connect_timeout(),
            config.proxy_read_timeout(),
        );
        let agents = HttpAgentClient::new(
            config.agent_port,
            config.agent_connect_timeout(),
            config.agent_read_timeout(),
        )?;
        Ok(Self::new(
            Arc::new(sessions),
            Arc::new(proxy),
            Arc::new(agents),
            config,
        ))
    }

    pub fn new_request(&self) -> CorrelationRequest<'_> {
        CorrelationRequest::new(&self.fetcher, &self.fanout)
    }

    pub async fn correlate(&self, ctx: &RequestContext) -> Result<ProcessesResponse, CorrelationError> {
        self.new_request().run(ctx).await
    }
}

/// One inbound request's work: fetch, join, resolve, assemble.
pub struct CorrelationRequest<'a> {
    fetcher: &'a SnapshotFetcher,
    fanout: &'a AgentFanoutExecutor,
    joiner: CorrelationJoiner,
    records: Vec<JoinedRecord>,
}

impl<'a> CorrelationRequest<'a> {
    pub fn new(fetcher: &'a SnapshotFetcher, fanout: &'a AgentFanoutExecutor) -> Self {
        Self {
            fetcher,
            fanout,
            joiner: CorrelationJoiner::new(AddressResolver::new()),
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[JoinedRecord] {
        &self.records
    }

    /// Fetches both snapshots and joins them.
    pub async fn setup(&mut self, ctx: &RequestContext) -> Result<(), CorrelationError> {
        let snapshot = self.fetcher.fetch(ctx).await?;
        self.records = self
            .joiner
            .join(snapshot.sessions, &snapshot.routing)
            .await;
        Ok(())
    }

    pub async fn resolve_agents(&mut self, ctx: &RequestContext) {
        self.fanout.resolve_all(ctx, &mut self.records).await;
    }

    pub fn response(&self) -> ProcessesResponse {
        info!("Returning response with {} processes", self.records.len());
        assemble(&self.records)
    }

    #[tracing::instrument(skip_all)]
    pub async fn run(mut self, ctx: &RequestContext) -> Result<ProcessesResponse, CorrelationError> {
        self.setup(ctx).await?;
        self.resolve_agents(ctx).await;
        Ok(self.response())
    }
}
