use anyhow::Result;
use async_trait::async_trait;

use crate::context::RequestContext;
use crate::types::{RoutingRecord, SessionRecord};

mod mysql;
mod tcpproxy;

pub use mysql::MysqlSessionSource;
pub use tcpproxy::TcpProxySource;

/// Produces a snapshot of the database's live sessions.
///
/// Implementations must stop promptly once `ctx` is done.
#[async_trait]
pub trait SessionSource: Send + Sync {
    async fn fetch_sessions(&self, ctx: &RequestContext) -> Result<Vec<SessionRecord>>;
}

/// Produces a snapshot of the connections the proxy is currently relaying.
///
/// Implementations must stop promptly once `ctx` is done.
#[async_trait]
pub trait ProxySource: Send + Sync {
    async fn fetch_records(&self, ctx: &RequestContext) -> Result<Vec<RoutingRecord>>;
}
