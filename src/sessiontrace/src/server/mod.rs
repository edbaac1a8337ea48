pub mod agent_client;
pub mod aggregator;
pub mod client;
pub mod fanout;
mod handlers;
pub mod joiner;
pub mod request;
pub mod response;
mod routes;
pub mod snapshot;
pub mod sources;
mod state;

pub use agent_client::{AgentClient, HttpAgentClient};
pub use aggregator::AggregatorServer;
pub use client::ServerClient;
pub use fanout::AgentFanoutExecutor;
pub use handlers::procs::PROCS_ENDPOINT;
pub use joiner::CorrelationJoiner;
pub use request::{CorrelationRequest, Correlator};
pub use response::{Process, ProcessesResponse};
pub use snapshot::{Snapshot, SnapshotFetcher};
pub use sources::{MysqlSessionSource, ProxySource, SessionSource, TcpProxySource};
