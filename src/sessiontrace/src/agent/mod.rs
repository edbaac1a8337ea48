mod handlers;
pub mod host_inspector;
pub mod port_resolver;
mod routes;
pub mod server;
mod state;

pub use handlers::conns::CONNS_ENDPOINT;
pub use host_inspector::{ConnectionEntry, HostInspector, ProcessEntry, SystemHostInspector};
pub use port_resolver::PortResolver;
pub use server::AgentServer;
