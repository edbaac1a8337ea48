#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use sessiontrace::agent::host_inspector::MockHostInspector;
use sessiontrace::agent::{AgentServer, ConnectionEntry, ProcessEntry};
use sessiontrace::config::AgentConfig;
use sessiontrace::context::RequestContext;
use sessiontrace::server::SessionSource;
use sessiontrace::types::{Address, SessionRecord};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub struct TestAgent {
    pub addr: SocketAddr,
    shutdown: CancellationToken,
}

impl TestAgent {
    pub async fn start(inspector: MockHostInspector) -> Self {
        let config = AgentConfig {
            listen_address: "127.0.0.1:0".to_string(),
        };
        let server = AgentServer::bind(&config, Arc::new(inspector)).await.unwrap();
        let addr = server.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        tokio::spawn(server.run(shutdown.clone()));
        Self { addr, shutdown }
    }

    pub fn url(&self, query: &str) -> String {
        format!("http://{}/conns{}", self.addr, query)
    }
}

impl Drop for TestAgent {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

pub fn connection(port: u32, pid: u32) -> ConnectionEntry {
    ConnectionEntry {
        local: Address::new("127.0.0.1", port),
        status: "ESTABLISHED".to_string(),
        pid: Some(pid),
    }
}

pub fn process(pid: u32, name: &str, cmdline: &[&str]) -> ProcessEntry {
    ProcessEntry {
        pid,
        name: Some(name.to_string()),
        cmdline: Some(cmdline.iter().map(|a| a.to_string()).collect()),
    }
}

/// An inspector that serves the given tables on every call.
pub fn inspector(connections: Vec<ConnectionEntry>, processes: Vec<ProcessEntry>) -> MockHostInspector {
    let mut inspector = MockHostInspector::new();
    inspector
        .expect_connections()
        .returning(move || Ok(connections.clone()));
    inspector
        .expect_processes()
        .returning(move || Ok(processes.clone()));
    inspector
        .expect_hostname()
        .return_const(Some("web-1".to_string()));
    inspector
}

pub fn session(id: u64, peer: Address) -> SessionRecord {
    SessionRecord {
        id,
        user: "shop".to_string(),
        db: Some("orders".to_string()),
        command: "Query".to_string(),
        time: "120".to_string(),
        state: Some("executing".to_string()),
        info: Some("SELECT * FROM orders".to_string()),
        peer,
    }
}

pub struct StaticSessions(pub Vec<SessionRecord>);

#[async_trait]
impl SessionSource for StaticSessions {
    async fn fetch_sessions(&self, _ctx: &RequestContext) -> Result<Vec<SessionRecord>> {
        Ok(self.0.clone())
    }
}

/// A proxy management port that answers every `conns` request with `reply`.
pub async fn fake_proxy(reply: String) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let reply = reply.clone();
            tokio::spawn(async move {
                let mut command = [0u8; 6];
                if socket.read_exact(&mut command).await.is_ok() {
                    let _ = socket.write_all(reply.as_bytes()).await;
                }
            });
        }
    });
    addr
}
