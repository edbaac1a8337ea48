use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::num::ParseIntError;

use crate::address::canonical_ip;

/// A host/port pair. `host` is either an IP literal or a hostname that has
/// not been canonicalized yet.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub host: String,
    pub port: u32,
}

impl Address {
    pub fn new(host: impl Into<String>, port: u32) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parses `host:port` and `[v6]:port`. Anything without a numeric port
    /// yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let (host, port) = value.trim().rsplit_once(':')?;
        let port = port.parse().ok()?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return None;
        }
        Some(Self::new(host, port))
    }
}

impl From<SocketAddr> for Address {
    fn from(addr: SocketAddr) -> Self {
        Self::new(canonical_ip(addr.ip()), u32::from(addr.port()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// One row of the database's session list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: u64,
    pub user: String,
    pub db: Option<String>,
    pub command: String,
    /// Elapsed time exactly as the database reported it.
    pub time: String,
    pub state: Option<String>,
    pub info: Option<String>,
    /// The address the database sees, i.e. the proxy's outbound side.
    pub peer: Address,
}

impl SessionRecord {
    pub fn elapsed_secs(&self) -> Result<u32, ParseIntError> {
        self.time.trim().parse()
    }
}

/// One relayed connection known to the proxy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutingRecord {
    /// Where the client connected from.
    pub origin: Address,
    /// The proxy's outbound address towards the database.
    pub proxy_facing: Address,
}

impl fmt::Display for RoutingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.origin, self.proxy_facing)
    }
}

/// The agent's answer for a local port. This is also the `/conns` body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProcessInfo {
    pub laddr: Address,
    pub status: String,
    pub pid: u32,
    pub name: String,
    pub cmdline: Vec<String>,
    pub hostname: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinedRecord {
    pub session: SessionRecord,
    pub routing: RoutingRecord,
    pub agent: Option<AgentProcessInfo>,
}

impl JoinedRecord {
    pub fn new(session: SessionRecord, routing: RoutingRecord) -> Self {
        Self {
            session,
            routing,
            agent: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("10.0.0.5:5000", Some(Address::new("10.0.0.5", 5000)))]
    #[case("db-proxy.internal:3306", Some(Address::new("db-proxy.internal", 3306)))]
    #[case("[::1]:41000", Some(Address::new("::1", 41000)))]
    #[case("localhost", None)]
    #[case(":3306", None)]
    #[case("10.0.0.5:port", None)]
    #[case("", None)]
    fn test_address_parse(#[case] input: &str, #[case] expected: Option<Address>) {
        assert_eq!(Address::parse(input), expected);
    }

    #[test]
    fn test_address_display_brackets_ipv6() {
        assert_eq!(Address::new("::1", 80).to_string(), "[::1]:80");
        assert_eq!(Address::new("10.1.2.3", 80).to_string(), "10.1.2.3:80");
    }

    #[test]
    fn test_routing_record_display() {
        let record = RoutingRecord {
            origin: Address::new("10.0.0.9", 22001),
            proxy_facing: Address::new("::1", 5000),
        };
        assert_eq!(record.to_string(), "10.0.0.9:22001 -> [::1]:5000");
    }

    #[test]
    fn test_agent_process_info_wire_format() {
        let info = AgentProcessInfo {
            laddr: Address::new("10.0.0.9", 22001),
            status: "ESTABLISHED".to_string(),
            pid: 77,
            name: "app".to_string(),
            cmdline: vec!["app".to_string(), "--serve".to_string()],
            hostname: "web-1".to_string(),
        };

        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["laddr"]["host"], "10.0.0.9");
        assert_eq!(value["laddr"]["port"], 22001);
        assert_eq!(value["status"], "ESTABLISHED");
        assert_eq!(value["cmdline"][1], "--serve");
        assert_eq!(value["hostname"], "web-1");
    }
}
