pub const DEFAULT_AGENT_PORT: u16 = 3333;
pub const DEFAULT_SERVER_PORT: u16 = 3322;
pub const DEFAULT_PROXY_MGMT_ADDRESS: &str = "127.0.0.1:3307";
pub const DEFAULT_DSN: &str = "mysql://root@127.0.0.1:3306/information_schema";

pub const PROXY_CONNECT_TIMEOUT_MS: u64 = 2_000;
pub const PROXY_READ_TIMEOUT_MS: u64 = 2_000;
pub const AGENT_CONNECT_TIMEOUT_MS: u64 = 2_000;
pub const AGENT_READ_TIMEOUT_MS: u64 = 2_000;
pub const REQUEST_TIMEOUT_MS: u64 = 30_000;

pub const ENV_PREFIX: &str = "SESSIONTRACE";

/// Reported by the agent when the host name cannot be read.
pub const UNKNOWN_HOSTNAME: &str = "UNKNOWN";
