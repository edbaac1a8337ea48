mod config_loader;

pub use config_loader::{AgentConfig, Config, ConfigLoader, ServerConfig};
