pub mod address;
pub mod agent;
pub mod cli;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
mod http_server;
pub mod logging;
pub mod server;
pub mod types;
