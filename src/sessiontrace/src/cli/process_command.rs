use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::commands::{Cli, Command};
use super::table::print_processes;
use crate::agent::{AgentServer, SystemHostInspector};
use crate::config::{Config, ConfigLoader};
use crate::logging::setup_logging;
use crate::server::{AggregatorServer, Correlator, ServerClient};

/// Parses the command line and runs the selected command to completion.
pub fn process_command() -> Result<()> {
    let cli = Cli::parse();

    // Flags win over the config file and environment
    let mut config = ConfigLoader::load(cli.config.as_deref())?;
    config.debug |= cli.debug;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    match cli.command {
        Command::Agent => {
            init_logging(&config)?;
            runtime.block_on(run_agent(config))
        }
        Command::Server => {
            init_logging(&config)?;
            runtime.block_on(run_server(config))
        }
        // The client prints to stdout, keep logs out of it
        Command::Procs { server, json } => runtime.block_on(show_procs(config, server, json)),
    }
}

fn init_logging(config: &Config) -> Result<()> {
    setup_logging(config.debug, config.log_file.as_deref().map(Path::new))
}

/// Cancels the returned token on Ctrl-C.
fn shutdown_signal() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down");
        }
        trigger.cancel();
    });
    token
}

async fn run_agent(config: Config) -> Result<()> {
    let server = AgentServer::bind(&config.agent, Arc::new(SystemHostInspector::new())).await?;
    server.run(shutdown_signal()).await
}

async fn run_server(config: Config) -> Result<()> {
    let correlator = Correlator::from_config(&config.server)?;
    let server = AggregatorServer::bind(&config.server, correlator).await?;
    server.run(shutdown_signal()).await
}

/// The configured listen address is usually a wildcard, which is not
/// something a client can connect to.
fn default_server_url(config: &Config) -> String {
    match config.server.listen_address.parse::<SocketAddr>() {
        Ok(addr) if addr.ip().is_unspecified() => format!("http://127.0.0.1:{}", addr.port()),
        _ => format!("http://{}", config.server.listen_address),
    }
}

async fn show_procs(config: Config, server: Option<String>, json: bool) -> Result<()> {
    let base_uri = server.unwrap_or_else(|| default_server_url(&config));
    let client = ServerClient::new(base_uri, config.server.request_timeout())?;
    let response = client.send_procs_request().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_processes(&response);
    }
    Ok(())
}
