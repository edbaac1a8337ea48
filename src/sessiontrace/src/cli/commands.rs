use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Clone, Debug)]
#[clap(
    name = "sessiontrace",
    about = "Finds the client process behind every MySQL connection relayed through a TCP proxy",
    version
)]
pub struct Cli {
    /// Path to a TOML config file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[clap(long, global = true)]
    pub debug: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the per-host agent that maps local ports to processes
    Agent,

    /// Run the aggregator that correlates MySQL sessions with client processes
    Server,

    /// Query a running aggregator and print the correlated processes
    Procs {
        /// Base URL of the aggregator; defaults to the configured listen address
        #[clap(long)]
        server: Option<String>,

        /// Print the raw JSON response
        #[clap(long)]
        json: bool,
    },
}
