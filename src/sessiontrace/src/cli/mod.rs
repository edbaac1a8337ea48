mod commands;
mod process_command;
mod table;

pub use commands::{Cli, Command};
pub use process_command::process_command;
