//! Command-line argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Query game servers and advertise their status
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    ///
    /// A default configuration is written there if the file doesn't exist.
    #[arg(short, long, value_name = "FILE", default_value = "servermonitor.toml")]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error), overrides the config file
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Output logs in JSON format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Query the configured servers once and print their status
    Query {
        /// 1-based server index; every server when omitted
        index: Option<String>,
    },
    /// Read console commands from stdin until interrupted
    ///
    /// Accepts `!servers [n]`, `map <name>` and `reload`.
    Watch,
}
