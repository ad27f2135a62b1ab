//! Console host for the servermonitor plugin
//!
//! Loads the configuration, sets up logging and drives the plugin either once
//! (`query`) or interactively from stdin (`watch`).

mod cli;
mod config;
mod console;
mod logging;
mod signals;

use clap::Parser;
use cli::{Args, Command};
use config::AppConfig;
use console::{Console, ConsoleChat};
use server_monitor::{ServermonitorPlugin, Transports};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load_from_file(&args.config).await?;
    config.apply_overrides(&args);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;

    logging::setup_logging(&config.logging)?;
    info!(
        "servermonitor v{} | Config: {}",
        env!("CARGO_PKG_VERSION"),
        args.config.display()
    );

    let plugin = ServermonitorPlugin::new(Transports::new()?, Box::new(ConsoleChat));
    let mut console = Console::new(plugin, args.config.clone());
    console.apply(&config);
    info!("{} command(s) registered", console.commands().len());

    match args.command {
        Command::Query { index } => console.query(index.as_deref().unwrap_or("")).await,
        Command::Watch => {
            info!("Type !servers [n], map <name> or reload; Ctrl+C to quit");
            console.run(tokio::io::stdin()).await?;
        }
    }

    Ok(())
}
