//! Console front-end standing in for the game server's chat and admin layer

use crate::config::AppConfig;
use crate::signals::wait_for_shutdown;
use server_monitor::{CommandCaller, CommandSpec, GameEvent, MessageSink, ServermonitorPlugin};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{error, info, warn};

/// Prefix of player commands typed on the console
pub const COMMAND_PREFIX: &str = "!";

/// Public chat printed to stdout
pub struct ConsoleChat;

impl MessageSink for ConsoleChat {
    fn say(&self, message: &str) {
        println!("{}", message);
    }
}

/// The console operator, acting as the player issuing commands
#[derive(Debug, Default)]
pub struct ConsolePlayer;

impl CommandCaller for ConsolePlayer {
    fn reply(&mut self, message: &str) {
        println!("{}", message);
    }

    fn private_message(&mut self, message: &str) {
        println!("(private) {}", message);
    }

    fn command_prefix(&self) -> &str {
        COMMAND_PREFIX
    }
}

/// One parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    Empty,
    /// `!<name> [args]`
    Command { name: String, args: String },
    /// `map <name>`
    MapChange(String),
    Reload,
    Unknown(String),
}

impl ConsoleLine {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ConsoleLine::Empty;
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        if let Some(name) = word.strip_prefix(COMMAND_PREFIX) {
            if !name.is_empty() {
                return ConsoleLine::Command {
                    name: name.to_string(),
                    args: rest.to_string(),
                };
            }
        }

        match word {
            "map" if !rest.is_empty() => ConsoleLine::MapChange(rest.to_string()),
            "reload" if rest.is_empty() => ConsoleLine::Reload,
            _ => ConsoleLine::Unknown(line.to_string()),
        }
    }
}

/// Owns the plugin and the commands it registered
pub struct Console {
    plugin: ServermonitorPlugin,
    config_path: PathBuf,
    commands: Vec<CommandSpec>,
}

impl Console {
    pub fn new(plugin: ServermonitorPlugin, config_path: PathBuf) -> Self {
        Self {
            plugin,
            config_path,
            commands: Vec::new(),
        }
    }

    /// Hands `config` to the plugin, forgetting previously registered commands
    pub fn apply(&mut self, config: &AppConfig) {
        self.commands.clear();
        self.plugin.load_config(&config.monitor_settings(), &mut self.commands);
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    pub fn plugin(&self) -> &ServermonitorPlugin {
        &self.plugin
    }

    /// Resolves a typed command or alias to the registered command name
    fn resolve_command(&self, typed: &str) -> Option<&str> {
        self.commands
            .iter()
            .find(|spec| spec.name == typed || spec.alias.as_deref() == Some(typed))
            .map(|spec| spec.name.as_str())
    }

    /// `!servers [index]` run once by the console operator
    pub async fn query(&mut self, index: &str) {
        self.plugin.cmd_servers(index, &mut ConsolePlayer).await;
    }

    pub async fn handle(&mut self, line: &str) {
        match ConsoleLine::parse(line) {
            ConsoleLine::Empty => {}
            ConsoleLine::Command { name, args } => match self.resolve_command(&name).map(str::to_string).as_deref() {
                Some("servers") => self.query(&args).await,
                Some(other) => warn!("Command {} has no handler", other),
                None => warn!("Unknown command {}{}", COMMAND_PREFIX, name),
            },
            ConsoleLine::MapChange(map) => {
                info!("Map changed to {}", map);
                self.plugin.on_event(&GameEvent::MapChange { map }).await;
            }
            ConsoleLine::Reload => self.reload().await,
            ConsoleLine::Unknown(text) => warn!("Unrecognized input: {}", text),
        }
    }

    /// Re-reads the configuration file; a broken file keeps the current setup
    pub async fn reload(&mut self) {
        match AppConfig::load_from_file(&self.config_path).await {
            Ok(config) => {
                self.apply(&config);
                info!("Configuration reloaded from {}", self.config_path.display());
            }
            Err(e) => error!("Failed to reload {}: {}", self.config_path.display(), e),
        }
    }

    /// Handles lines from `input` until end of input or a shutdown signal
    pub async fn run<R: AsyncRead + Unpin>(&mut self, input: R) -> anyhow::Result<()> {
        let mut lines = BufReader::new(input).lines();
        let shutdown = wait_for_shutdown();
        tokio::pin!(shutdown);
        let mut handled = 0usize;

        loop {
            tokio::select! {
                reason = &mut shutdown => {
                    info!("Stopping console input on {} after {} line(s)", reason?, handled);
                    break;
                }
                line = lines.next_line() => match line? {
                    Some(line) => {
                        self.handle(&line).await;
                        handled += 1;
                    }
                    None => {
                        info!("End of console input after {} line(s)", handled);
                        break;
                    }
                },
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use server_monitor::Transports;
    use tempfile::tempdir;

    fn console(path: PathBuf) -> Console {
        let plugin = ServermonitorPlugin::new(Transports::new().unwrap(), Box::new(ConsoleChat));
        Console::new(plugin, path)
    }

    #[test]
    fn test_parse_lines() {
        assert_eq!(ConsoleLine::parse("   "), ConsoleLine::Empty);
        assert_eq!(
            ConsoleLine::parse("!servers 2"),
            ConsoleLine::Command {
                name: "servers".to_string(),
                args: "2".to_string()
            }
        );
        assert_eq!(
            ConsoleLine::parse("!srv"),
            ConsoleLine::Command {
                name: "srv".to_string(),
                args: String::new()
            }
        );
        assert_eq!(ConsoleLine::parse("map ut4_casa"), ConsoleLine::MapChange("ut4_casa".to_string()));
        assert_eq!(ConsoleLine::parse(" reload "), ConsoleLine::Reload);
        assert_eq!(ConsoleLine::parse("map"), ConsoleLine::Unknown("map".to_string()));
        assert_eq!(ConsoleLine::parse("!"), ConsoleLine::Unknown("!".to_string()));
    }

    #[test]
    fn test_apply_registers_commands() {
        let mut config = AppConfig::default();
        config.commands = Some([("servers-sv".to_string(), "guest".to_string())].into());

        let mut console = console(PathBuf::from("unused.toml"));
        console.apply(&config);
        assert_eq!(console.resolve_command("servers"), Some("servers"));
        assert_eq!(console.resolve_command("sv"), Some("servers"));
        assert_eq!(console.resolve_command("f00"), None);

        console.apply(&AppConfig::default());
        assert_eq!(console.commands().len(), 1);
        assert_eq!(console.resolve_command("sv"), None);
    }

    #[tokio::test]
    async fn test_run_reloads_until_end_of_input() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("servermonitor.toml");
        let mut console = console(path.clone());
        console.apply(&AppConfig::default());
        assert!(console.plugin().registry().is_empty());

        tokio::fs::write(&path, "[servers]\nquake3 = \"1.2.3.4:27960\"\n[commands]\nservers = \"guest\"\n")
            .await
            .unwrap();
        console.run(&b"reload\nunknown words\n"[..]).await.unwrap();

        assert_eq!(console.plugin().registry().len(), 1);
        assert!(!console.plugin().settings().advertise_on_map_change);
    }

    #[tokio::test]
    async fn test_broken_reload_keeps_setup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("servermonitor.toml");
        tokio::fs::write(&path, "[servers]\nquake3 = \"1.2.3.4:27960\"\n").await.unwrap();

        let mut console = console(path.clone());
        console.reload().await;
        assert_eq!(console.plugin().registry().len(), 1);

        tokio::fs::write(&path, "[servers\n").await.unwrap();
        console.reload().await;
        assert_eq!(console.plugin().registry().len(), 1);
    }
}
