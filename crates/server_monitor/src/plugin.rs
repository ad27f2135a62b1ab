//! Host-facing plugin facade
//!
//! The host owns chat, permissions and the event bus. It talks to the plugin
//! through three small traits: [`MessageSink`] for public broadcasts,
//! [`CommandCaller`] for the player who typed a command and
//! [`CommandRegistrar`] for exposing commands at load time.

use crate::config::{MonitorSettings, ResolvedSettings};
use crate::registry::{IndexError, ServerRegistry};
use crate::Transports;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Commands this plugin implements
pub const COMMANDS: [&str; 1] = ["servers"];

/// Public chat of the game server
pub trait MessageSink: Send + Sync {
    fn say(&self, message: &str);
}

/// The player who issued a command
pub trait CommandCaller: Send {
    /// Answer visible to whoever the command level allows
    fn reply(&mut self, message: &str);

    fn private_message(&mut self, message: &str);

    /// Prefix the player types before commands, e.g. `!`
    fn command_prefix(&self) -> &str {
        "!"
    }
}

/// A command to expose, as read from the `[commands]` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: String,
    pub alias: Option<String>,
    pub level: String,
}

impl CommandSpec {
    /// Parses a `"<name>[-<alias>]"` key
    pub fn from_entry(key: &str, level: &str) -> Self {
        let (name, alias) = match key.split('-').collect::<Vec<_>>().as_slice() {
            [name, alias] => (name.to_string(), Some(alias.to_string())),
            _ => (key.to_string(), None),
        };
        Self {
            name,
            alias,
            level: level.to_string(),
        }
    }
}

/// Receives the commands the plugin wants to expose
pub trait CommandRegistrar {
    fn register_command(&mut self, spec: CommandSpec);
}

impl CommandRegistrar for Vec<CommandSpec> {
    fn register_command(&mut self, spec: CommandSpec) {
        self.push(spec);
    }
}

/// Game events the plugin may react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    MapChange { map: String },
}

/// Advertises configured game servers in chat
pub struct ServermonitorPlugin {
    transports: Transports,
    sink: Box<dyn MessageSink>,
    settings: ResolvedSettings,
    registry: ServerRegistry,
}

impl ServermonitorPlugin {
    pub fn new(transports: Transports, sink: Box<dyn MessageSink>) -> Self {
        Self {
            transports,
            sink,
            settings: ResolvedSettings::default(),
            registry: ServerRegistry::new(),
        }
    }

    pub fn settings(&self) -> &ResolvedSettings {
        &self.settings
    }

    pub fn registry(&self) -> &ServerRegistry {
        &self.registry
    }

    /// Applies a configuration, replacing every previously configured source
    pub fn load_config(&mut self, config: &MonitorSettings, registrar: &mut dyn CommandRegistrar) {
        register_commands(config.commands.as_ref(), registrar);
        self.settings = config.resolve();
        self.registry = self.settings.build_registry(&self.transports);
        info!("{} server(s) configured", self.registry.len());
    }

    pub async fn on_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::MapChange { map } if self.settings.advertise_on_map_change && !self.registry.is_empty() => {
                debug!("map changed to {}, advertising servers", map);
                for summary in self.registry.update_all().await {
                    self.sink.say(&summary);
                }
            }
            _ => {}
        }
    }

    /// `!servers [index]`: advertises every server, or only the one at `index`.
    ///
    /// Summaries go back through [`CommandCaller::reply`]. A bad index is
    /// reported privately so the chat stays clean.
    ///
    /// # Arguments
    ///
    /// * `args` - Whatever the player typed after the command name
    /// * `caller` - The player issuing the command
    ///
    /// # Examples
    ///
    /// With two servers configured and `!` as prefix:
    ///
    /// | `args` | outcome |
    /// |---|---|
    /// | `""` | both summaries replied in order |
    /// | `"2"` | second summary replied |
    /// | `"x"` | private "invalid server index. Try !help servers" |
    /// | `"3"` | private "invalid server index. Server indexes go from 1 to 2" |
    pub async fn cmd_servers(&mut self, args: &str, caller: &mut dyn CommandCaller) {
        if self.registry.is_empty() {
            caller.reply("no server setup");
            return;
        }

        let args = args.trim();
        if args.is_empty() {
            for summary in self.registry.update_all().await {
                caller.reply(&summary);
            }
            return;
        }

        match self.registry.update_one(args).await {
            Ok(summary) => caller.reply(&summary),
            Err(IndexError::NotANumber(_)) => {
                let message = format!("invalid server index. Try {}help servers", caller.command_prefix());
                caller.private_message(&message);
            }
            Err(e @ IndexError::OutOfRange { .. }) => {
                caller.private_message(&format!("invalid server index. {}", e));
            }
        }
    }
}

fn register_commands(commands: Option<&BTreeMap<String, String>>, registrar: &mut dyn CommandRegistrar) {
    let Some(commands) = commands else {
        warn!("could not find section 'commands' in the plugin config. No command can be made available.");
        return;
    };

    for (key, level) in commands {
        let spec = CommandSpec::from_entry(key, level);
        if COMMANDS.contains(&spec.name.as_str()) {
            debug!("registering command {:?}", spec);
            registrar.register_command(spec);
        } else {
            debug!("ignoring unknown command {:?}", key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::source::testing::CannedTransport;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSink(Arc<Mutex<Vec<String>>>);

    impl MessageSink for RecordingSink {
        fn say(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    #[derive(Default)]
    struct RecordingCaller {
        replies: Vec<String>,
        private: Vec<String>,
    }

    impl CommandCaller for RecordingCaller {
        fn reply(&mut self, message: &str) {
            self.replies.push(message.to_string());
        }

        fn private_message(&mut self, message: &str) {
            self.private.push(message.to_string());
        }
    }

    struct Fixture {
        plugin: ServermonitorPlugin,
        said: RecordingSink,
        quake3: Arc<CannedTransport<Vec<u8>>>,
    }

    fn fixture(config: &str) -> Fixture {
        let quake3 = CannedTransport::new(|| {
            Ok(b"\xff\xff\xff\xffinfoResponse\n\\mapname\\ut4_casa\\clients\\2\\sv_maxclients\\12\\hostname\\Test".to_vec())
        });
        let transports = Transports {
            game_monitor: CannedTransport::new(|| Err(TransportError::NotModified)),
            quake3: quake3.clone(),
            bf3: CannedTransport::new(|| Err(TransportError::Timeout(3))),
        };
        let said = RecordingSink::default();
        let mut plugin = ServermonitorPlugin::new(transports, Box::new(said.clone()));
        let settings: MonitorSettings = toml::from_str(config).unwrap();
        plugin.load_config(&settings, &mut Vec::<CommandSpec>::new());
        Fixture { plugin, said, quake3 }
    }

    const TWO_SERVERS: &str = r#"
        [settings]
        advertise_on_map_change = "yes"
        advertisement_format = "{address} : {map} {players}/{max_players} {name}"
        [servers]
        quake3 = "1.1.1.1:27960"
        bf3 = "2.2.2.2:47200"
    "#;

    #[tokio::test]
    async fn test_servers_without_argument() {
        let mut f = fixture(TWO_SERVERS);
        let mut caller = RecordingCaller::default();
        f.plugin.cmd_servers("", &mut caller).await;
        assert_eq!(
            caller.replies,
            vec!["1.1.1.1:27960 : ut4_casa 2/12 Test", "2.2.2.2:47200 : down"]
        );
        assert!(caller.private.is_empty());
    }

    #[tokio::test]
    async fn test_servers_with_index() {
        let mut f = fixture(TWO_SERVERS);
        let mut caller = RecordingCaller::default();
        f.plugin.cmd_servers("2", &mut caller).await;
        assert_eq!(caller.replies, vec!["2.2.2.2:47200 : down"]);
        assert_eq!(f.quake3.call_count(), 0);
    }

    #[tokio::test]
    async fn test_servers_invalid_index() {
        let mut f = fixture(TWO_SERVERS);
        let mut caller = RecordingCaller::default();
        f.plugin.cmd_servers("f00", &mut caller).await;
        f.plugin.cmd_servers("3", &mut caller).await;
        assert!(caller.replies.is_empty());
        assert_eq!(
            caller.private,
            vec![
                "invalid server index. Try !help servers",
                "invalid server index. Server indexes go from 1 to 2",
            ]
        );
        assert_eq!(f.quake3.call_count(), 0);
    }

    #[tokio::test]
    async fn test_servers_without_servers() {
        let mut f = fixture("[settings]\n");
        let mut caller = RecordingCaller::default();
        f.plugin.cmd_servers("1", &mut caller).await;
        assert_eq!(caller.replies, vec!["no server setup"]);
    }

    #[tokio::test]
    async fn test_map_change_broadcasts() {
        let mut f = fixture(TWO_SERVERS);
        f.plugin
            .on_event(&GameEvent::MapChange {
                map: "ut4_turnpike".to_string(),
            })
            .await;
        assert_eq!(
            *f.said.0.lock().unwrap(),
            vec!["1.1.1.1:27960 : ut4_casa 2/12 Test", "2.2.2.2:47200 : down"]
        );
    }

    #[tokio::test]
    async fn test_map_change_silent_when_disabled() {
        let mut f = fixture("[settings]\nadvertise_on_map_change = false\n[servers]\nquake3 = \"1.1.1.1:27960\"\n");
        f.plugin
            .on_event(&GameEvent::MapChange {
                map: "ut4_casa".to_string(),
            })
            .await;
        assert!(f.said.0.lock().unwrap().is_empty());
        assert_eq!(f.quake3.call_count(), 0);
    }

    #[test]
    fn test_reload_replaces_sources() {
        let mut f = fixture(TWO_SERVERS);
        assert_eq!(f.plugin.registry().len(), 2);
        let settings: MonitorSettings = toml::from_str("[servers]\nquake3 = \"9.9.9.9:1\"\n").unwrap();
        f.plugin.load_config(&settings, &mut Vec::<CommandSpec>::new());
        assert_eq!(f.plugin.registry().len(), 1);
        assert!(!f.plugin.settings().advertise_on_map_change);
    }

    #[test]
    fn test_command_registration() {
        let mut registered: Vec<CommandSpec> = Vec::new();
        let commands = BTreeMap::from([
            ("servers-srv".to_string(), "guest".to_string()),
            ("f00".to_string(), "admin".to_string()),
        ]);
        register_commands(Some(&commands), &mut registered);
        assert_eq!(
            registered,
            vec![CommandSpec {
                name: "servers".to_string(),
                alias: Some("srv".to_string()),
                level: "guest".to_string(),
            }]
        );

        let mut registered: Vec<CommandSpec> = Vec::new();
        register_commands(None, &mut registered);
        assert!(registered.is_empty());
    }

    #[test]
    fn test_command_spec_from_entry() {
        assert_eq!(CommandSpec::from_entry("servers", "0").alias, None);
        assert_eq!(CommandSpec::from_entry("a-b-c", "0").name, "a-b-c");
    }
}
