//! # Server Monitor
//!
//! Queries remote game servers and turns their status into one-line
//! advertisements for in-game chat.
//!
//! ## Sources
//!
//! Three wire formats are supported, each implemented as a [`ServerSource`]:
//!
//! * **game-monitor.com** - HTTP GET of a `=<json>` document
//! * **Quake3 engine** - UDP `getinfo` out-of-band query
//! * **Battlefield 3** - Frostbite RCON `serverInfo` over TCP
//!
//! Every source parses its reply into [`NormalizedFields`], a flat map keyed
//! by the canonical names `address`, `map`, `players`, `max_players` and
//! `name`, then renders the configured [`Template`].
//!
//! ## Usage
//!
//! The host application builds a [`ServermonitorPlugin`] with a broadcast
//! [`MessageSink`], feeds it the parsed [`MonitorSettings`], then forwards
//! `!servers` commands and map-change events to it.
//!
//! ```rust,no_run
//! use server_monitor::{CommandSpec, GameEvent, MessageSink, MonitorSettings, ServermonitorPlugin, Transports};
//!
//! struct Chat;
//!
//! impl MessageSink for Chat {
//!     fn say(&self, message: &str) {
//!         println!("{}", message);
//!     }
//! }
//!
//! # async fn demo(settings: MonitorSettings) -> Result<(), Box<dyn std::error::Error>> {
//! let mut plugin = ServermonitorPlugin::new(Transports::new()?, Box::new(Chat));
//! plugin.load_config(&settings, &mut Vec::<CommandSpec>::new());
//! plugin.on_event(&GameEvent::MapChange { map: "ut4_casa".to_string() }).await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod fields;
pub mod plugin;
pub mod registry;
pub mod source;
pub mod template;
pub mod transport;

pub use config::{AddressList, Flag, GeneralSettings, MonitorSettings, ResolvedSettings, ServersSettings};
pub use error::{ConfigError, QueryError, TransportError, ValidationError};
pub use fields::{NormalizedFields, SourceKind};
pub use plugin::{CommandCaller, CommandRegistrar, CommandSpec, GameEvent, MessageSink, ServermonitorPlugin};
pub use registry::ServerRegistry;
pub use source::{DisplayState, ServerSource};
pub use template::Template;

use std::sync::Arc;
use transport::{FrostbiteTransport, GameMonitorTransport, Quake3Transport, Transport};

/// One shared transport per source kind
#[derive(Clone)]
pub struct Transports {
    pub game_monitor: Arc<dyn Transport<Response = String>>,
    pub quake3: Arc<dyn Transport<Response = Vec<u8>>>,
    pub bf3: Arc<dyn Transport<Response = Vec<String>>>,
}

impl Transports {
    /// The network transports used in production
    pub fn new() -> error::TransportResult<Self> {
        Ok(Self {
            game_monitor: Arc::new(GameMonitorTransport::new()?),
            quake3: Arc::new(Quake3Transport::new()),
            bf3: Arc::new(FrostbiteTransport::new()),
        })
    }
}

impl std::fmt::Debug for Transports {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Transports")
    }
}
