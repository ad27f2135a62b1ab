//! Plugin configuration
//!
//! [`MonitorSettings`] is the raw TOML shape, every section optional so the
//! loader can tell the operator exactly what is missing. [`MonitorSettings::resolve`]
//! turns it into [`ResolvedSettings`], logging each decision and falling back
//! to defaults instead of failing.

use crate::error::{ConfigError, ConfigResult};
use crate::fields::SourceKind;
use crate::registry::ServerRegistry;
use crate::source::build_source;
use crate::template::{Template, DEFAULT_ADVERTISEMENT_FORMAT};
use crate::Transports;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddrV4;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const DEFAULT_ADVERTISE_ON_MAP_CHANGE: bool = false;

/// Keys of the `[settings]` section, as named in log messages
pub const ADVERTISE_ON_MAP_CHANGE_KEY: &str = "advertise_on_map_change";
pub const ADVERTISEMENT_FORMAT_KEY: &str = "advertisement_format";

/// Plugin configuration as read from disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<GeneralSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servers: Option<ServersSettings>,
    /// `"<command>[-<alias>]" = "<level>"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<BTreeMap<String, String>>,
}

/// The `[settings]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertise_on_map_change: Option<Flag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertisement_format: Option<String>,
}

/// A boolean written either natively or as text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Text(String),
}

impl Flag {
    pub fn to_bool(&self) -> ConfigResult<bool> {
        match self {
            Flag::Bool(b) => Ok(*b),
            Flag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "yes" | "true" | "on" | "1" => Ok(true),
                "no" | "false" | "off" | "0" => Ok(false),
                _ => Err(ConfigError::InvalidBoolean(text.clone())),
            },
        }
    }
}

/// The `[servers]` section, one address list per source kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServersSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_monitor: Option<AddressList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quake3: Option<AddressList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bf3: Option<AddressList>,
}

impl ServersSettings {
    pub fn for_kind(&self, kind: SourceKind) -> Option<&AddressList> {
        match kind {
            SourceKind::GameMonitor => self.game_monitor.as_ref(),
            SourceKind::Quake3 => self.quake3.as_ref(),
            SourceKind::Bf3 => self.bf3.as_ref(),
        }
    }
}

/// Addresses given as one whitespace separated string or as an array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AddressList {
    Text(String),
    List(Vec<String>),
}

impl AddressList {
    /// Every whitespace or comma separated token, in order
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            AddressList::Text(text) => split_tokens(text).collect(),
            AddressList::List(items) => items.iter().flat_map(|item| split_tokens(item)).collect(),
        }
    }

    /// Tokens that are valid addresses for `kind`; the rest are dropped
    pub fn addresses(&self, kind: SourceKind) -> Vec<String> {
        self.tokens()
            .into_iter()
            .filter(|token| is_valid_address(kind, token))
            .map(str::to_string)
            .collect()
    }
}

fn split_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
}

/// The web service only knows servers by IPv4 address; direct queries accept
/// any `<host>:<port>`.
pub fn is_valid_address(kind: SourceKind, token: &str) -> bool {
    match kind {
        SourceKind::GameMonitor => token.parse::<SocketAddrV4>().is_ok(),
        SourceKind::Quake3 | SourceKind::Bf3 => match token.rsplit_once(':') {
            Some((host, port)) => {
                !host.is_empty() && !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())
            }
            None => false,
        },
    }
}

/// Settings after validation and defaulting
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub advertise_on_map_change: bool,
    pub template: Arc<Template>,
    /// Addresses per kind, in kind order
    pub servers: Vec<(SourceKind, Vec<String>)>,
}

impl Default for ResolvedSettings {
    fn default() -> Self {
        Self {
            advertise_on_map_change: DEFAULT_ADVERTISE_ON_MAP_CHANGE,
            template: Arc::new(Template::default()),
            servers: Vec::new(),
        }
    }
}

impl ResolvedSettings {
    /// Builds a fresh registry, kinds in fixed order then configuration order
    pub fn build_registry(&self, transports: &Transports) -> ServerRegistry {
        let mut registry = ServerRegistry::new();
        for (kind, addresses) in &self.servers {
            registry.extend(
                addresses
                    .iter()
                    .map(|address| build_source(*kind, address, self.template.clone(), transports)),
            );
        }
        registry
    }
}

impl MonitorSettings {
    pub fn resolve(&self) -> ResolvedSettings {
        let advertise_on_map_change = self.resolve_advertise_on_map_change();
        let template = Arc::new(self.resolve_advertisement_format());
        let servers = SourceKind::ALL
            .into_iter()
            .map(|kind| (kind, self.resolve_servers(kind)))
            .collect();

        ResolvedSettings {
            advertise_on_map_change,
            template,
            servers,
        }
    }

    fn resolve_advertise_on_map_change(&self) -> bool {
        let mut value = DEFAULT_ADVERTISE_ON_MAP_CHANGE;
        match &self.settings {
            None => error!("The config has no section 'settings'."),
            Some(GeneralSettings {
                advertise_on_map_change: None,
                ..
            }) => warn!(
                "The config is missing '{}' in section 'settings'.",
                ADVERTISE_ON_MAP_CHANGE_KEY
            ),
            Some(GeneralSettings {
                advertise_on_map_change: Some(flag),
                ..
            }) => match flag.to_bool() {
                Ok(parsed) => value = parsed,
                Err(e) => error!(
                    "Unexpected value for setting '{}' in section 'settings': {}",
                    ADVERTISE_ON_MAP_CHANGE_KEY, e
                ),
            },
        }
        info!("advertise servers on map change: {}", if value { "yes" } else { "no" });
        value
    }

    fn resolve_advertisement_format(&self) -> Template {
        let template = match &self.settings {
            None => {
                error!("The config has no section 'settings'.");
                Template::default()
            }
            Some(GeneralSettings {
                advertisement_format: None,
                ..
            }) => {
                warn!(
                    "The config is missing '{}' in section 'settings'.",
                    ADVERTISEMENT_FORMAT_KEY
                );
                Template::default()
            }
            Some(GeneralSettings {
                advertisement_format: Some(raw),
                ..
            }) => match Template::parse(raw) {
                Ok(template) => template,
                Err(ConfigError::EmptyTemplate) => {
                    error!("Invalid {}. Cannot be empty", ADVERTISEMENT_FORMAT_KEY);
                    Template::default()
                }
                Err(e) => {
                    error!("Invalid {} {:?}. {}", ADVERTISEMENT_FORMAT_KEY, raw, e);
                    Template::default()
                }
            },
        };
        info!("{}: {}", ADVERTISEMENT_FORMAT_KEY, template);
        template
    }

    fn resolve_servers(&self, kind: SourceKind) -> Vec<String> {
        let addresses = match &self.servers {
            None => {
                error!("The config has no section 'servers'.");
                Vec::new()
            }
            Some(servers) => match servers.for_kind(kind) {
                None => {
                    warn!("The config is missing '{}' in section 'servers'.", kind.config_key());
                    Vec::new()
                }
                Some(list) => list.addresses(kind),
            },
        };

        if addresses.is_empty() {
            info!("No server loaded from config for datasource {}", kind);
        } else {
            info!(
                "servers loaded from config for datasource {}: {}",
                kind,
                addresses.join(", ")
            );
        }
        addresses
    }
}

/// Default format used by fresh configuration files
pub fn default_advertisement_format() -> String {
    DEFAULT_ADVERTISEMENT_FORMAT.to_string()
}
