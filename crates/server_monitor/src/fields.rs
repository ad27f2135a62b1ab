//! Canonical field vocabulary shared by every status source

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Canonical key for the configured `host:port` of a source
pub const ADDRESS: &str = "address";
/// Canonical key for the current map name
pub const MAP: &str = "map";
/// Canonical key for the connected player count
pub const PLAYERS: &str = "players";
/// Canonical key for the player limit
pub const MAX_PLAYERS: &str = "max_players";
/// Canonical key for the advertised server name
pub const NAME: &str = "name";

/// Placeholders every template may reference
pub const CORE_FIELDS: [&str; 5] = [ADDRESS, MAP, PLAYERS, MAX_PLAYERS, NAME];

/// Rendered in place of any field the data cannot provide
pub const MISSING_VALUE: &str = "?";

/// Wire format used to query a configured server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// HTTP/JSON status service at game-monitor.com
    GameMonitor,
    /// Quake3 `getinfo` over UDP
    Quake3,
    /// Battlefield 3 RCON `serverInfo` over TCP
    Bf3,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [SourceKind::GameMonitor, SourceKind::Quake3, SourceKind::Bf3];

    /// Key of the server list for this kind in the `[servers]` table
    pub fn config_key(&self) -> &'static str {
        match self {
            SourceKind::GameMonitor => "game_monitor",
            SourceKind::Quake3 => "quake3",
            SourceKind::Bf3 => "bf3",
        }
    }

    /// Core fields this kind can never report. They always render as `?`.
    pub fn unsupported_fields(&self) -> &'static [&'static str] {
        match self {
            SourceKind::GameMonitor => &[MAP],
            SourceKind::Quake3 | SourceKind::Bf3 => &[],
        }
    }

    /// Extra placeholders beyond [`CORE_FIELDS`] that this kind may fill in
    pub fn extra_fields(&self) -> &'static [&'static str] {
        match self {
            SourceKind::GameMonitor => &[],
            SourceKind::Quake3 => &[
                "mapname",
                "clients",
                "sv_maxclients",
                "hostname",
                "gametype",
                "game",
                "gamename",
                "modversion",
                "protocol",
                "pure",
                "auth",
                "voip",
                "bots",
            ],
            SourceKind::Bf3 => &[
                "gamemode",
                "roundsPlayed",
                "roundsTotal",
                "numTeams",
                "team1score",
                "team2score",
                "team3score",
                "team4score",
                "targetScore",
                "onlineState",
                "isRanked",
                "hasPunkbuster",
                "hasPassword",
                "serverUptime",
                "roundTime",
                "gameIpAndPort",
                "punkBusterVersion",
                "joinQueueEnabled",
                "region",
                "closestPingSite",
                "country",
                "matchMakingEnabled",
            ],
        }
    }

    /// Whether `field` can ever be produced by a source of this kind
    pub fn supports(&self, field: &str) -> bool {
        (CORE_FIELDS.contains(&field) && !self.unsupported_fields().contains(&field))
            || self.extra_fields().contains(&field)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::GameMonitor => write!(f, "game-monitor.com"),
            SourceKind::Quake3 => write!(f, "quake3 server"),
            SourceKind::Bf3 => write!(f, "BF3 server"),
        }
    }
}

/// Every placeholder name a template may use
pub fn known_placeholders() -> impl Iterator<Item = &'static str> {
    CORE_FIELDS
        .into_iter()
        .chain(SourceKind::ALL.into_iter().flat_map(|kind| kind.extra_fields().iter().copied()))
}

/// Wire-format independent view of a server's status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedFields(BTreeMap<String, String>);

impl NormalizedFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value for `key`, or `?` when absent
    pub fn get_or_missing(&self, key: &str) -> &str {
        self.get(key).unwrap_or(MISSING_VALUE)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Move the value stored under `from` to `to`
    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(value) = self.0.remove(from) {
            self.0.insert(to.to_string(), value);
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NormalizedFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
