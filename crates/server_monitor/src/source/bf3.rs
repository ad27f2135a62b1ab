//! Status read from Battlefield 3 servers over Frostbite RCON

use super::bf3_tables::{game_mode_name, map_name};
use super::{log_update_start, DisplayState, ServerInfo, ServerSource};
use crate::error::{ValidationError, ValidationResult};
use crate::fields::{NormalizedFields, SourceKind, MAP, MAX_PLAYERS, NAME, PLAYERS};
use crate::template::Template;
use crate::transport::Transport;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Words preceding the team scores
const LEADING_FIELDS: [&str; 8] = [
    "serverName",
    "numPlayers",
    "maxPlayers",
    "gamemode",
    "level",
    "roundsPlayed",
    "roundsTotal",
    "numTeams",
];

/// Words following the team scores that every server sends
const TRAILING_FIELDS: [&str; 7] = [
    "targetScore",
    "onlineState",
    "isRanked",
    "hasPunkbuster",
    "hasPassword",
    "serverUptime",
    "roundTime",
];

/// Words newer server builds append
const OPTIONAL_FIELDS: [&str; 7] = [
    "gameIpAndPort",
    "punkBusterVersion",
    "joinQueueEnabled",
    "region",
    "closestPingSite",
    "country",
    "matchMakingEnabled",
];

const MAX_TEAMS: usize = 4;

/// A Battlefield 3 server queried with `serverInfo`
pub struct Bf3Source {
    info: ServerInfo<Vec<String>>,
    transport: Arc<dyn Transport<Response = Vec<String>>>,
}

impl Bf3Source {
    pub fn new(
        address: impl Into<String>,
        template: Arc<Template>,
        transport: Arc<dyn Transport<Response = Vec<String>>>,
    ) -> Self {
        Self {
            info: ServerInfo::new(address, template),
            transport,
        }
    }

    pub fn raw_response(&self) -> Option<&Vec<String>> {
        self.info.raw_response()
    }
}

/// Decodes the positional `serverInfo` words, status word already removed.
///
/// The number of team score words depends on `numTeams`; missing team slots
/// and missing optional trailing words are simply absent from the result.
pub fn decode_server_info(words: &[String]) -> ValidationResult<NormalizedFields> {
    let too_few = |expected: usize| ValidationError::TooFewWords {
        expected,
        actual: words.len(),
    };

    if words.len() < LEADING_FIELDS.len() {
        return Err(too_few(LEADING_FIELDS.len() + TRAILING_FIELDS.len()));
    }

    let team_count_word = &words[LEADING_FIELDS.len() - 1];
    let team_count = team_count_word
        .parse::<usize>()
        .ok()
        .filter(|n| *n <= MAX_TEAMS)
        .ok_or_else(|| ValidationError::InvalidTeamCount(team_count_word.clone()))?;

    let required = LEADING_FIELDS.len() + team_count + TRAILING_FIELDS.len();
    if words.len() < required {
        return Err(too_few(required));
    }

    let mut fields: NormalizedFields = LEADING_FIELDS
        .iter()
        .zip(words)
        .map(|(key, value)| (*key, value.as_str()))
        .collect();

    let scores = &words[LEADING_FIELDS.len()..LEADING_FIELDS.len() + team_count];
    for (i, score) in scores.iter().enumerate() {
        fields.insert(format!("team{}score", i + 1), score.clone());
    }

    let rest = &words[LEADING_FIELDS.len() + team_count..];
    for (key, value) in TRAILING_FIELDS.iter().chain(OPTIONAL_FIELDS.iter()).zip(rest) {
        fields.insert(*key, value.clone());
    }

    Ok(fields)
}

/// Decodes the words and maps them onto the canonical vocabulary
pub fn parse(raw: &Vec<String>) -> ValidationResult<NormalizedFields> {
    let mut fields = decode_server_info(raw)?;

    if let Some(level) = fields.remove("level") {
        fields.insert(MAP, map_name(&level));
    }
    if let Some(mode) = fields.get("gamemode").map(|m| game_mode_name(m).to_string()) {
        fields.insert("gamemode", mode);
    }
    fields.rename("serverName", NAME);
    fields.rename("numPlayers", PLAYERS);
    fields.rename("maxPlayers", MAX_PLAYERS);

    Ok(fields)
}

#[async_trait]
impl ServerSource for Bf3Source {
    fn kind(&self) -> SourceKind {
        SourceKind::Bf3
    }

    fn address(&self) -> &str {
        self.info.address()
    }

    fn fields(&self) -> Option<&NormalizedFields> {
        self.info.fields()
    }

    fn state(&self) -> &DisplayState {
        self.info.state()
    }

    async fn update(&mut self) {
        log_update_start(&*self);
        self.info.refresh(self.transport.as_ref(), parse).await;
    }
}

impl fmt::Debug for Bf3Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Bf3Source").field(&self.info.address()).finish()
    }
}
