//! Status read directly from Quake3-engine servers

use super::{log_update_start, DisplayState, ServerInfo, ServerSource};
use crate::error::{ValidationError, ValidationResult};
use crate::fields::{NormalizedFields, SourceKind, MAP, MAX_PLAYERS, NAME, PLAYERS};
use crate::template::Template;
use crate::transport::Transport;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Every valid `getinfo` reply starts with this
pub const INFO_RESPONSE_SIGNATURE: &[u8] = b"\xff\xff\xff\xffinfoResponse\n";

/// Server keys copied to the canonical vocabulary
const ALIASES: [(&str, &str); 4] = [
    ("mapname", MAP),
    ("clients", PLAYERS),
    ("sv_maxclients", MAX_PLAYERS),
    ("hostname", NAME),
];

/// A Quake3-engine server queried with `getinfo` over UDP
pub struct Quake3Source {
    info: ServerInfo<Vec<u8>>,
    transport: Arc<dyn Transport<Response = Vec<u8>>>,
}

impl Quake3Source {
    pub fn new(
        address: impl Into<String>,
        template: Arc<Template>,
        transport: Arc<dyn Transport<Response = Vec<u8>>>,
    ) -> Self {
        Self {
            info: ServerInfo::new(address, template),
            transport,
        }
    }

    pub fn raw_response(&self) -> Option<&Vec<u8>> {
        self.info.raw_response()
    }
}

/// Parses an `infoResponse` datagram.
///
/// The info string is a run of `\key\value` pairs. Every pair is kept
/// verbatim, the last occurrence of a key wins, and the well-known keys are
/// also exposed under their canonical names.
pub fn parse(raw: &Vec<u8>) -> ValidationResult<NormalizedFields> {
    let body = raw
        .strip_prefix(INFO_RESPONSE_SIGNATURE)
        .ok_or_else(|| ValidationError::BadSignature(String::from_utf8_lossy(raw).into_owned()))?;
    // Info strings are Latin-1; each byte maps to the code point of equal value
    let body: String = body.iter().map(|&b| b as char).collect();

    let mut fields: NormalizedFields = info_pairs(&body).collect();
    for (server_key, canonical) in ALIASES {
        if let Some(value) = fields.get(server_key).map(str::to_string) {
            fields.insert(canonical, value);
        }
    }
    Ok(fields)
}

/// Splits `\k1\v1\k2\v2...` into pairs. Text before the first backslash and
/// a trailing key with no value are ignored.
fn info_pairs(info: &str) -> impl Iterator<Item = (&str, &str)> {
    let mut tokens = info.split('\\').skip(1);
    std::iter::from_fn(move || {
        let key = tokens.next()?;
        let value = tokens.next()?;
        Some((key, value))
    })
}

#[async_trait]
impl ServerSource for Quake3Source {
    fn kind(&self) -> SourceKind {
        SourceKind::Quake3
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

impl fmt::Debug for Quake3Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Quake3Source").field(&self.info.address()).finish()
    }
}
