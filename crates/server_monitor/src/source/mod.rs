//! Status sources
//!
//! A source is one configured game server plus the wire format used to query
//! it. Every variant follows the same update lifecycle:
//!
//! 1. forget the previous raw response, fields and summary;
//! 2. run the transport;
//! 3. parse the raw response into [`NormalizedFields`];
//! 4. render the advertisement template, or fall back to `down`/`unknown`.
//!
//! [`ServerSource::update`] never fails. Transport and parse errors are logged
//! and turned into a degraded summary so a batch over many sources always
//! completes.

pub mod bf3;
pub mod bf3_tables;
pub mod game_monitor;
pub mod quake3;

use crate::error::{QueryError, TransportError, ValidationResult};
use crate::fields::{NormalizedFields, SourceKind, ADDRESS};
use crate::template::Template;
use crate::transport::Transport;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

pub use bf3::Bf3Source;
pub use game_monitor::GameMonitorSource;
pub use quake3::Quake3Source;

/// Terminal state of the most recent update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayState {
    /// Never updated, or the last update failed for a reason other than a timeout
    Unknown,
    /// The last query timed out
    Down,
    /// The last query succeeded; holds the rendered advertisement
    Parsed(String),
}

/// Common contract of every status source
#[async_trait]
pub trait ServerSource: Send + Sync + fmt::Debug {
    fn kind(&self) -> SourceKind;

    /// Configured `host:port`, the identity of this source
    fn address(&self) -> &str;

    /// Fields from the last successful update, `None` otherwise
    fn fields(&self) -> Option<&NormalizedFields>;

    fn state(&self) -> &DisplayState;

    /// Queries the server and recomputes every cached value
    async fn update(&mut self);

    /// Human-readable status line for the current state
    fn summary(&self) -> String {
        match self.state() {
            DisplayState::Unknown => format!("{} : unknown", self.address()),
            DisplayState::Down => format!("{} : down", self.address()),
            DisplayState::Parsed(text) => text.clone(),
        }
    }
}

/// State shared by all source variants
pub struct ServerInfo<R> {
    address: String,
    template: Arc<Template>,
    raw: Option<R>,
    fields: Option<NormalizedFields>,
    state: DisplayState,
}

impl<R: Send + fmt::Debug> ServerInfo<R> {
    pub fn new(address: impl Into<String>, template: Arc<Template>) -> Self {
        Self {
            address: address.into(),
            template,
            raw: None,
            fields: None,
            state: DisplayState::Unknown,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn raw_response(&self) -> Option<&R> {
        self.raw.as_ref()
    }

    pub fn fields(&self) -> Option<&NormalizedFields> {
        self.fields.as_ref()
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Runs one full update cycle against `transport`
    pub async fn refresh(
        &mut self,
        transport: &dyn Transport<Response = R>,
        parse: fn(&R) -> ValidationResult<NormalizedFields>,
    ) {
        self.raw = None;
        self.fields = None;
        self.state = DisplayState::Unknown;

        let outcome = transport.query(&self.address).await;
        self.complete(outcome, parse);
    }

    fn complete(
        &mut self,
        outcome: Result<R, TransportError>,
        parse: fn(&R) -> ValidationResult<NormalizedFields>,
    ) {
        let raw = match outcome {
            Ok(raw) => raw,
            Err(e) => return self.fail(e.into()),
        };

        trace!("raw response from {}: {:?}", self.address, raw);

        match parse(&raw) {
            Ok(mut fields) => {
                fields.insert(ADDRESS, self.address.clone());
                debug!("data for {}: {:?}", self.address, fields);
                self.state = DisplayState::Parsed(self.template.render(&fields));
                self.fields = Some(fields);
            }
            Err(e) => self.fail(e.into()),
        }
        self.raw = Some(raw);
    }

    /// Logs a failed update and picks the degraded state
    fn fail(&mut self, e: QueryError) {
        if e.is_timeout() {
            warn!("{} did not answer: {}", self.address, e);
            self.state = DisplayState::Down;
            return;
        }
        match e {
            QueryError::Transport(TransportError::NotModified) => {
                debug!("no change since last update for {}", self.address);
            }
            QueryError::Transport(e) => error!("Failed to query {}: {}", self.address, e),
            QueryError::Validation(e) => error!("Unexpected response from {}: {}", self.address, e),
        }
    }
}

impl<R> fmt::Debug for ServerInfo<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerInfo")
            .field("address", &self.address)
            .field("state", &self.state)
            .finish()
    }
}

/// Builds the source matching `kind`, sharing `transports`
pub fn build_source(
    kind: SourceKind,
    address: &str,
    template: Arc<Template>,
    transports: &crate::Transports,
) -> Box<dyn ServerSource> {
    match kind {
        SourceKind::GameMonitor => Box::new(GameMonitorSource::new(
            address,
            template,
            transports.game_monitor.clone(),
        )),
        SourceKind::Quake3 => Box::new(Quake3Source::new(address, template, transports.quake3.clone())),
        SourceKind::Bf3 => Box::new(Bf3Source::new(address, template, transports.bf3.clone())),
    }
}

/// Logs the start of an update the same way for every variant
pub(crate) fn log_update_start(source: &dyn ServerSource) {
    info!("Updating info for {:?}", source);
}
