//! Status read from the game-monitor.com web service

use super::{log_update_start, DisplayState, ServerInfo, ServerSource};
use crate::error::{ValidationError, ValidationResult};
use crate::fields::{NormalizedFields, SourceKind, MAX_PLAYERS, NAME, PLAYERS};
use crate::template::Template;
use crate::transport::Transport;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A server whose status comes from `module.game-monitor.com`.
///
/// The service never reports the current map, so `{map}` always renders as `?`.
pub struct GameMonitorSource {
    info: ServerInfo<String>,
    transport: Arc<dyn Transport<Response = String>>,
}

impl GameMonitorSource {
    pub fn new(
        address: impl Into<String>,
        template: Arc<Template>,
        transport: Arc<dyn Transport<Response = String>>,
    ) -> Self {
        Self {
            info: ServerInfo::new(address, template),
            transport,
        }
    }

    /// Body of the last response, `None` until one arrives
    pub fn raw_response(&self) -> Option<&String> {
        self.info.raw_response()
    }
}

/// Decodes a `=<json>` document.
///
/// The object must carry an `error` key equal to zero. Fields the document
/// lacks are left out and render as `?`.
pub fn parse(raw: &String) -> ValidationResult<NormalizedFields> {
    let json = raw
        .strip_prefix('=')
        .ok_or_else(|| ValidationError::MissingPrefix(raw.clone()))?;

    let value: Value = serde_json::from_str(json)?;
    let object = value.as_object().ok_or(ValidationError::NotAnObject)?;

    match object.get("error") {
        None => return Err(ValidationError::MissingErrorKey(value.to_string())),
        Some(code) if !is_zero(code) => return Err(ValidationError::RemoteError(code.to_string())),
        Some(_) => {}
    }

    let mut fields = NormalizedFields::new();
    for (json_key, field) in [("player", PLAYERS), ("maxplayer", MAX_PLAYERS), ("name", NAME)] {
        if let Some(text) = object.get(json_key).and_then(scalar_text) {
            fields.insert(field, text);
        }
    }
    Ok(fields)
}

fn is_zero(code: &Value) -> bool {
    match code {
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[async_trait]
impl ServerSource for GameMonitorSource {
    fn kind(&self) -> SourceKind {
        SourceKind::GameMonitor
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

impl fmt::Debug for GameMonitorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GameMonitorSource").field(&self.info.address()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::source::testing::{template, CannedTransport};

    const NOMINAL: &str = r#"={"ip":"1.2.3.4","port":27960,"player":15,"maxplayer":20,"name":"test server 1.2.3.4","premium":
        "0","link":"http://www.game-monitor.com/cod4_GameServer/1.2.3.4:27960/test_server.html","error":0,"query_time":
        "136ms"}"#;

    fn source(outcome: impl FnMut() -> Result<String, TransportError> + Send + 'static) -> GameMonitorSource {
        GameMonitorSource::new(
            "1.2.3.4:27960",
            template("{address} : {players}/{max_players} {name}"),
            CannedTransport::new(outcome),
        )
    }

    #[tokio::test]
    async fn test_nominal() {
        let mut sut = source(|| Ok(NOMINAL.to_string()));
        sut.update().await;

        let fields = sut.fields().expect("fields after nominal update");
        assert_eq!(fields.get("players"), Some("15"));
        assert_eq!(fields.get("max_players"), Some("20"));
        assert_eq!(fields.get("name"), Some("test server 1.2.3.4"));
        assert_eq!(fields.get("address"), Some("1.2.3.4:27960"));
        assert_eq!(sut.summary(), "1.2.3.4:27960 : 15/20 test server 1.2.3.4");
        assert_eq!(sut.raw_response().map(String::as_str), Some(NOMINAL));
    }

    #[tokio::test]
    async fn test_minimal_payload() {
        let mut sut = source(|| Ok(r#"={"error":0,"player":15,"maxplayer":20,"name":"X"}"#.to_string()));
        sut.update().await;
        assert_eq!(sut.summary(), "1.2.3.4:27960 : 15/20 X");
    }

    #[tokio::test]
    async fn test_map_renders_as_question_mark() {
        let mut sut = GameMonitorSource::new(
            "1.2.3.4:27960",
            template("{address} : {map} {players}/{max_players}"),
            CannedTransport::new(|| Ok(r#"={"error":0,"player":1}"#.to_string())),
        );
        sut.update().await;
        assert_eq!(sut.summary(), "1.2.3.4:27960 : ? 1/?");
    }

    #[tokio::test]
    async fn test_timeout_renders_unknown() {
        // The web service reports slowness as a plain transport failure
        let mut sut = source(|| {
            Err(TransportError::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out")))
        });
        sut.update().await;
        assert!(sut.fields().is_none());
        assert_eq!(sut.summary(), "1.2.3.4:27960 : unknown");
    }

    #[tokio::test]
    async fn test_not_modified_renders_unknown() {
        let mut sut = source(|| Err(TransportError::NotModified));
        sut.update().await;
        assert!(sut.fields().is_none());
        assert_eq!(sut.summary(), "1.2.3.4:27960 : unknown");
    }

    #[tokio::test]
    async fn test_junk_response() {
        let mut sut = source(|| Ok("f00".to_string()));
        sut.update().await;
        assert!(sut.fields().is_none());
        assert_eq!(sut.summary(), "1.2.3.4:27960 : unknown");
    }

    #[test]
    fn test_parse_rejections() {
        assert!(matches!(parse(&"f00".to_string()), Err(ValidationError::MissingPrefix(_))));
        assert!(matches!(parse(&"={".to_string()), Err(ValidationError::Json(_))));
        assert!(matches!(parse(&"=[1]".to_string()), Err(ValidationError::NotAnObject)));
        assert!(matches!(
            parse(&r#"={"player":1}"#.to_string()),
            Err(ValidationError::MissingErrorKey(_))
        ));
        assert!(matches!(
            parse(&r#"={"error":1}"#.to_string()),
            Err(ValidationError::RemoteError(_))
        ));
    }

    #[tokio::test]
    async fn test_update_clears_previous_success() {
        let mut responses = vec![Ok("f00".to_string()), Ok(NOMINAL.to_string())];
        let mut sut = source(move || responses.pop().unwrap_or(Ok(String::new())));

        sut.update().await;
        assert!(sut.fields().is_some());

        sut.update().await;
        assert!(sut.fields().is_none());
        assert_eq!(sut.raw_response().map(String::as_str), Some("f00"));
        assert_eq!(sut.summary(), "1.2.3.4:27960 : unknown");
    }
}
