//! Ordered collection of configured sources

use crate::source::ServerSource;
use thiserror::Error;

/// Why a single-source query was refused
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("{0:?} is not a number")]
    NotANumber(String),

    #[error("Server indexes go from 1 to {count}")]
    OutOfRange { index: i64, count: usize },
}

/// Holds the sources in configuration order.
///
/// That order defines the 1-based index used by single-source queries and the
/// order of every broadcast. Sources are queried one after the other.
#[derive(Debug, Default)]
pub struct ServerRegistry {
    sources: Vec<Box<dyn ServerSource>>,
}

impl ServerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: Box<dyn ServerSource>) {
        self.sources.push(source);
    }

    pub fn extend(&mut self, sources: impl IntoIterator<Item = Box<dyn ServerSource>>) {
        self.sources.extend(sources);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ServerSource> {
        self.sources.iter().map(|s| s.as_ref())
    }

    /// Updates every source in order and returns one summary per source
    pub async fn update_all(&mut self) -> Vec<String> {
        let mut summaries = Vec::with_capacity(self.sources.len());
        for source in &mut self.sources {
            source.update().await;
            summaries.push(source.summary());
        }
        summaries
    }

    /// Checks a user-supplied 1-based index without touching any source
    pub fn resolve_index(&self, raw: &str) -> Result<usize, IndexError> {
        let index = parse_index(raw.trim()).ok_or_else(|| IndexError::NotANumber(raw.to_string()))?;
        if index < 1 || index as u64 > self.sources.len() as u64 {
            return Err(IndexError::OutOfRange {
                index,
                count: self.sources.len(),
            });
        }
        Ok(index as usize - 1)
    }

    /// Updates a single source picked by its 1-based position.
    ///
    /// # Arguments
    ///
    /// * `raw` - The index as typed by a player; surrounding whitespace is ignored
    ///
    /// # Returns
    ///
    /// The refreshed summary of that source, or an [`IndexError`] when `raw` is
    /// not an integer or falls outside `1..=len()`. No source is queried on error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn demo(registry: &mut server_monitor::ServerRegistry) {
    /// match registry.update_one("2").await {
    ///     Ok(summary) => println!("{}", summary),
    ///     Err(e) => println!("invalid server index. {}", e),
    /// }
    /// # }
    /// ```
    pub async fn update_one(&mut self, raw: &str) -> Result<String, IndexError> {
        let position = self.resolve_index(raw)?;
        let source = &mut self.sources[position];
        source.update().await;
        Ok(source.summary())
    }
}

/// Parses an optionally signed run of digits. Values beyond `i64` saturate so
/// they still read as out of range rather than as text.
fn parse_index(text: &str) -> Option<i64> {
    if let Ok(index) = text.parse::<i64>() {
        return Some(index);
    }
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(if negative { i64::MIN } else { i64::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::source::testing::{template, CannedTransport};
    use crate::source::{GameMonitorSource, Quake3Source};
    use std::sync::Arc;

    fn quake3(address: &str, transport: Arc<CannedTransport<Vec<u8>>>) -> Box<dyn ServerSource> {
        Box::new(Quake3Source::new(
            address,
            template("{address} : {map} {players}/{max_players} {name}"),
            transport,
        ))
    }

    fn healthy() -> Arc<CannedTransport<Vec<u8>>> {
        CannedTransport::new(|| {
            Ok(b"\xff\xff\xff\xffinfoResponse\n\\mapname\\ut4_casa\\clients\\2\\sv_maxclients\\12\\hostname\\Test".to_vec())
        })
    }

    #[tokio::test]
    async fn test_update_all_keeps_order_and_failures() {
        let mut registry = ServerRegistry::new();
        registry.push(quake3("1.1.1.1:27960", healthy()));
        registry.push(quake3(
            "2.2.2.2:27960",
            CannedTransport::new(|| Err(TransportError::Timeout(3))),
        ));
        registry.push(Box::new(GameMonitorSource::new(
            "3.3.3.3:27960",
            template("{address} : {players}/{max_players} {name}"),
            CannedTransport::new(|| Ok(r#"={"error":0,"player":15,"maxplayer":20,"name":"X"}"#.to_string())),
        )));

        let summaries = registry.update_all().await;
        assert_eq!(
            summaries,
            vec![
                "1.1.1.1:27960 : ut4_casa 2/12 Test".to_string(),
                "2.2.2.2:27960 : down".to_string(),
                "3.3.3.3:27960 : 15/20 X".to_string(),
            ]
        );
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn test_update_one_by_index() {
        let first = healthy();
        let second = healthy();
        let mut registry = ServerRegistry::new();
        registry.push(quake3("1.1.1.1:27960", first.clone()));
        registry.push(quake3("2.2.2.2:27960", second.clone()));

        let summary = registry.update_one("2").await.unwrap();
        assert_eq!(summary, "2.2.2.2:27960 : ut4_casa 2/12 Test");
        assert_eq!(first.call_count(), 0);
        assert_eq!(second.call_count(), 1);
    }

    #[tokio::test]
    async fn test_out_of_range_touches_nothing() {
        let transport = healthy();
        let mut registry = ServerRegistry::new();
        registry.push(quake3("1.1.1.1:27960", transport.clone()));
        registry.push(quake3("2.2.2.2:27960", transport.clone()));

        for raw in ["0", "3", "-1"] {
            let err = registry.update_one(raw).await.unwrap_err();
            assert!(matches!(err, IndexError::OutOfRange { count: 2, .. }));
            assert_eq!(err.to_string(), "Server indexes go from 1 to 2");
        }
        assert!(matches!(
            registry.update_one("two").await,
            Err(IndexError::NotANumber(_))
        ));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_huge_index_is_out_of_range() {
        let transport = healthy();
        let mut registry = ServerRegistry::new();
        registry.push(quake3("1.1.1.1:27960", transport.clone()));

        for raw in ["99999999999999999999", "-99999999999999999999", " +99999999999999999999 "] {
            let err = registry.update_one(raw).await.unwrap_err();
            assert_eq!(err.to_string(), "Server indexes go from 1 to 1");
        }
        for raw in ["-", "+", "9x9", "1.0"] {
            assert!(matches!(
                registry.update_one(raw).await,
                Err(IndexError::NotANumber(_))
            ));
        }
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let mut registry = ServerRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.update_all().await.is_empty());
        assert!(registry.update_one("1").await.is_err());
    }
}
