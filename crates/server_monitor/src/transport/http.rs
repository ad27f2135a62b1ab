//! HTTP transport for the game-monitor.com status service

use super::{Transport, QUERY_TIMEOUT};
use crate::error::{TransportError, TransportResult};
use async_trait::async_trait;
use flate2::read::GzDecoder;
use reqwest::header::{ACCEPT_ENCODING, CONTENT_ENCODING, USER_AGENT as USER_AGENT_HEADER};
use reqwest::StatusCode;
use std::io::Read;
use tracing::debug;

/// Sent with every request so the service can identify us
pub const USER_AGENT: &str = concat!("servermonitor plugin/", env!("CARGO_PKG_VERSION"));

/// Where game-monitor.com serves its per-server status documents
pub const DEFAULT_BASE_URL: &str = "http://module.game-monitor.com/";

/// Fetches `<base_url><address>/data/server.js`
#[derive(Debug, Clone)]
pub struct GameMonitorTransport {
    client: reqwest::Client,
    base_url: String,
}

impl GameMonitorTransport {
    pub fn new() -> TransportResult<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the transport at another host, e.g. a local test server
    pub fn with_base_url(base_url: impl Into<String>) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(QUERY_TIMEOUT)
            .build()?;
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self { client, base_url })
    }

    /// Status document URL for `address`
    pub fn url_for(&self, address: &str) -> String {
        format!("{}{}/data/server.js", self.base_url, address)
    }
}

#[async_trait]
impl Transport for GameMonitorTransport {
    type Response = String;

    async fn query(&self, address: &str) -> TransportResult<String> {
        let url = self.url_for(address);
        debug!("Downloading json from {}", url);
        http_get(&self.client, &url).await
    }
}

/// Returns the document served at `url`, gunzipping it when the server
/// compressed the body.
///
/// A 304 response becomes [`TransportError::NotModified`]; any other
/// non-success status is a [`TransportError::Status`].
pub async fn http_get(client: &reqwest::Client, url: &str) -> TransportResult<String> {
    let response = client
        .get(url)
        .header(USER_AGENT_HEADER, USER_AGENT)
        .header(ACCEPT_ENCODING, "gzip")
        .send()
        .await?;

    let status = response.status();
    if status == StatusCode::NOT_MODIFIED {
        return Err(TransportError::NotModified);
    }
    if !status.is_success() {
        return Err(TransportError::Status(status.as_u16()));
    }

    let gzipped = response
        .headers()
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("gzip"))
        .unwrap_or(false);

    let body = response.bytes().await?;
    let body = if gzipped { gunzip(&body)? } else { body.to_vec() };

    Ok(String::from_utf8_lossy(&body).into_owned())
}

fn gunzip(data: &[u8]) -> TransportResult<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(TransportError::Decompress)?;
    Ok(decompressed)
}
