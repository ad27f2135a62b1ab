//! One-shot network exchanges with remote game servers.
//!
//! Each transport performs a single request/response against one address and
//! returns the raw payload. Transports hold no per-query state, so a single
//! instance may be shared by every source of the same kind. Sources take their
//! transport as a trait object, which lets tests substitute canned responses.

pub mod frostbite;
pub mod http;
pub mod udp;

use crate::error::{TransportError, TransportResult};
use async_trait::async_trait;
use std::time::Duration;

pub use frostbite::FrostbiteTransport;
pub use http::GameMonitorTransport;
pub use udp::Quake3Transport;

/// Fixed per-call timeout for every transport, in seconds
pub const QUERY_TIMEOUT_SECS: u64 = 3;

/// Fixed per-call timeout for every transport
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(QUERY_TIMEOUT_SECS);

/// A single request/response exchange with the server at `address`
#[async_trait]
pub trait Transport: Send + Sync {
    /// Payload handed to the source's parser
    type Response: Send + std::fmt::Debug;

    async fn query(&self, address: &str) -> TransportResult<Self::Response>;
}

/// Splits a configured `host:port` address.
///
/// The split happens on the last colon so that hostnames survive intact.
pub fn split_host_port(address: &str) -> TransportResult<(&str, u16)> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| TransportError::InvalidAddress(address.to_string()))?;
    if host.is_empty() {
        return Err(TransportError::InvalidAddress(address.to_string()));
    }
    let port = port
        .parse::<u16>()
        .map_err(|_| TransportError::InvalidAddress(address.to_string()))?;
    Ok((host, port))
}

/// Runs `fut`, mapping expiry of `limit` to [`TransportError::Timeout`]
pub(crate) async fn with_timeout<T, F>(limit: Duration, fut: F) -> TransportResult<T>
where
    F: std::future::Future<Output = TransportResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(limit.as_secs())),
    }
}
