//! Quake3 `getinfo` query over UDP

use super::{split_host_port, with_timeout, Transport, QUERY_TIMEOUT};
use crate::error::{TransportError, TransportResult};
use async_trait::async_trait;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::{lookup_host, UdpSocket};
use tracing::trace;

/// Out-of-band marker every connectionless Quake3 packet starts with
pub const OOB_PREFIX: [u8; 4] = [0xff, 0xff, 0xff, 0xff];

/// Largest reply we read; anything beyond is truncated
pub const MAX_RESPONSE_BYTES: usize = 1024;

/// Builds the `getinfo` request datagram
pub fn getinfo_request() -> Vec<u8> {
    let mut packet = Vec::with_capacity(OOB_PREFIX.len() + 8);
    packet.extend_from_slice(&OOB_PREFIX);
    packet.extend_from_slice(b"getinfo\n");
    packet
}

/// Sends one `getinfo` datagram and returns the first reply
#[derive(Debug, Clone)]
pub struct Quake3Transport {
    timeout: Duration,
}

impl Quake3Transport {
    pub fn new() -> Self {
        Self {
            timeout: QUERY_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn exchange(address: &str) -> TransportResult<Vec<u8>> {
        let (host, port) = split_host_port(address)?;
        let remote = lookup_host((host, port))
            .await?
            .next()
            .ok_or_else(|| TransportError::InvalidAddress(address.to_string()))?;

        let local = if remote.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(remote).await?;
        socket.send(&getinfo_request()).await?;

        let mut buf = vec![0u8; MAX_RESPONSE_BYTES];
        let len = socket.recv(&mut buf).await?;
        buf.truncate(len);
        Ok(buf)
    }
}

impl Default for Quake3Transport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for Quake3Transport {
    type Response = Vec<u8>;

    async fn query(&self, address: &str) -> TransportResult<Vec<u8>> {
        let reply = with_timeout(self.timeout, Self::exchange(address)).await?;
        trace!("{} bytes from {}", reply.len(), address);
        Ok(reply)
    }
}
