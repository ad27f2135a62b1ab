//! Frostbite RCON protocol over TCP
//!
//! Every packet is little-endian and length-prefixed:
//!
//! ```text
//! header: u32   bit 31 = originated on server, bit 30 = is response,
//!               bits 0..29 = sequence number
//! size:   u32   total packet size, header included
//! count:  u32   number of words
//! words:  count x (u32 length, bytes, 0x00)
//! ```
//!
//! `serverInfo` needs no authentication, so a query is a single
//! request/response exchange on a fresh connection.

use super::{split_host_port, with_timeout, Transport, QUERY_TIMEOUT};
use crate::error::{TransportError, TransportResult};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace};

/// Size of the fixed header: sequence, size and word count
pub const HEADER_SIZE: usize = 12;

/// Frostbite servers refuse packets larger than this
pub const MAX_PACKET_SIZE: usize = 16384;

const FROM_SERVER: u32 = 0x8000_0000;
const IS_RESPONSE: u32 = 0x4000_0000;
const SEQUENCE_MASK: u32 = 0x3fff_ffff;

/// A decoded RCON packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub from_server: bool,
    pub is_response: bool,
    pub sequence: u32,
    pub words: Vec<String>,
}

impl Packet {
    /// A request originated by us
    pub fn client_request(sequence: u32, words: &[&str]) -> Self {
        Self {
            from_server: false,
            is_response: false,
            sequence: sequence & SEQUENCE_MASK,
            words: words.iter().map(|w| w.to_string()).collect(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut header = self.sequence & SEQUENCE_MASK;
        if self.from_server {
            header |= FROM_SERVER;
        }
        if self.is_response {
            header |= IS_RESPONSE;
        }

        let words_size: usize = self.words.iter().map(|w| 4 + w.len() + 1).sum();
        let total = HEADER_SIZE + words_size;

        let mut buffer = Vec::with_capacity(total);
        buffer.extend_from_slice(&header.to_le_bytes());
        buffer.extend_from_slice(&(total as u32).to_le_bytes());
        buffer.extend_from_slice(&(self.words.len() as u32).to_le_bytes());
        for word in &self.words {
            buffer.extend_from_slice(&(word.len() as u32).to_le_bytes());
            buffer.extend_from_slice(word.as_bytes());
            buffer.push(0);
        }
        buffer
    }

    /// Decodes one complete packet
    pub fn decode(data: &[u8]) -> TransportResult<Self> {
        if data.len() < HEADER_SIZE {
            return Err(protocol("packet shorter than header"));
        }

        let header = read_u32(data, 0)?;
        let size = read_u32(data, 4)? as usize;
        let count = read_u32(data, 8)? as usize;
        if size != data.len() {
            return Err(protocol(format!(
                "packet size {} does not match {} bytes received",
                size,
                data.len()
            )));
        }

        let mut words = Vec::with_capacity(count.min(64));
        let mut offset = HEADER_SIZE;
        for _ in 0..count {
            let len = read_u32(data, offset)? as usize;
            offset += 4;
            let end = offset
                .checked_add(len)
                .filter(|end| *end < data.len())
                .ok_or_else(|| protocol("word runs past end of packet"))?;
            if data[end] != 0 {
                return Err(protocol("word is not NUL terminated"));
            }
            words.push(String::from_utf8_lossy(&data[offset..end]).into_owned());
            offset = end + 1;
        }
        if offset != data.len() {
            return Err(protocol("trailing bytes after last word"));
        }

        Ok(Self {
            from_server: header & FROM_SERVER != 0,
            is_response: header & IS_RESPONSE != 0,
            sequence: header & SEQUENCE_MASK,
            words,
        })
    }
}

fn read_u32(data: &[u8], offset: usize) -> TransportResult<u32> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| protocol("truncated integer"))
}

fn protocol(message: impl Into<String>) -> TransportError {
    TransportError::Protocol(message.into())
}

/// A TCP connection speaking the RCON packet framing
pub struct FrostbiteConnection {
    stream: TcpStream,
    sequence: u32,
}

impl FrostbiteConnection {
    pub async fn connect(host: &str, port: u16) -> TransportResult<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        Ok(Self { stream, sequence: 0 })
    }

    async fn send(&mut self, packet: &Packet) -> TransportResult<()> {
        self.stream.write_all(&packet.encode()).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn receive(&mut self) -> TransportResult<Packet> {
        let mut header = [0u8; HEADER_SIZE];
        self.stream.read_exact(&mut header).await?;

        let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
        if !(HEADER_SIZE..=MAX_PACKET_SIZE).contains(&size) {
            return Err(protocol(format!("invalid packet size {}", size)));
        }

        let mut data = vec![0u8; size];
        data[..HEADER_SIZE].copy_from_slice(&header);
        self.stream.read_exact(&mut data[HEADER_SIZE..]).await?;
        Packet::decode(&data)
    }

    /// Sends `words` as a request and returns the words of the matching
    /// response, status word included
    pub async fn send_request(&mut self, words: &[&str]) -> TransportResult<Vec<String>> {
        let request = Packet::client_request(self.sequence, words);
        self.sequence = (self.sequence + 1) & SEQUENCE_MASK;
        self.send(&request).await?;

        loop {
            let packet = self.receive().await?;
            if packet.is_response && packet.sequence == request.sequence {
                return Ok(packet.words);
            }
            // Server-originated events may interleave with our reply
            trace!("Skipping unrelated packet {:?}", packet);
        }
    }

    pub async fn close(&mut self) -> TransportResult<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

/// Queries `serverInfo` and returns the words following the `OK` status
#[derive(Debug, Clone)]
pub struct FrostbiteTransport {
    timeout: Duration,
}

impl FrostbiteTransport {
    pub fn new() -> Self {
        Self {
            timeout: QUERY_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn server_info(&self, address: &str) -> TransportResult<Vec<String>> {
        let (host, port) = split_host_port(address)?;
        let mut connection = with_timeout(self.timeout, FrostbiteConnection::connect(host, port)).await?;

        let result = with_timeout(self.timeout, connection.send_request(&["serverInfo"])).await;

        // Closed on every path; the stream is also dropped when we return
        if let Err(e) = connection.close().await {
            debug!("Error closing connection to {}: {}", address, e);
        }

        let mut words = result?;
        match words.first().map(String::as_str) {
            Some("OK") => {
                words.remove(0);
                Ok(words)
            }
            Some(status) => Err(protocol(format!("serverInfo failed: {}", status))),
            None => Err(protocol("empty response")),
        }
    }
}

impl Default for FrostbiteTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for FrostbiteTransport {
    type Response = Vec<String>;

    async fn query(&self, address: &str) -> TransportResult<Vec<String>> {
        self.server_info(address).await
    }
}
