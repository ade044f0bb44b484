//! Client for the external signing-helper subprocess (§6): a binary
//! request/response protocol over TCP or a Unix stream that supplies
//! signature timestamps and decrypts the `n`/`s` URL parameters YouTube
//! obfuscates its playback URLs with.
//!
//! The "errored -> reconnect before next call" pattern the helper's own
//! client historically used as a decorator is represented directly as an
//! explicit `invalid` flag on the connection (see DESIGN.md): no call here
//! recovers silently, every call checks the flag first.

use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UnixStream};

use crate::error::{ResolverError, ResolverResult};

#[derive(Debug, Clone)]
pub enum HelperAddress {
    Tcp(String, u16),
    Unix(PathBuf),
}

enum HelperConnection {
    Tcp(TcpStream),
    Unix(UnixStream),
}

impl HelperConnection {
    async fn connect(address: &HelperAddress) -> ResolverResult<Self> {
        match address {
            HelperAddress::Tcp(host, port) => {
                let stream = TcpStream::connect((host.as_str(), *port)).await?;
                Ok(Self::Tcp(stream))
            }
            HelperAddress::Unix(path) => {
                let stream = UnixStream::connect(path).await?;
                Ok(Self::Unix(stream))
            }
        }
    }

    async fn write_all(&mut self, buf: &[u8]) -> ResolverResult<()> {
        match self {
            Self::Tcp(s) => s.write_all(buf).await?,
            Self::Unix(s) => s.write_all(buf).await?,
        }
        Ok(())
    }

    async fn read_exact(&mut self, buf: &mut [u8]) -> ResolverResult<()> {
        match self {
            Self::Tcp(s) => s.read_exact(buf).await?,
            Self::Unix(s) => s.read_exact(buf).await?,
        };
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceUpdateResult {
    Updated,
    AlreadyUpToDate,
    Failed,
}

#[derive(Debug, Clone, Copy)]
pub struct PlayerStatus {
    pub has_player: bool,
    pub player_id: Option<u32>,
}

const OP_FORCE_UPDATE: u8 = 0x00;
const OP_DECRYPT_N: u8 = 0x01;
const OP_DECRYPT_S: u8 = 0x02;
const OP_SIGNATURE_TIMESTAMP: u8 = 0x03;
const OP_PLAYER_STATUS: u8 = 0x04;
const OP_PLAYER_UPDATE_AGE: u8 = 0x05;

/// Stateful client: one TCP or Unix connection, reconnected on demand
/// whenever the previous call left it marked invalid.
pub struct SigningHelperClient {
    address: HelperAddress,
    connection: Option<HelperConnection>,
    invalid: bool,
    next_request_id: u32,
    call_timeout: Duration,
}

impl SigningHelperClient {
    pub fn new(address: HelperAddress) -> Self {
        Self {
            address,
            connection: None,
            invalid: true,
            next_request_id: 0,
            call_timeout: Duration::from_secs(5),
        }
    }

    fn request_id(&mut self) -> u32 {
        let id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        id
    }

    async fn ensure_connected(&mut self) -> ResolverResult<()> {
        if self.connection.is_none() || self.invalid {
            self.connection = Some(HelperConnection::connect(&self.address).await?);
            self.invalid = false;
        }
        Ok(())
    }

    /// Send one request frame and read back its response payload, marking
    /// the connection invalid on any protocol or IO error so the next call
    /// reconnects first.
    async fn call(&mut self, opcode: u8, extra: &[u8]) -> ResolverResult<Vec<u8>> {
        self.ensure_connected().await?;
        let request_id = self.request_id();

        let result = tokio::time::timeout(self.call_timeout, async {
            let conn = self.connection.as_mut().expect("connected above");

            let mut request = Vec::with_capacity(5 + extra.len());
            request.push(opcode);
            request.extend_from_slice(&request_id.to_be_bytes());
            request.extend_from_slice(extra);
            conn.write_all(&request).await?;

            let mut header = [0u8; 8];
            conn.read_exact(&mut header).await?;
            let resp_request_id = u32::from_be_bytes(header[0..4].try_into().unwrap());
            let size = u32::from_be_bytes(header[4..8].try_into().unwrap()) as usize;

            if resp_request_id != request_id {
                return Err(ResolverError::SigningHelper(format!(
                    "response request id {resp_request_id} did not match request {request_id}"
                )));
            }

            if size == 0 {
                return Ok(Vec::new());
            }
            let mut payload = vec![0u8; size];
            conn.read_exact(&mut payload).await?;
            Ok(payload)
        })
        .await;

        match result {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(e)) => {
                self.invalid = true;
                Err(e)
            }
            Err(_) => {
                self.invalid = true;
                Err(ResolverError::SigningHelper("timed out".to_string()))
            }
        }
    }

    pub async fn force_update(&mut self) -> ResolverResult<ForceUpdateResult> {
        let payload = self.call(OP_FORCE_UPDATE, &[]).await?;
        let status = u16::from_be_bytes(payload[0..2].try_into().map_err(|_| {
            ResolverError::SigningHelper("force-update response too short".to_string())
        })?);
        match status {
            0xF44F => Ok(ForceUpdateResult::Updated),
            0xFFFF => Ok(ForceUpdateResult::AlreadyUpToDate),
            0x0000 => Ok(ForceUpdateResult::Failed),
            other => Err(ResolverError::SigningHelper(format!(
                "unknown force-update status 0x{other:04X}"
            ))),
        }
    }

    async fn decrypt(&mut self, opcode: u8, value: &str) -> ResolverResult<String> {
        let bytes = value.as_bytes();
        if bytes.len() >= u16::MAX as usize {
            return Err(ResolverError::SigningHelper(
                "value too long for the signing helper protocol".to_string(),
            ));
        }
        let mut extra = Vec::with_capacity(2 + bytes.len());
        extra.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
        extra.extend_from_slice(bytes);

        let payload = self.call(opcode, &extra).await?;
        if payload.len() < 2 {
            return Err(ResolverError::SigningHelper(
                "decrypt response too short".to_string(),
            ));
        }
        let size = u16::from_be_bytes(payload[0..2].try_into().unwrap()) as usize;
        if size == 0 {
            return Err(ResolverError::SigningHelper(
                "signing helper failed to decrypt value".to_string(),
            ));
        }
        String::from_utf8(payload[2..2 + size].to_vec())
            .map_err(|e| ResolverError::SigningHelper(e.to_string()))
    }

    pub async fn decrypt_nsig(&mut self, n: &str) -> ResolverResult<String> {
        self.decrypt(OP_DECRYPT_N, n).await
    }

    pub async fn decrypt_sig(&mut self, s: &str) -> ResolverResult<String> {
        self.decrypt(OP_DECRYPT_S, s).await
    }

    pub async fn signature_timestamp(&mut self) -> ResolverResult<Option<u64>> {
        let payload = self.call(OP_SIGNATURE_TIMESTAMP, &[]).await?;
        let timestamp = u64::from_be_bytes(payload[0..8].try_into().map_err(|_| {
            ResolverError::SigningHelper("signature-timestamp response too short".to_string())
        })?);
        Ok(if timestamp == 0 { None } else { Some(timestamp) })
    }

    pub async fn player_status(&mut self) -> ResolverResult<PlayerStatus> {
        let payload = self.call(OP_PLAYER_STATUS, &[]).await?;
        if payload.len() < 5 {
            return Err(ResolverError::SigningHelper(
                "player-status response too short".to_string(),
            ));
        }
        let has_player = payload[0] != 0;
        let player_id = u32::from_be_bytes(payload[1..5].try_into().unwrap());
        Ok(PlayerStatus {
            has_player,
            player_id: has_player.then_some(player_id),
        })
    }

    pub async fn player_update_age(&mut self) -> ResolverResult<Duration> {
        let payload = self.call(OP_PLAYER_UPDATE_AGE, &[]).await?;
        let seconds = u64::from_be_bytes(payload[0..8].try_into().map_err(|_| {
            ResolverError::SigningHelper("player-update-age response too short".to_string())
        })?);
        Ok(Duration::from_secs(seconds))
    }

    /// Force an update if the player backing the helper's signature logic
    /// is older than `max_age`.
    pub async fn update_if_stale(&mut self, max_age: Duration) -> ResolverResult<()> {
        if self.player_update_age().await? > max_age {
            self.force_update().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_a_signature_timestamp_over_a_loopback_socket() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut header = [0u8; 5];
            socket.read_exact(&mut header).await.unwrap();
            assert_eq!(header[0], OP_SIGNATURE_TIMESTAMP);
            let request_id = u32::from_be_bytes(header[1..5].try_into().unwrap());

            let mut response = Vec::new();
            response.extend_from_slice(&request_id.to_be_bytes());
            response.extend_from_slice(&8u32.to_be_bytes());
            response.extend_from_slice(&19780u64.to_be_bytes());
            socket.write_all(&response).await.unwrap();
        });

        let mut client = SigningHelperClient::new(HelperAddress::Tcp(
            addr.ip().to_string(),
            addr.port(),
        ));
        let timestamp = client.signature_timestamp().await.unwrap();
        assert_eq!(timestamp, Some(19780));
    }

    #[tokio::test]
    async fn mismatched_request_id_marks_connection_invalid() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut header = [0u8; 5];
            socket.read_exact(&mut header).await.unwrap();

            let mut response = Vec::new();
            response.extend_from_slice(&999u32.to_be_bytes());
            response.extend_from_slice(&0u32.to_be_bytes());
            socket.write_all(&response).await.unwrap();
        });

        let mut client = SigningHelperClient::new(HelperAddress::Tcp(
            addr.ip().to_string(),
            addr.port(),
        ));
        assert!(client.signature_timestamp().await.is_err());
        assert!(client.invalid);
    }
}
