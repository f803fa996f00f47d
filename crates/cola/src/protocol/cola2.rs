//! CoLa 2: session-oriented framing.
//!
//! Every packet is `02 02 02 02 | len32 BE | hop | NoC | session32 BE |
//! request16 BE | payload`, the length counting everything after the
//! length field. A session is opened with the `Ox` command carrying the
//! idle timeout and a client identifier; afterwards each exchange carries
//! the assigned session ID and a fresh request ID. Command bodies travel
//! without their leading `s`.

use crate::command::CoLaCommand;
use crate::error::{ProtocolError, Result};
use crate::protocol::{ProtocolHandler, MAGIC, MAX_FRAME_LEN};
use async_trait::async_trait;
use codec::endian;
use transport::Transport;

/// Longest accepted client identifier.
pub const MAX_CLIENT_ID_LEN: usize = 32;

/// Byte offsets inside a CoLa 2 packet.
const LENGTH_OFFSET: usize = 4;
const HEADER_LEN: usize = 16;

pub struct Cola2Handler {
    transport: Box<dyn Transport>,
    session_id: u32,
    request_id: u16,
    client_id: String,
}

impl Cola2Handler {
    pub fn new(transport: Box<dyn Transport>, client_id: &str) -> Self {
        let mut client_id = client_id.to_owned();
        client_id.truncate(MAX_CLIENT_ID_LEN);
        if client_id.is_empty() {
            client_id.push_str("client");
        }
        Cola2Handler {
            transport,
            session_id: 0,
            request_id: 0,
            client_id,
        }
    }

    /// Session ID assigned by the device, zero before `open_session`.
    pub fn session_id(&self) -> u32 {
        self.session_id
    }

    fn next_request_id(&mut self) -> u16 {
        self.request_id = self.request_id.wrapping_add(1);
        self.request_id
    }

    /// Magic, length placeholder, hop count, NoC, session ID, request ID.
    fn header(&mut self) -> (Vec<u8>, u16) {
        let request_id = self.next_request_id();
        let mut header = Vec::with_capacity(HEADER_LEN);
        header.extend_from_slice(&MAGIC);
        header.extend_from_slice(&[0u8; 4]);
        header.push(0); // hop count
        header.push(0); // NoC
        header.extend_from_slice(&self.session_id.to_be_bytes());
        header.extend_from_slice(&request_id.to_be_bytes());
        (header, request_id)
    }

    fn finalize_length(packet: &mut [u8]) {
        let len = (packet.len() - 8) as u32;
        packet[LENGTH_OFFSET..LENGTH_OFFSET + 4].copy_from_slice(&len.to_be_bytes());
    }

    /// Receive one packet: magic, length, then that many bytes.
    async fn read_frame(&mut self) -> Result<Vec<u8>> {
        let magic = self.transport.recv_exactly(4).await?;
        if magic != MAGIC {
            return Err(ProtocolError::InvalidMagic);
        }
        let len_bytes = self.transport.recv_exactly(4).await?;
        let len = endian::read_be::<u32>(&len_bytes, 0)?;
        if len as usize <= 8 || len > MAX_FRAME_LEN {
            return Err(ProtocolError::InvalidLength(len));
        }
        Ok(self.transport.recv_exactly(len as usize).await?)
    }

    /// Check the response header against this session and the request that
    /// was just sent, returning the payload past the header.
    fn check_reply(&self, frame: &[u8], request_id: u16) -> Result<Vec<u8>> {
        let session = endian::read_be::<u32>(frame, 2)?;
        if session != self.session_id {
            return Err(ProtocolError::UnexpectedSessionId {
                expected: self.session_id,
                actual: session,
            });
        }
        let reply_request = endian::read_be::<u16>(frame, 6)?;
        if reply_request != request_id {
            return Err(ProtocolError::UnexpectedRequestId {
                expected: request_id,
                actual: reply_request,
            });
        }
        Ok(frame[8..].to_vec())
    }

    async fn open_session_inner(&mut self, session_timeout_secs: u8) -> Result<()> {
        let (mut packet, _request_id) = self.header();
        packet.extend_from_slice(b"Ox");
        packet.push(session_timeout_secs);
        packet.extend_from_slice(&(self.client_id.len() as u16).to_be_bytes());
        packet.extend_from_slice(self.client_id.as_bytes());
        Self::finalize_length(&mut packet);

        self.transport.send_all(&packet).await?;

        let frame = self.read_frame().await?;
        self.session_id = endian::read_be::<u32>(&frame, 2)?;
        tracing::debug!(session_id = self.session_id, "CoLa 2 session opened");
        Ok(())
    }
}

#[async_trait]
impl ProtocolHandler for Cola2Handler {
    async fn open_session(&mut self, session_timeout_secs: u8) -> Result<()> {
        match self.open_session_inner(session_timeout_secs).await {
            Ok(()) => Ok(()),
            Err(err) => {
                // A failed handshake leaves the channel unusable.
                tracing::warn!(%err, "CoLa 2 session open failed, shutting transport down");
                let _ = self.transport.shutdown().await;
                Err(err)
            }
        }
    }

    async fn close_session(&mut self) -> Result<()> {
        // No close packet is defined; the device expires the session after
        // the negotiated idle timeout or when the transport goes away.
        self.session_id = 0;
        Ok(())
    }

    async fn send(&mut self, cmd: &CoLaCommand) -> Result<CoLaCommand> {
        let (mut packet, request_id) = self.header();
        // The "sXX" tag collapses to "XX" on the wire.
        packet.extend_from_slice(cmd.buffer().get(1..).unwrap_or_default());
        Self::finalize_length(&mut packet);

        self.transport.send_all(&packet).await?;

        let frame = self.read_frame().await?;
        let body = self.check_reply(&frame, request_id)?;

        let mut buffer = Vec::with_capacity(body.len() + 1);
        buffer.push(b's');
        buffer.extend_from_slice(&body);
        Ok(CoLaCommand::from_buffer(buffer))
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.transport.shutdown().await?;
        Ok(())
    }
}
