//! CoLa B: stream framing with a one-byte XOR checksum.
//!
//! Request and response frames share the layout
//! `02 02 02 02 | len32 BE | body | xor(body)` where the length counts the
//! body only. Receiving scans byte-wise for four consecutive `0x02` so a
//! desynchronized stream recovers at the next frame boundary.

use crate::command::CoLaCommand;
use crate::error::{ProtocolError, Result};
use crate::protocol::{ProtocolHandler, MAGIC, MAX_FRAME_LEN};
use async_trait::async_trait;
use codec::endian;
use transport::Transport;

pub struct ColaBHandler {
    transport: Box<dyn Transport>,
}

impl ColaBHandler {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        ColaBHandler { transport }
    }

    fn checksum(body: &[u8]) -> u8 {
        body.iter().fold(0, |acc, byte| acc ^ byte)
    }

    fn frame(cmd: &CoLaCommand) -> Vec<u8> {
        let body = cmd.buffer();
        let mut frame = Vec::with_capacity(body.len() + 9);
        frame.extend_from_slice(&MAGIC);
        frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
        frame.extend_from_slice(body);
        frame.push(Self::checksum(body));
        frame
    }

    /// Read one byte at a time until four consecutive `0x02` are seen.
    async fn sync_to_magic(&mut self) -> Result<()> {
        let mut seen = 0usize;
        while seen < MAGIC.len() {
            let byte = self.transport.recv_exactly(1).await?;
            if byte[0] == 0x02 {
                seen += 1;
            } else {
                seen = 0;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ProtocolHandler for ColaBHandler {
    async fn open_session(&mut self, _session_timeout_secs: u8) -> Result<()> {
        // CoLa B carries no session state.
        Ok(())
    }

    async fn close_session(&mut self) -> Result<()> {
        Ok(())
    }

    async fn send(&mut self, cmd: &CoLaCommand) -> Result<CoLaCommand> {
        self.transport.send_all(&Self::frame(cmd)).await?;

        self.sync_to_magic().await?;
        let len_bytes = self.transport.recv_exactly(4).await?;
        let len = endian::read_be::<u32>(&len_bytes, 0)?;
        if len > MAX_FRAME_LEN {
            return Err(ProtocolError::InvalidLength(len));
        }

        // Body plus the trailing checksum byte.
        let mut payload = self.transport.recv_exactly(len as usize + 1).await?;
        let actual = match payload.pop() {
            Some(byte) => byte,
            None => return Err(ProtocolError::InvalidLength(len)),
        };
        let expected = Self::checksum(&payload);
        if actual != expected {
            return Err(ProtocolError::ChecksumMismatch { expected, actual });
        }

        Ok(CoLaCommand::from_buffer(payload))
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.transport.shutdown().await?;
        Ok(())
    }
}
