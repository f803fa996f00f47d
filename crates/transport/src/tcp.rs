//! TCP transport used by the CoLa control channel and the blob stream.

use crate::error::{Result, TransportError};
use crate::{Transport, RECEIVE_TIMEOUT};
use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Connect to `host:port`.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        tracing::debug!(host, port, "control channel connected");
        Ok(Self { stream })
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send_all(&mut self, data: &[u8]) -> Result<()> {
        self.stream
            .write_all(data)
            .await
            .map_err(TransportError::SendFailure)
    }

    async fn recv_up_to(&mut self, max: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; max];
        let read = timeout(RECEIVE_TIMEOUT, self.stream.read(&mut buf))
            .await
            .map_err(|_| TransportError::ReceiveTimeout)??;
        if read == 0 {
            return Err(TransportError::closed(1, 0));
        }
        buf.truncate(read);
        Ok(buf)
    }

    async fn recv_exactly(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            let read = timeout(RECEIVE_TIMEOUT, self.stream.read(&mut buf[filled..]))
                .await
                .map_err(|_| TransportError::ReceiveTimeout)??;
            if read == 0 {
                return Err(TransportError::closed(n, filled));
            }
            filled += read;
        }
        Ok(buf)
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
