//! UDP transport used by the fragmented blob stream.

use crate::error::{Result, TransportError};
use crate::{Transport, RECEIVE_TIMEOUT};
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::net::UdpSocket;
use tokio::time::timeout;

/// Largest datagram the device emits: Ethernet MTU minus IPv4 and UDP
/// headers. Jumbo frames are not supported.
pub const MAX_DATAGRAM_SIZE: usize = 1500 - (20 + 8);

pub struct UdpTransport {
    socket: UdpSocket,
    /// Carry-over bytes for `recv_exactly` across datagram boundaries.
    pending: VecDeque<u8>,
}

impl UdpTransport {
    /// Bind the local receive port the device streams to.
    pub async fn bind(port: u16) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", port)).await?;
        tracing::debug!(port, "blob datagram port bound");
        Ok(Self {
            socket,
            pending: VecDeque::new(),
        })
    }

    /// Restrict traffic to one peer and enable `send_all`.
    pub async fn connect(&self, host: &str, port: u16) -> Result<()> {
        self.socket.connect((host, port)).await?;
        Ok(())
    }

    /// Actual local port, useful after binding port 0.
    pub fn local_port(&self) -> Result<u16> {
        Ok(self.socket.local_addr()?.port())
    }

    async fn recv_datagram(&mut self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        let read = timeout(RECEIVE_TIMEOUT, self.socket.recv(&mut buf))
            .await
            .map_err(|_| TransportError::ReceiveTimeout)??;
        buf.truncate(read);
        Ok(buf)
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send_all(&mut self, data: &[u8]) -> Result<()> {
        let sent = self
            .socket
            .send(data)
            .await
            .map_err(TransportError::SendFailure)?;
        if sent != data.len() {
            return Err(TransportError::SendFailure(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "datagram truncated on send",
            )));
        }
        Ok(())
    }

    async fn recv_up_to(&mut self, max: usize) -> Result<Vec<u8>> {
        let mut datagram = self.recv_datagram().await?;
        datagram.truncate(max);
        Ok(datagram)
    }

    async fn recv_exactly(&mut self, n: usize) -> Result<Vec<u8>> {
        while self.pending.len() < n {
            let datagram = self.recv_datagram().await?;
            if datagram.is_empty() {
                return Err(TransportError::closed(n, self.pending.len()));
            }
            self.pending.extend(datagram);
        }
        Ok(self.pending.drain(..n).collect())
    }

    async fn shutdown(&mut self) -> Result<()> {
        // UDP sockets have no shutdown handshake; dropping the socket on
        // close is enough. Pending carry-over is discarded.
        self.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn pair() -> (UdpTransport, UdpSocket) {
        let receiver = UdpTransport::bind(0).await.unwrap();
        let port = receiver.socket.local_addr().unwrap().port();
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.connect(("127.0.0.1", port)).await.unwrap();
        (receiver, sender)
    }

    #[tokio::test]
    async fn recv_up_to_returns_one_datagram() {
        let (mut receiver, sender) = pair().await;
        sender.send(b"fragment-0").await.unwrap();
        sender.send(b"fragment-1").await.unwrap();
        assert_eq!(receiver.recv_up_to(64).await.unwrap(), b"fragment-0");
        assert_eq!(receiver.recv_up_to(64).await.unwrap(), b"fragment-1");
    }

    #[tokio::test]
    async fn recv_exactly_spans_datagrams() {
        let (mut receiver, sender) = pair().await;
        sender.send(b"abcd").await.unwrap();
        sender.send(b"efgh").await.unwrap();
        assert_eq!(receiver.recv_exactly(6).await.unwrap(), b"abcdef");
        assert_eq!(receiver.recv_exactly(2).await.unwrap(), b"gh");
    }

    #[tokio::test(start_paused = true)]
    async fn recv_times_out_after_deadline() {
        let (mut receiver, _sender) = pair().await;
        let err = receiver.recv_up_to(16).await.unwrap_err();
        assert!(matches!(err, TransportError::ReceiveTimeout));
    }
}
