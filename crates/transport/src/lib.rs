//! Transport abstraction for the CoLa control channel and the blob data
//! stream.
//!
//! The device protocols need exactly three operations: send everything,
//! receive whatever arrives next (up to a bound), and receive an exact
//! count. Every receive observes a 5-second deadline; expiry surfaces as
//! [`TransportError::ReceiveTimeout`], a peer close during an exact read
//! as [`TransportError::ConnectionClosed`].

pub mod error;
pub mod tcp;
pub mod udp;

pub use error::{Result, TransportError};
pub use tcp::TcpTransport;
pub use udp::UdpTransport;

use async_trait::async_trait;
use std::time::Duration;

/// Receive deadline applied by both transport realizations.
pub const RECEIVE_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait Transport: Send {
    /// Send the whole buffer.
    async fn send_all(&mut self, data: &[u8]) -> Result<()>;

    /// Receive up to `max` bytes; a datagram transport returns one
    /// datagram, a stream transport whatever the socket has ready.
    async fn recv_up_to(&mut self, max: usize) -> Result<Vec<u8>>;

    /// Receive exactly `n` bytes, looping until the count is met or the
    /// peer closes.
    async fn recv_exactly(&mut self, n: usize) -> Result<Vec<u8>>;

    /// Shut the transport down; every in-flight receive fails afterwards.
    async fn shutdown(&mut self) -> Result<()>;
}
