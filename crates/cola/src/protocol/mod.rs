//! Framing handlers for the two supported CoLa variants.
//!
//! Both implement the same three-operation contract; the control object
//! holds one of them by value through [`ProtocolVariant`].

pub mod cola2;
pub mod cola_b;

pub use cola2::Cola2Handler;
pub use cola_b::ColaBHandler;

use crate::command::CoLaCommand;
use crate::error::Result;
use async_trait::async_trait;

/// Framing start sentinel shared by both variants and the blob stream.
pub const MAGIC: [u8; 4] = [0x02, 0x02, 0x02, 0x02];

/// Upper bound on a command frame body; anything larger is a framing
/// error, not a plausible response.
pub const MAX_FRAME_LEN: u32 = 1024 * 1024;

#[async_trait]
pub trait ProtocolHandler: Send {
    /// Establish a session where the variant has one; CoLa B has no
    /// session state and succeeds immediately.
    async fn open_session(&mut self, session_timeout_secs: u8) -> Result<()>;

    /// Tear down session state. Neither variant sends a close packet; the
    /// device drops a CoLa 2 session when the transport goes away or the
    /// idle timeout expires.
    async fn close_session(&mut self) -> Result<()>;

    /// Frame and send `cmd`, then receive and unframe the response.
    async fn send(&mut self, cmd: &CoLaCommand) -> Result<CoLaCommand>;

    /// Shut down the owned transport.
    async fn shutdown(&mut self) -> Result<()>;
}

/// The two framing variants as a tagged value.
pub enum ProtocolVariant {
    ColaB(ColaBHandler),
    Cola2(Cola2Handler),
}

#[async_trait]
impl ProtocolHandler for ProtocolVariant {
    async fn open_session(&mut self, session_timeout_secs: u8) -> Result<()> {
        match self {
            ProtocolVariant::ColaB(handler) => handler.open_session(session_timeout_secs).await,
            ProtocolVariant::Cola2(handler) => handler.open_session(session_timeout_secs).await,
        }
    }

    async fn close_session(&mut self) -> Result<()> {
        match self {
            ProtocolVariant::ColaB(handler) => handler.close_session().await,
            ProtocolVariant::Cola2(handler) => handler.close_session().await,
        }
    }

    async fn send(&mut self, cmd: &CoLaCommand) -> Result<CoLaCommand> {
        match self {
            ProtocolVariant::ColaB(handler) => handler.send(cmd).await,
            ProtocolVariant::Cola2(handler) => handler.send(cmd).await,
        }
    }

    async fn shutdown(&mut self) -> Result<()> {
        match self {
            ProtocolVariant::ColaB(handler) => handler.shutdown().await,
            ProtocolVariant::Cola2(handler) => handler.shutdown().await,
        }
    }
}
