//! Thin façade over a framing handler.

use crate::command::{CoLaCommand, CommandKind};
use crate::error::Result;
use crate::protocol::{ProtocolHandler, ProtocolVariant};
use crate::writer::CoLaParameterWriter;

/// Composes prepared commands and forwards them through the framing
/// handler it owns.
pub struct ControlSession {
    handler: ProtocolVariant,
}

impl ControlSession {
    pub fn new(handler: ProtocolVariant) -> Self {
        ControlSession { handler }
    }

    pub fn prepare_read(name: &str) -> CoLaCommand {
        CoLaParameterWriter::new(CommandKind::ReadVariable, name).build()
    }

    pub fn prepare_write(name: &str) -> CoLaCommand {
        CoLaParameterWriter::new(CommandKind::WriteVariable, name).build()
    }

    pub fn prepare_call(name: &str) -> CoLaCommand {
        CoLaParameterWriter::new(CommandKind::MethodInvocation, name).build()
    }

    pub async fn open_session(&mut self, session_timeout_secs: u8) -> Result<()> {
        self.handler.open_session(session_timeout_secs).await
    }

    pub async fn close_session(&mut self) -> Result<()> {
        self.handler.close_session().await
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.handler.shutdown().await
    }

    /// Exchange a command. A transport or framing failure is reported as
    /// the network-error sentinel so callers see one clean "device
    /// unreachable" result.
    pub async fn send(&mut self, cmd: &CoLaCommand) -> CoLaCommand {
        match self.handler.send(cmd).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(%err, command = cmd.name(), "command exchange failed");
                CoLaCommand::network_error()
            }
        }
    }
}
