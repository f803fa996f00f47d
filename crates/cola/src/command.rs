//! The CoLa command value: a parsed or built wire body starting at the
//! three-letter kind tag.

use crate::error::ColaError;
use codec::endian;

/// Command kinds and their wire tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    ReadVariable,
    ReadVariableResponse,
    WriteVariable,
    WriteVariableResponse,
    MethodInvocation,
    MethodReturn,
    Error,
    Unknown,
    /// Sentinel for a failed exchange; never appears on the wire.
    NetworkError,
}

impl CommandKind {
    pub fn tag(self) -> Option<&'static [u8; 3]> {
        match self {
            CommandKind::ReadVariable => Some(b"sRN"),
            CommandKind::ReadVariableResponse => Some(b"sRA"),
            CommandKind::WriteVariable => Some(b"sWN"),
            CommandKind::WriteVariableResponse => Some(b"sWA"),
            CommandKind::MethodInvocation => Some(b"sMN"),
            CommandKind::MethodReturn => Some(b"sAN"),
            CommandKind::Error => Some(b"sFA"),
            CommandKind::Unknown | CommandKind::NetworkError => None,
        }
    }

    fn from_tag(tag: &[u8]) -> Self {
        match tag {
            b"sRN" => CommandKind::ReadVariable,
            b"sRA" => CommandKind::ReadVariableResponse,
            b"sWN" => CommandKind::WriteVariable,
            b"sWA" => CommandKind::WriteVariableResponse,
            b"sMN" => CommandKind::MethodInvocation,
            b"sAN" => CommandKind::MethodReturn,
            b"sFA" => CommandKind::Error,
            _ => CommandKind::Unknown,
        }
    }
}

/// A CoLa command, immutable once parsed from received bytes or produced
/// by [`crate::CoLaParameterWriter`].
///
/// For non-error, non-unknown kinds the buffer holds
/// `tag ' ' name ' ' parameters…` and `parameter_offset` points one past
/// the name-terminating space. The error form is `sFA` followed by a
/// 16-bit error code in command byte order.
#[derive(Debug, Clone)]
pub struct CoLaCommand {
    buffer: Vec<u8>,
    kind: CommandKind,
    name: String,
    parameter_offset: usize,
    error: ColaError,
}

impl CoLaCommand {
    /// Parse a received wire body. Malformed input yields an `Unknown`
    /// command rather than an error; the device protocol has no way to
    /// recover more detail.
    pub fn from_buffer(buffer: Vec<u8>) -> Self {
        let mut cmd = CoLaCommand {
            buffer,
            kind: CommandKind::Unknown,
            name: String::new(),
            parameter_offset: 0,
            error: ColaError::Ok,
        };

        if cmd.buffer.len() < 3 {
            return cmd;
        }
        cmd.kind = CommandKind::from_tag(&cmd.buffer[..3]);

        if cmd.kind == CommandKind::Error {
            cmd.parameter_offset = 3;
            cmd.error = match endian::read_cola::<u16>(&cmd.buffer, 3) {
                Ok(code) => ColaError::from(code as i16),
                Err(_) => ColaError::Unknown,
            };
        } else if cmd.kind != CommandKind::Unknown {
            // Name runs from byte 4 to the next space; parameters follow it.
            for i in 4..cmd.buffer.len() {
                if cmd.buffer[i] == b' ' {
                    cmd.name = String::from_utf8_lossy(&cmd.buffer[4..i]).into_owned();
                    cmd.parameter_offset = i + 1;
                    break;
                }
            }
        }

        cmd
    }

    /// The sentinel command returned when the transport reports an error.
    pub fn network_error() -> Self {
        CoLaCommand {
            buffer: Vec::new(),
            kind: CommandKind::NetworkError,
            name: String::new(),
            parameter_offset: 0,
            error: ColaError::NetworkError,
        }
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameter_offset(&self) -> usize {
        self.parameter_offset
    }

    pub fn error(&self) -> ColaError {
        self.error
    }
}
