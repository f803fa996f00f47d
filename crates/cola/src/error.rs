use num_enum::{FromPrimitive, IntoPrimitive};
use thiserror::Error;

/// Device-side CoLa error codes, as carried in `sFA` responses.
///
/// `NetworkError` is never sent by a device; it marks the sentinel command
/// returned when the transport itself fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[repr(i16)]
pub enum ColaError {
    NetworkError = -1,
    Ok = 0,
    /// Wrong user level, access to the method not allowed.
    MethodInAccessDenied = 1,
    /// Method accessed with an unknown index.
    MethodInUnknownIndex = 2,
    /// Variable accessed with an unknown index.
    VariableUnknownIndex = 3,
    /// Local condition violated, e.g. a value outside the allowed range.
    LocalConditionFailed = 4,
    /// Deprecated on current firmware.
    InvalidData = 5,
    /// Deprecated on current firmware.
    UnknownError = 6,
    /// Communication buffer too small for the serialized data.
    BufferOverflow = 7,
    /// More data was expected than the device delivered.
    BufferUnderflow = 8,
    UnknownType = 9,
    /// Variable is read-only.
    VariableWriteAccessDenied = 10,
    UnknownCmdForNameServer = 11,
    UnknownColaCommand = 12,
    MethodInServerBusy = 13,
    /// Array accessed beyond its maximum length.
    FlexOutOfBounds = 14,
    EventRegUnknownIndex = 15,
    /// The value does not fit into the value field, it is too large.
    ColaValueUnderflow = 16,
    ColaAInvalidCharacter = 17,
    OsaiNoMessage = 18,
    OsaiNoAnswerMessage = 19,
    Internal = 20,
    HubAddressCorrupted = 21,
    HubAddressDecoding = 22,
    HubAddressAddressExceeded = 23,
    HubAddressBlankExpected = 24,
    AsyncMethodsAreSuppressed = 25,
    ComplexArraysNotSupported = 32,
    /// No more CoLa 2 sessions available on the device.
    SessionNoResources = 33,
    /// Session ID invalid, timed out, or never existed.
    SessionUnknownId = 34,
    CannotConnect = 35,
    InvalidPort = 36,
    ScanAlreadyActive = 37,
    OutOfTimers = 38,
    /// Device is in RUN mode, writing is not enabled.
    WriteModeNotEnabled = 39,
    SetPortFailed = 40,
    IoLinkFuncTempNotAvailable = 256,
    #[num_enum(default)]
    Unknown = 32767,
}

/// Framing-level failures on the command channel.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("invalid framing magic")]
    InvalidMagic,
    #[error("invalid frame length {0}")]
    InvalidLength(u32),
    #[error("checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },
    #[error("unexpected session ID: expected {expected:#010x}, got {actual:#010x}")]
    UnexpectedSessionId { expected: u32, actual: u32 },
    #[error("unexpected request ID: expected {expected}, got {actual}")]
    UnexpectedRequestId { expected: u16, actual: u16 },
    #[error(transparent)]
    Transport(#[from] transport::TransportError),
    #[error(transparent)]
    Codec(#[from] codec::CodecError),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_round_trip_through_wire_values() {
        assert_eq!(ColaError::from(0i16), ColaError::Ok);
        assert_eq!(ColaError::from(4i16), ColaError::LocalConditionFailed);
        assert_eq!(ColaError::from(34i16), ColaError::SessionUnknownId);
        assert_eq!(i16::from(ColaError::MethodInAccessDenied), 1);
        // Unlisted codes collapse to Unknown.
        assert_eq!(ColaError::from(12345i16), ColaError::Unknown);
    }
}
