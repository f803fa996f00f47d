use crate::segments::SegmentKind;
use thiserror::Error;

/// What went wrong inside one segment's envelope or payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentFault {
    CrcMismatch,
    LengthMismatch,
    UnsupportedVersion,
}

#[derive(Error, Debug)]
pub enum BlobError {
    #[error(transparent)]
    Transport(#[from] transport::TransportError),
    #[error(transparent)]
    Codec(#[from] codec::CodecError),

    // UDP fragment header
    #[error("invalid UDP header protocol version {0}")]
    InvalidUdpVersion(u16),
    #[error("invalid UDP packet type {0:#04x}")]
    InvalidUdpPacketType(u8),
    #[error("invalid UDP fragment length: header says {expected}, datagram carries {actual}")]
    InvalidUdpLength { expected: u16, actual: usize },
    #[error("UDP fragment CRC-32C mismatch")]
    InvalidUdpCrc,
    #[error("unexpected blob number: expected {expected}, got {actual}")]
    UnexpectedBlobNumber { expected: u16, actual: u16 },
    #[error("unexpected fragment number: expected {expected}, got {actual}")]
    UnexpectedFragmentNumber { expected: u16, actual: u16 },

    // blob header
    #[error("invalid blob start bytes")]
    InvalidBlobStartBytes,
    #[error("invalid blob protocol version {0}")]
    InvalidBlobVersion(u16),
    #[error("invalid blob packet type {0:#04x}")]
    InvalidBlobPacketType(u8),
    #[error("invalid blob ID {0}")]
    InvalidBlobId(u16),
    #[error("invalid segment count {0}")]
    InvalidSegmentCount(u16),
    #[error("invalid blob length {0}")]
    InvalidBlobLength(u32),
    #[error("blob truncated: offset {offset} outside {len}-byte buffer")]
    BlobTruncated { offset: usize, len: usize },

    #[error("{kind:?} segment: {fault:?}")]
    Segment {
        kind: SegmentKind,
        fault: SegmentFault,
    },

    #[error("metadata XML parse error: {0}")]
    XmlParse(#[from] roxmltree::Error),
}

impl BlobError {
    pub fn segment(kind: SegmentKind, fault: SegmentFault) -> Self {
        BlobError::Segment { kind, fault }
    }
}

/// Compact record of the last failed decode, kept across blob attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeFault {
    Xml,
    Segment(SegmentKind, SegmentFault),
    BlobHeader,
}

pub type Result<T> = std::result::Result<T, BlobError>;
