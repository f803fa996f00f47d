//! Measurement blob ingestion: fragment reassembly over datagram or
//! stream transport, blob and segment validation, and decoding into
//! typed frames.

pub mod error;
pub mod frame;
pub mod header;
pub mod records;
pub mod segments;
pub mod stream;
pub mod timestamp;
pub mod udp;
pub mod xml;

pub use error::{BlobError, DecodeFault, Result, SegmentFault};
pub use frame::{CameraParameters, DataSetsActive, DeviceStatus, Frame, DISTANCE_MAP_UNIT_MM};
pub use segments::{BlobDecoder, SegmentKind};
pub use stream::TcpBlobReceiver;
pub use udp::UdpBlobReceiver;
pub use xml::MetadataCache;
