//! Host-side client for SICK safeVisionary time-of-flight sensors.
//!
//! [`SafeVisionaryControl`] drives the CoLa command channel (session,
//! authentication, variable and method access); the blob receivers in
//! [`blobstream`] ingest the measurement stream independently. The two
//! pipelines share no state and may run on separate tasks.

pub mod control;

pub use auth::{Authentication, Authenticator, UserLevel};
pub use blobstream::{
    BlobDecoder, BlobError, CameraParameters, DeviceStatus, Frame, TcpBlobReceiver,
    UdpBlobReceiver,
};
pub use cola::{
    CoLaCommand, CoLaParameterReader, CoLaParameterWriter, ColaError, CommandKind, ControlSession,
    ProtocolError,
};
pub use control::SafeVisionaryControl;
pub use transport::{TcpTransport, Transport, UdpTransport};
pub use visconfig::DeviceConfig;
