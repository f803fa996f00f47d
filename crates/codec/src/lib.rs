//! Wire-level primitives shared by the CoLa command channel and the blob
//! data stream: unaligned endian access, the checksum blocks, and the
//! little-endian `Wire` encode/decode trait for composite records.

pub mod crc;
pub mod endian;
pub mod error;
pub mod wire;

pub use crc::{crc32_block, crc32c_block, CRC_DEFAULT_INIT};
pub use endian::{
    read_be, read_cola, read_le, write_be, write_cola, write_le, Scalar, COLA_BYTE_ORDER_BIG,
};
pub use error::{CodecError, Result};
pub use wire::Wire;
