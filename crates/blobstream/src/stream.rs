//! Blob reception over a TCP stream.
//!
//! The stream interleaves 11-byte headers (`02 02 02 02 | len32 BE |
//! version16 BE | type8`) with blob bodies. The first blob after
//! connecting is discarded since the connection may attach mid-blob, and
//! a lost boundary is recovered by scanning byte-wise for four
//! consecutive `0x02`.

use crate::error::{BlobError, Result};
use crate::frame::Frame;
use crate::header::BLOB_SIZE_MAX;
use crate::segments::BlobDecoder;
use codec::endian;
use transport::Transport;

/// Magic, length, protocol version, packet type.
pub const STREAM_HEADER_LEN: usize = 11;

const MAGIC_BYTE: u8 = 0x02;

struct StreamHeader {
    length: u32,
    version: u16,
    packet_type: u8,
}

pub struct TcpBlobReceiver {
    transport: Box<dyn Transport>,
    decoder: BlobDecoder,
    blob_buffer: Vec<u8>,
    synchronized: bool,
}

impl TcpBlobReceiver {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        TcpBlobReceiver {
            transport,
            decoder: BlobDecoder::new(),
            blob_buffer: Vec::new(),
            synchronized: false,
        }
    }

    pub fn decoder(&self) -> &BlobDecoder {
        &self.decoder
    }

    pub fn frame(&self) -> &Frame {
        self.decoder.frame()
    }

    /// Receive and decode the next complete blob.
    pub async fn next_frame(&mut self) -> Result<&Frame> {
        if !self.synchronized {
            // The connection may have attached mid-blob; drop everything
            // up to and including the first complete blob body.
            let header = self.read_header().await?;
            let _ = self.transport.recv_exactly(body_length(&header)?).await?;
            self.synchronized = true;
        }

        let header = self.read_header().await?;
        let body = self.transport.recv_exactly(body_length(&header)?).await?;

        // Rebuild the on-wire blob layout so the datagram and stream paths
        // validate the same buffer.
        self.blob_buffer.clear();
        self.blob_buffer.extend_from_slice(&[MAGIC_BYTE; 4]);
        self.blob_buffer.extend_from_slice(&header.length.to_be_bytes());
        self.blob_buffer.extend_from_slice(&header.version.to_be_bytes());
        self.blob_buffer.push(header.packet_type);
        self.blob_buffer.extend_from_slice(&body);

        self.decoder.decode_blob(&self.blob_buffer)?;
        Ok(self.decoder.frame())
    }

    /// Read the next stream header, scanning for the magic sentinel. At a
    /// clean boundary the scan consumes exactly the four magic bytes.
    async fn read_header(&mut self) -> Result<StreamHeader> {
        let mut seen = 0usize;
        let mut consumed = 0usize;
        while seen < 4 {
            let byte = self.transport.recv_exactly(1).await?;
            consumed += 1;
            if byte[0] == MAGIC_BYTE {
                seen += 1;
            } else {
                seen = 0;
            }
        }
        if consumed > 4 {
            tracing::warn!(skipped = consumed - 4, "resynchronized blob stream");
        }

        let rest = self.transport.recv_exactly(STREAM_HEADER_LEN - 4).await?;
        let length = endian::read_be::<u32>(&rest, 0)?;
        if (length as usize) < 3 || length as usize > BLOB_SIZE_MAX {
            return Err(BlobError::InvalidBlobLength(length));
        }
        Ok(StreamHeader {
            length,
            version: endian::read_be::<u16>(&rest, 4)?,
            packet_type: rest[6],
        })
    }
}

/// Bytes following the 11-byte header: the length field counts from the
/// version field, which the header already carried along with the type.
fn body_length(header: &StreamHeader) -> Result<usize> {
    (header.length as usize)
        .checked_sub(3)
        .ok_or(BlobError::InvalidBlobLength(header.length))
}
