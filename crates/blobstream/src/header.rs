//! Blob header validation.
//!
//! A blob starts `02 02 02 02 | len32 BE | version16 BE | type8 | id16 BE |
//! segments16 BE | N * (offset32 BE, change32 BE)` followed by the segment
//! payloads. Offsets are measured from the blob-ID position.

use crate::error::{BlobError, Result};
use codec::endian;

pub const BLOB_DATA_START: u32 = 0x0202_0202;
pub const BLOB_PROTOCOL_VERSION: u16 = 1;
/// Packet type 'b': measurement data.
pub const PACKET_TYPE_DATA: u8 = 0x62;
pub const BLOB_ID_3D_DATA: u16 = 1;

/// Segment offsets are relative to this position in the blob buffer.
pub const SEGMENT_BASE_OFFSET: usize = 11;
/// Fixed header bytes up to and including the segment count.
pub const BLOB_HEADER_LEN: usize = 15;

/// Upper bound on a complete blob, sized for the largest frame the device
/// emits.
pub const BLOB_SIZE_MAX: usize = 3000 * 1024;

#[derive(Debug, Clone)]
pub struct BlobHeader {
    pub blob_length: u32,
    pub num_segments: u16,
    /// Per-segment offsets plus a trailing sentinel, so segment lengths
    /// are differences of consecutive entries.
    pub segment_offsets: Vec<u32>,
    pub change_counters: Vec<u32>,
}

pub fn parse_blob_header(blob: &[u8]) -> Result<BlobHeader> {
    if blob.len() < BLOB_HEADER_LEN {
        return Err(BlobError::BlobTruncated {
            offset: BLOB_HEADER_LEN,
            len: blob.len(),
        });
    }

    if endian::read_be::<u32>(blob, 0)? != BLOB_DATA_START {
        return Err(BlobError::InvalidBlobStartBytes);
    }
    let blob_length = endian::read_be::<u32>(blob, 4)?;
    let version = endian::read_be::<u16>(blob, 8)?;
    if version != BLOB_PROTOCOL_VERSION {
        return Err(BlobError::InvalidBlobVersion(version));
    }
    let packet_type = blob[10];
    if packet_type != PACKET_TYPE_DATA {
        return Err(BlobError::InvalidBlobPacketType(packet_type));
    }
    let blob_id = endian::read_be::<u16>(blob, 11)?;
    if blob_id != BLOB_ID_3D_DATA {
        return Err(BlobError::InvalidBlobId(blob_id));
    }
    let num_segments = endian::read_be::<u16>(blob, 13)?;
    if num_segments == 0 {
        return Err(BlobError::InvalidSegmentCount(0));
    }

    let mut segment_offsets = Vec::with_capacity(num_segments as usize + 1);
    let mut change_counters = Vec::with_capacity(num_segments as usize);
    let mut position = BLOB_HEADER_LEN;
    for _ in 0..num_segments {
        segment_offsets.push(endian::read_be::<u32>(blob, position)?);
        position += 4;
        change_counters.push(endian::read_be::<u32>(blob, position)?);
        position += 4;
    }

    // Sentinel one past the last segment byte, in the same frame of
    // reference as the offsets: blob_length counts from the version field,
    // three bytes before the blob ID.
    let sentinel = blob_length
        .checked_sub(3)
        .ok_or(BlobError::InvalidBlobLength(blob_length))?;
    segment_offsets.push(sentinel);

    Ok(BlobHeader {
        blob_length,
        num_segments,
        segment_offsets,
        change_counters,
    })
}

/// Build the fixed part of a blob buffer; the inverse of
/// [`parse_blob_header`], used when synthesizing blobs.
pub fn encode_blob_header(segments: &[(u32, u32)], body_len: usize) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&BLOB_DATA_START.to_be_bytes());
    // version..end of body, measured from the version field
    let blob_length = (3 + 4 + segments.len() * 8 + body_len) as u32;
    out.extend_from_slice(&blob_length.to_be_bytes());
    out.extend_from_slice(&BLOB_PROTOCOL_VERSION.to_be_bytes());
    out.push(PACKET_TYPE_DATA);
    out.extend_from_slice(&BLOB_ID_3D_DATA.to_be_bytes());
    out.extend_from_slice(&(segments.len() as u16).to_be_bytes());
    for (offset, change_counter) in segments {
        out.extend_from_slice(&offset.to_be_bytes());
        out.extend_from_slice(&change_counter.to_be_bytes());
    }
    out
}
