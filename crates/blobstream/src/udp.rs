//! Fragmented blob reassembly over datagrams.
//!
//! Each datagram starts with a fixed-layout big-endian fragment header
//! and ends with a CRC-32C trailer. Fragment 0 opens a blob; subsequent
//! fragments must carry the same blob number and consecutive fragment
//! numbers until one has the FIN flag set. Any gap aborts the blob; the
//! next call starts fresh on the following fragment 0.

use crate::error::{BlobError, Result};
use crate::frame::Frame;
use crate::header::PACKET_TYPE_DATA;
use crate::segments::BlobDecoder;
use codec::{crc32c_block, endian, CRC_DEFAULT_INIT};
use transport::udp::MAX_DATAGRAM_SIZE;
use transport::Transport;

/// Fragment header: blob number, fragment number, microsecond timestamp,
/// source and destination address/port, protocol version, data length,
/// flags, packet type.
pub const UDP_HEADER_LEN: usize = 26;
pub const UDP_PROTOCOL_VERSION: u16 = 1;
/// Bit 7 of the flags byte: last fragment of the blob.
const FLAG_LAST_FRAGMENT: u8 = 1 << 7;
/// CRC-32C trailer length.
const CRC_TRAILER_LEN: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct UdpFragmentHeader {
    pub blob_number: u16,
    pub fragment_number: u16,
    /// Microseconds since device initialization.
    pub timestamp_us: u32,
    pub data_length: u16,
    pub is_last_fragment: bool,
}

impl UdpFragmentHeader {
    /// Parse and validate one datagram's fragment header. The CRC-32C
    /// trailer is only checked when `verify_crc` is set; lower layers
    /// already checksum the datagram.
    pub fn parse(datagram: &[u8], verify_crc: bool) -> Result<Self> {
        if datagram.len() < UDP_HEADER_LEN + CRC_TRAILER_LEN {
            return Err(BlobError::InvalidUdpLength {
                expected: (UDP_HEADER_LEN + CRC_TRAILER_LEN) as u16,
                actual: datagram.len(),
            });
        }

        let version = endian::read_be::<u16>(datagram, 20)?;
        if version != UDP_PROTOCOL_VERSION {
            return Err(BlobError::InvalidUdpVersion(version));
        }

        if verify_crc {
            let data_size = datagram.len() - CRC_TRAILER_LEN;
            let stored = endian::read_be::<u32>(datagram, data_size)?;
            let calculated = !crc32c_block(&datagram[..data_size], CRC_DEFAULT_INIT);
            if stored != calculated {
                return Err(BlobError::InvalidUdpCrc);
            }
        }

        let packet_type = datagram[25];
        if packet_type != PACKET_TYPE_DATA {
            return Err(BlobError::InvalidUdpPacketType(packet_type));
        }

        let data_length = endian::read_be::<u16>(datagram, 22)?;
        let received = datagram.len() - UDP_HEADER_LEN - CRC_TRAILER_LEN;
        if data_length as usize != received {
            return Err(BlobError::InvalidUdpLength {
                expected: data_length,
                actual: received,
            });
        }

        Ok(UdpFragmentHeader {
            blob_number: endian::read_be::<u16>(datagram, 0)?,
            fragment_number: endian::read_be::<u16>(datagram, 2)?,
            timestamp_us: endian::read_be::<u32>(datagram, 4)?,
            data_length,
            is_last_fragment: datagram[24] & FLAG_LAST_FRAGMENT != 0,
        })
    }
}

/// Reassembles blobs from datagram fragments and decodes them into typed
/// frames.
pub struct UdpBlobReceiver {
    transport: Box<dyn Transport>,
    decoder: BlobDecoder,
    blob_buffer: Vec<u8>,
    blob_number: u16,
    verify_fragment_crc: bool,
}

impl UdpBlobReceiver {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        UdpBlobReceiver {
            transport,
            decoder: BlobDecoder::new(),
            blob_buffer: Vec::new(),
            blob_number: 0,
            verify_fragment_crc: false,
        }
    }

    /// Enable the per-fragment CRC-32C trailer check.
    pub fn with_fragment_crc(mut self, verify: bool) -> Self {
        self.verify_fragment_crc = verify;
        self
    }

    pub fn decoder(&self) -> &BlobDecoder {
        &self.decoder
    }

    pub fn frame(&self) -> &Frame {
        self.decoder.frame()
    }

    /// Reassemble the next complete blob and decode it. A failed blob
    /// leaves the receiver ready for the next one.
    pub async fn next_frame(&mut self) -> Result<&Frame> {
        self.receive_blob().await?;
        self.decoder.decode_blob(&self.blob_buffer)?;
        Ok(self.decoder.frame())
    }

    async fn next_fragment(&mut self) -> Result<(UdpFragmentHeader, Vec<u8>)> {
        let datagram = self.transport.recv_up_to(MAX_DATAGRAM_SIZE).await?;
        let header = UdpFragmentHeader::parse(&datagram, self.verify_fragment_crc)?;
        let payload =
            datagram[UDP_HEADER_LEN..UDP_HEADER_LEN + header.data_length as usize].to_vec();
        Ok((header, payload))
    }

    async fn receive_blob(&mut self) -> Result<()> {
        self.blob_buffer.clear();

        // Discard datagrams until a blob starts with fragment 0.
        let mut last = loop {
            let (header, payload) = self.next_fragment().await?;
            if header.fragment_number == 0 {
                self.blob_buffer.extend_from_slice(&payload);
                self.blob_number = header.blob_number;
                break header.is_last_fragment;
            }
            tracing::trace!(
                fragment = header.fragment_number,
                "discarding mid-blob fragment while searching for a blob start"
            );
        };

        let mut expected_fragment = 0u16;
        while !last {
            expected_fragment += 1;
            let (header, payload) = self.next_fragment().await?;

            if header.blob_number != self.blob_number {
                return Err(BlobError::UnexpectedBlobNumber {
                    expected: self.blob_number,
                    actual: header.blob_number,
                });
            }
            if header.fragment_number != expected_fragment {
                return Err(BlobError::UnexpectedFragmentNumber {
                    expected: expected_fragment,
                    actual: header.fragment_number,
                });
            }

            self.blob_buffer.extend_from_slice(&payload);
            last = header.is_last_fragment;
        }
        Ok(())
    }
}

/// Build one fragment datagram; the inverse of [`UdpFragmentHeader::parse`].
pub fn encode_fragment(
    blob_number: u16,
    fragment_number: u16,
    is_last: bool,
    payload: &[u8],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(UDP_HEADER_LEN + payload.len() + CRC_TRAILER_LEN);
    out.extend_from_slice(&blob_number.to_be_bytes());
    out.extend_from_slice(&fragment_number.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes()); // timestamp
    out.extend_from_slice(&0u32.to_be_bytes()); // source address
    out.extend_from_slice(&0u16.to_be_bytes()); // source port
    out.extend_from_slice(&0u32.to_be_bytes()); // destination address
    out.extend_from_slice(&0u16.to_be_bytes()); // destination port
    out.extend_from_slice(&UDP_PROTOCOL_VERSION.to_be_bytes());
    out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    out.push(if is_last { FLAG_LAST_FRAGMENT } else { 0 });
    out.push(PACKET_TYPE_DATA);
    out.extend_from_slice(payload);
    let crc = !crc32c_block(&out, CRC_DEFAULT_INIT);
    out.extend_from_slice(&crc.to_be_bytes());
    out
}
