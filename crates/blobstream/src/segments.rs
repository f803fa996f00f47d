//! Segment envelope verification and the per-segment decoders.
//!
//! Every non-XML segment is bracketed as `len32 LE | timestamp64 LE |
//! version16 LE | payload | crc32 LE | len32 LE (echo)` where the CRC is
//! the complemented CRC-32 over timestamp, version, and payload, and
//! `len` counts everything except the trailing echo, its own field
//! included.

use crate::error::{BlobError, DecodeFault, Result, SegmentFault};
use crate::frame::{DeviceStatus, Frame};
use crate::header::{parse_blob_header, SEGMENT_BASE_OFFSET};
use crate::records::{
    DeviceStatusData, FieldInformationData, ImuData, LocalIosData, LogicSignalsData, RoiData,
};
use crate::xml::MetadataCache;
use codec::{crc32_block, endian, Wire, CRC_DEFAULT_INIT};

/// Binary segment kinds in their fixed dispatch order. The discriminant
/// doubles as the segment's timestamp slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    DepthMap = 1,
    DeviceStatus = 2,
    Roi = 3,
    LocalIos = 4,
    FieldInformation = 5,
    LogicSignals = 6,
    Imu = 7,
}

impl SegmentKind {
    pub fn timestamp_slot(self) -> usize {
        self as usize
    }

    /// Supported envelope version per segment kind.
    pub fn expected_version(self) -> u16 {
        match self {
            SegmentKind::DepthMap => 2,
            _ => 1,
        }
    }
}

/// Verify a segment envelope and return its device timestamp and payload.
pub fn check_envelope(segment: &[u8], kind: SegmentKind) -> Result<(u64, &[u8])> {
    let fault = |fault| BlobError::segment(kind, fault);

    if segment.len() < 4 {
        return Err(fault(SegmentFault::LengthMismatch));
    }
    let length = endian::read_le::<u32>(segment, 0)? as usize;
    // Shortest envelope, with an empty payload: length field, timestamp,
    // version, and CRC.
    if length < 18 || length + 4 != segment.len() {
        return Err(fault(SegmentFault::LengthMismatch));
    }
    let data_size = length - 8;

    let crc_stored = endian::read_le::<u32>(segment, 4 + data_size)?;
    let crc_calculated = !crc32_block(&segment[4..4 + data_size], CRC_DEFAULT_INIT);
    if crc_stored != crc_calculated {
        return Err(fault(SegmentFault::CrcMismatch));
    }

    let length_echo = endian::read_le::<u32>(segment, 4 + data_size + 4)? as usize;
    if length_echo != length {
        return Err(fault(SegmentFault::LengthMismatch));
    }

    let version = endian::read_le::<u16>(segment, 12)?;
    if version != kind.expected_version() {
        return Err(fault(SegmentFault::UnsupportedVersion));
    }

    let timestamp = endian::read_le::<u64>(segment, 4)?;
    Ok((timestamp, &segment[14..4 + data_size]))
}

/// Wrap a payload in a valid envelope; the inverse of [`check_envelope`].
pub fn encode_segment(timestamp: u64, version: u16, payload: &[u8]) -> Vec<u8> {
    let length = (18 + payload.len()) as u32;
    let mut out = Vec::with_capacity(payload.len() + 22);
    out.extend_from_slice(&length.to_le_bytes());
    out.extend_from_slice(&timestamp.to_le_bytes());
    out.extend_from_slice(&version.to_le_bytes());
    out.extend_from_slice(payload);
    let crc = !crc32_block(&out[4..], CRC_DEFAULT_INIT);
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&length.to_le_bytes());
    out
}

fn payload_fault(kind: SegmentKind) -> BlobError {
    BlobError::segment(kind, SegmentFault::LengthMismatch)
}

/// Slice segment `index` out of the blob buffer using the offset table
/// (which carries a trailing sentinel).
fn segment_slice<'a>(blob: &'a [u8], offsets: &[u32], index: usize) -> Result<&'a [u8]> {
    // The metadata may announce more datasets than the header carries.
    if index + 1 >= offsets.len() {
        return Err(BlobError::InvalidSegmentCount((offsets.len() - 1) as u16));
    }
    let start = SEGMENT_BASE_OFFSET + offsets[index] as usize;
    let end = SEGMENT_BASE_OFFSET + offsets[index + 1] as usize;
    if start > end || end > blob.len() {
        return Err(BlobError::BlobTruncated {
            offset: end,
            len: blob.len(),
        });
    }
    Ok(&blob[start..end])
}

/// Read `count` little-endian elements of `width` bytes, widened to u64.
fn read_elements(buf: &mut &[u8], count: usize, width: u32) -> Option<Vec<u64>> {
    let width = width as usize;
    if width == 0 {
        return Some(Vec::new());
    }
    if buf.len() < count * width {
        return None;
    }
    let mut elements = Vec::with_capacity(count);
    for index in 0..count {
        let mut value = 0u64;
        for byte in (0..width).rev() {
            value = (value << 8) | buf[index * width + byte] as u64;
        }
        elements.push(value);
    }
    *buf = &buf[count * width..];
    Some(elements)
}

/// Decodes complete blobs into a typed [`Frame`], caching the camera
/// description across blobs.
#[derive(Default)]
pub struct BlobDecoder {
    metadata: MetadataCache,
    frame: Frame,
    last_fault: Option<DecodeFault>,
}

impl BlobDecoder {
    pub fn new() -> Self {
        BlobDecoder::default()
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn metadata(&self) -> &MetadataCache {
        &self.metadata
    }

    pub fn camera_parameters(&self) -> &crate::frame::CameraParameters {
        &self.metadata.camera
    }

    /// Fault recorded by the most recent failed decode, if any.
    pub fn last_fault(&self) -> Option<DecodeFault> {
        self.last_fault
    }

    /// Decode one complete blob buffer. On failure the frame keeps its
    /// previous contents and the next blob starts afresh.
    pub fn decode_blob(&mut self, blob: &[u8]) -> Result<()> {
        match self.decode_inner(blob) {
            Ok(()) => {
                self.last_fault = None;
                Ok(())
            }
            Err(error) => {
                self.last_fault = Some(match &error {
                    BlobError::XmlParse(_) => DecodeFault::Xml,
                    BlobError::Segment { kind, fault } => DecodeFault::Segment(*kind, *fault),
                    _ => DecodeFault::BlobHeader,
                });
                Err(error)
            }
        }
    }

    fn decode_inner(&mut self, blob: &[u8]) -> Result<()> {
        let header = parse_blob_header(blob)?;
        let segment = |index: usize| segment_slice(blob, &header.segment_offsets, index);

        // Segment 0 is always the XML metadata.
        let xml = String::from_utf8_lossy(segment(0)?).into_owned();
        self.metadata.parse(&xml, header.change_counters[0])?;

        let datasets = self.metadata.datasets;
        let mut current = 0usize;

        if datasets.depth_map {
            current += 1;
            self.parse_depth_map(segment(current)?)?;
        }
        if datasets.device_status {
            current += 1;
            self.frame.device_status_data = self
                .decode_record::<DeviceStatusData>(segment(current)?, SegmentKind::DeviceStatus)?;
        }
        if datasets.roi {
            current += 1;
            self.frame.roi_data =
                self.decode_record::<RoiData>(segment(current)?, SegmentKind::Roi)?;
        }
        if datasets.local_ios {
            current += 1;
            self.frame.local_ios =
                self.decode_record::<LocalIosData>(segment(current)?, SegmentKind::LocalIos)?;
        }
        if datasets.field_information {
            current += 1;
            self.frame.field_information = self.decode_record::<FieldInformationData>(
                segment(current)?,
                SegmentKind::FieldInformation,
            )?;
        }
        if datasets.logic_signals {
            current += 1;
            self.frame.logic_signals = self
                .decode_record::<LogicSignalsData>(segment(current)?, SegmentKind::LogicSignals)?;
        }
        if datasets.imu {
            current += 1;
            self.frame.imu = self.decode_record::<ImuData>(segment(current)?, SegmentKind::Imu)?;
        }

        // With no depth-map segment the change counter stands in for the
        // frame number; it advances once per blob.
        let substitute_counter = header
            .change_counters
            .get(1)
            .copied()
            .unwrap_or(header.change_counters[0]);
        self.frame.clear_missing(&datasets, substitute_counter);
        Ok(())
    }

    fn decode_record<T: Wire>(&mut self, segment: &[u8], kind: SegmentKind) -> Result<T> {
        let (timestamp, payload) = check_envelope(segment, kind)?;
        self.frame.timestamp = timestamp;
        self.frame.segment_timestamps[kind.timestamp_slot()] = timestamp;

        let mut buf = payload;
        T::decode(&mut buf).map_err(|_| payload_fault(kind))
    }

    fn parse_depth_map(&mut self, segment: &[u8]) -> Result<()> {
        let kind = SegmentKind::DepthMap;
        let (timestamp, payload) = check_envelope(segment, kind)?;
        self.frame.timestamp = timestamp;
        self.frame.segment_timestamps[kind.timestamp_slot()] = timestamp;

        let mut buf = payload;
        if buf.len() < 7 {
            return Err(payload_fault(kind));
        }
        self.frame.frame_number = endian::read_le::<u32>(buf, 0)?;
        self.frame.device_status = DeviceStatus::from(buf[4]);
        self.frame.flags = endian::read_le::<u16>(buf, 5)?;
        buf = &buf[7..];

        let num_pixels =
            self.metadata.camera.width as usize * self.metadata.camera.height as usize;

        match read_elements(&mut buf, num_pixels, self.metadata.distance_byte_depth) {
            Some(elements) if self.metadata.distance_byte_depth > 0 => {
                self.frame.distance_map = elements.into_iter().map(|v| v as u16).collect();
            }
            Some(_) => self.frame.distance_map.clear(),
            None => return Err(payload_fault(kind)),
        }
        match read_elements(&mut buf, num_pixels, self.metadata.intensity_byte_depth) {
            Some(elements) if self.metadata.intensity_byte_depth > 0 => {
                self.frame.intensity_map = elements.into_iter().map(|v| v as u16).collect();
            }
            Some(_) => self.frame.intensity_map.clear(),
            None => return Err(payload_fault(kind)),
        }
        match read_elements(&mut buf, num_pixels, self.metadata.state_byte_depth) {
            Some(elements) if self.metadata.state_byte_depth > 0 => {
                self.frame.state_map = elements.into_iter().map(|v| v as u8).collect();
            }
            Some(_) => self.frame.state_map.clear(),
            None => return Err(payload_fault(kind)),
        }

        Ok(())
    }
}
