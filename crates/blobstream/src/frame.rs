//! The typed frame produced by one decoded blob.

use crate::records::{
    DeviceStatusData, FieldInformationData, ImuData, LocalIosData, LogicSignalsData, RoiData,
};
use num_enum::{FromPrimitive, IntoPrimitive};

/// Factor converting radial distance words to millimeters.
pub const DISTANCE_MAP_UNIT_MM: f32 = 0.25;

/// Segment slots carrying a device timestamp (slot 0 is unused, the XML
/// segment has no envelope).
pub const TOTAL_SEGMENT_COUNT: usize = 9;

/// Depth-map flags word, bit 0.
pub const DISTANCE_MAP_FILTERED_FLAG: u16 = 1 << 0;
/// Depth-map flags word, bit 1.
pub const INTRUDED_PIXEL_STATE_VALID_FLAG: u16 = 1 << 1;
/// Depth-map flags word, bit 2.
pub const DATA_STREAM_THROTTLED_FLAG: u16 = 1 << 2;

/// Device operating states as carried in the depth-map segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum DeviceStatus {
    Configuration = 0,
    WaitForInputs = 1,
    ApplicationStopped = 2,
    NormalOperation = 3,
    #[num_enum(default)]
    Invalid = 255,
}

impl Default for DeviceStatus {
    fn default() -> Self {
        DeviceStatus::Invalid
    }
}

/// Camera description extracted from the XML metadata segment.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraParameters {
    pub width: u32,
    pub height: u32,
    /// Row-major camera-to-world transform.
    pub cam2world_matrix: [f64; 16],
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
    pub k3: f64,
    /// Focal-to-ray-cross correction offset for the depth values.
    pub f2rc: f64,
}

pub(crate) const IDENTITY_MATRIX: [f64; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

impl Default for CameraParameters {
    fn default() -> Self {
        CameraParameters {
            width: 0,
            height: 0,
            cam2world_matrix: IDENTITY_MATRIX,
            fx: 0.0,
            fy: 0.0,
            cx: 0.0,
            cy: 0.0,
            k1: 0.0,
            k2: 0.0,
            p1: 0.0,
            p2: 0.0,
            k3: 0.0,
            f2rc: 0.0,
        }
    }
}

/// Which datasets the metadata segment announces for this stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataSetsActive {
    pub depth_map: bool,
    pub polar_2d: bool,
    pub cartesian: bool,
    pub device_status: bool,
    pub roi: bool,
    pub local_ios: bool,
    pub field_information: bool,
    pub logic_signals: bool,
    pub imu: bool,
}

/// One measurement cycle's decoded output. Zero-initialized at
/// construction and overwritten per successful decode.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Radial distance map in 0.25 mm units, `width * height` entries.
    pub distance_map: Vec<u16>,
    pub intensity_map: Vec<u16>,
    pub state_map: Vec<u8>,
    /// Raw flags word of the depth-map segment.
    pub flags: u16,
    pub device_status: DeviceStatus,
    pub device_status_data: DeviceStatusData,
    pub roi_data: RoiData,
    pub local_ios: LocalIosData,
    pub field_information: FieldInformationData,
    pub logic_signals: LogicSignalsData,
    pub imu: ImuData,
    pub frame_number: u32,
    /// Device timestamp of the blob in the packed bit layout; see
    /// [`crate::timestamp`].
    pub timestamp: u64,
    /// Device timestamp per segment slot.
    pub segment_timestamps: [u64; TOTAL_SEGMENT_COUNT],
}

impl Frame {
    pub fn is_distance_map_filtered(&self) -> bool {
        self.flags & DISTANCE_MAP_FILTERED_FLAG != 0
    }

    pub fn is_intruded_pixel_state_valid(&self) -> bool {
        self.flags & INTRUDED_PIXEL_STATE_VALID_FLAG != 0
    }

    pub fn is_data_stream_throttled(&self) -> bool {
        self.flags & DATA_STREAM_THROTTLED_FLAG != 0
    }

    /// Clear data whose segment was absent from the decoded blob. When the
    /// depth map is missing, the change counter stands in for the frame
    /// number; it is incremented per blob and identical to it.
    pub fn clear_missing(&mut self, active: &DataSetsActive, change_counter: u32) {
        if !active.depth_map {
            self.distance_map.clear();
            self.intensity_map.clear();
            self.state_map.clear();
            self.frame_number = change_counter;
        }
        if !active.device_status {
            self.device_status_data = DeviceStatusData::default();
        }
        if !active.roi {
            self.roi_data = RoiData::default();
        }
        if !active.local_ios {
            self.local_ios = LocalIosData::default();
        }
        if !active.field_information {
            self.field_information = FieldInformationData::default();
        }
        if !active.logic_signals {
            self.logic_signals = LogicSignalsData::default();
        }
        if !active.imu {
            self.imu = ImuData::default();
        }
    }
}
