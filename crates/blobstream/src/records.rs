//! Typed records carried by the fixed-layout blob segments.
//!
//! The device packs these as C bit-field structs; they are decoded bit by
//! bit here so the layout is explicit instead of depending on a
//! compiler's bit-field ordering.

use codec::error::Result;
use codec::Wire;
use bytes::{Buf, BufMut};

pub const MAX_ROI_VALUES: usize = 5;
pub const MAX_FIELD_INFORMATION_VALUES: usize = 16;
pub const MAX_LOGIC_SIGNAL_VALUES: usize = 20;

fn bit(bits: u16, index: u16) -> bool {
    bits & (1 << index) != 0
}

fn set_bit(bits: &mut u16, index: u16, value: bool) {
    if value {
        *bits |= 1 << index;
    }
}

/// General status bits of the device-status segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneralStatus {
    pub run_mode_active: bool,
    pub device_error: bool,
    pub application_error: bool,
    pub sleep_mode: bool,
    pub wait_for_input: bool,
    pub wait_for_cluster: bool,
    pub contamination_warning: bool,
    pub contamination_error: bool,
    pub dead_zone_detection: bool,
    pub temperature_warning: bool,
}

impl Wire for GeneralStatus {
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        let mut bits = 0u16;
        set_bit(&mut bits, 0, self.run_mode_active);
        set_bit(&mut bits, 1, self.device_error);
        set_bit(&mut bits, 2, self.application_error);
        set_bit(&mut bits, 3, self.sleep_mode);
        set_bit(&mut bits, 4, self.wait_for_input);
        set_bit(&mut bits, 5, self.wait_for_cluster);
        set_bit(&mut bits, 6, self.contamination_warning);
        set_bit(&mut bits, 7, self.contamination_error);
        set_bit(&mut bits, 8, self.dead_zone_detection);
        set_bit(&mut bits, 9, self.temperature_warning);
        bits.encode(buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        let bits = u16::decode(buf)?;
        Ok(GeneralStatus {
            run_mode_active: bit(bits, 0),
            device_error: bit(bits, 1),
            application_error: bit(bits, 2),
            sleep_mode: bit(bits, 3),
            wait_for_input: bit(bits, 4),
            wait_for_cluster: bit(bits, 5),
            contamination_warning: bit(bits, 6),
            contamination_error: bit(bits, 7),
            dead_zone_detection: bit(bits, 8),
            temperature_warning: bit(bits, 9),
        })
    }

    fn wire_size(&self) -> usize {
        2
    }
}

/// Currently active monitoring case numbers, one byte each.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveMonitoringCase {
    pub case_numbers: [u8; 4],
}

impl Wire for ActiveMonitoringCase {
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        self.case_numbers.encode(buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        Ok(ActiveMonitoringCase {
            case_numbers: <[u8; 4]>::decode(buf)?,
        })
    }

    fn wire_size(&self) -> usize {
        4
    }
}

/// Payload of the device-status segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStatusData {
    pub general_status: GeneralStatus,
    /// Cut-off paths, safety related.
    pub cop_safety_related: u32,
    pub cop_non_safety_related: u32,
    pub cop_reset_required: u32,
    pub active_monitoring_case: ActiveMonitoringCase,
    pub contamination_level: u8,
}

impl Wire for DeviceStatusData {
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        self.general_status.encode(buf)?;
        self.cop_safety_related.encode(buf)?;
        self.cop_non_safety_related.encode(buf)?;
        self.cop_reset_required.encode(buf)?;
        self.active_monitoring_case.encode(buf)?;
        self.contamination_level.encode(buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        Ok(DeviceStatusData {
            general_status: GeneralStatus::decode(buf)?,
            cop_safety_related: u32::decode(buf)?,
            cop_non_safety_related: u32::decode(buf)?,
            cop_reset_required: u32::decode(buf)?,
            active_monitoring_case: ActiveMonitoringCase::decode(buf)?,
            contamination_level: u8::decode(buf)?,
        })
    }

    fn wire_size(&self) -> usize {
        19
    }
}

/// Result bits of one region of interest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoiResult {
    pub task_result: bool,
    pub result_safe: bool,
    pub result_valid: bool,
    pub distance_valid: bool,
    pub distance_safe: bool,
}

impl Wire for RoiResult {
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        let mut bits = 0u16;
        set_bit(&mut bits, 0, self.task_result);
        set_bit(&mut bits, 1, self.result_safe);
        set_bit(&mut bits, 2, self.result_valid);
        set_bit(&mut bits, 3, self.distance_valid);
        set_bit(&mut bits, 4, self.distance_safe);
        (bits as u8).encode(buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        let bits = u8::decode(buf)? as u16;
        Ok(RoiResult {
            task_result: bit(bits, 0),
            result_safe: bit(bits, 1),
            result_valid: bit(bits, 2),
            distance_valid: bit(bits, 3),
            distance_safe: bit(bits, 4),
        })
    }

    fn wire_size(&self) -> usize {
        1
    }
}

/// Measurement accuracy quality classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoiQualityClass {
    #[default]
    Invalid,
    High,
    Moderate,
    Low,
}

impl RoiQualityClass {
    fn from_bits(bits: u16) -> Self {
        match bits & 0x3 {
            1 => RoiQualityClass::High,
            2 => RoiQualityClass::Moderate,
            3 => RoiQualityClass::Low,
            _ => RoiQualityClass::Invalid,
        }
    }

    fn to_bits(self) -> u16 {
        match self {
            RoiQualityClass::Invalid => 0,
            RoiQualityClass::High => 1,
            RoiQualityClass::Moderate => 2,
            RoiQualityClass::Low => 3,
        }
    }
}

/// Safety-related bits of one ROI distance measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoiSafetyData {
    pub invalid_due_to_invalid_pixels: bool,
    pub invalid_due_to_variance: bool,
    pub invalid_due_to_overexposure: bool,
    pub invalid_due_to_underexposure: bool,
    pub invalid_due_to_temporal_variance: bool,
    pub invalid_due_to_outside_of_measurement_range: bool,
    pub invalid_due_to_retro_reflector_interference: bool,
    pub contamination_error: bool,
    pub quality_class: RoiQualityClass,
    pub slot_active: bool,
}

impl Wire for RoiSafetyData {
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        let mut bits = 0u16;
        set_bit(&mut bits, 0, self.invalid_due_to_invalid_pixels);
        set_bit(&mut bits, 1, self.invalid_due_to_variance);
        set_bit(&mut bits, 2, self.invalid_due_to_overexposure);
        set_bit(&mut bits, 3, self.invalid_due_to_underexposure);
        set_bit(&mut bits, 4, self.invalid_due_to_temporal_variance);
        set_bit(&mut bits, 5, self.invalid_due_to_outside_of_measurement_range);
        set_bit(&mut bits, 6, self.invalid_due_to_retro_reflector_interference);
        set_bit(&mut bits, 7, self.contamination_error);
        bits |= self.quality_class.to_bits() << 8;
        set_bit(&mut bits, 10, self.slot_active);
        bits.encode(buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        let bits = u16::decode(buf)?;
        Ok(RoiSafetyData {
            invalid_due_to_invalid_pixels: bit(bits, 0),
            invalid_due_to_variance: bit(bits, 1),
            invalid_due_to_overexposure: bit(bits, 2),
            invalid_due_to_underexposure: bit(bits, 3),
            invalid_due_to_temporal_variance: bit(bits, 4),
            invalid_due_to_outside_of_measurement_range: bit(bits, 5),
            invalid_due_to_retro_reflector_interference: bit(bits, 6),
            contamination_error: bit(bits, 7),
            quality_class: RoiQualityClass::from_bits(bits >> 8),
            slot_active: bit(bits, 10),
        })
    }

    fn wire_size(&self) -> usize {
        2
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoiElement {
    pub id: u8,
    pub result: RoiResult,
    pub safety_data: RoiSafetyData,
    pub distance_value: u16,
}

impl Wire for RoiElement {
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        self.id.encode(buf)?;
        self.result.encode(buf)?;
        self.safety_data.encode(buf)?;
        self.distance_value.encode(buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        Ok(RoiElement {
            id: u8::decode(buf)?,
            result: RoiResult::decode(buf)?,
            safety_data: RoiSafetyData::decode(buf)?,
            distance_value: u16::decode(buf)?,
        })
    }

    fn wire_size(&self) -> usize {
        6
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoiData {
    pub elements: [RoiElement; MAX_ROI_VALUES],
}

impl Wire for RoiData {
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        self.elements.encode(buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        Ok(RoiData {
            elements: <[RoiElement; MAX_ROI_VALUES]>::decode(buf)?,
        })
    }

    fn wire_size(&self) -> usize {
        6 * MAX_ROI_VALUES
    }
}

/// One-bit-per-pin words of the local I/O segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UniversalIoPins {
    pub pin5: bool,
    pub pin6: bool,
    pub pin7: bool,
    pub pin8: bool,
}

impl Wire for UniversalIoPins {
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        let mut bits = 0u16;
        set_bit(&mut bits, 0, self.pin5);
        set_bit(&mut bits, 1, self.pin6);
        set_bit(&mut bits, 2, self.pin7);
        set_bit(&mut bits, 3, self.pin8);
        bits.encode(buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        let bits = u16::decode(buf)?;
        Ok(UniversalIoPins {
            pin5: bit(bits, 0),
            pin6: bit(bits, 1),
            pin7: bit(bits, 2),
            pin8: bit(bits, 3),
        })
    }

    fn wire_size(&self) -> usize {
        2
    }
}

/// Output values, one byte per pin plus reserved space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UniversalIoOutputValues {
    pub local_output1_pin5: u8,
    pub local_output2_pin6: u8,
    pub local_output3_pin7: u8,
    pub local_output4_pin8: u8,
}

impl Wire for UniversalIoOutputValues {
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        self.local_output1_pin5.encode(buf)?;
        self.local_output2_pin6.encode(buf)?;
        self.local_output3_pin7.encode(buf)?;
        self.local_output4_pin8.encode(buf)?;
        [0u8; 12].encode(buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        let values = UniversalIoOutputValues {
            local_output1_pin5: u8::decode(buf)?,
            local_output2_pin6: u8::decode(buf)?,
            local_output3_pin7: u8::decode(buf)?,
            local_output4_pin8: u8::decode(buf)?,
        };
        <[u8; 12]>::decode(buf)?;
        Ok(values)
    }

    fn wire_size(&self) -> usize {
        16
    }
}

/// OSSD output pair states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OssdsState {
    pub ossd1a: bool,
    pub ossd1b: bool,
    pub ossd2a: bool,
    pub ossd2b: bool,
}

impl Wire for OssdsState {
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        let mut bits = 0u16;
        set_bit(&mut bits, 0, self.ossd1a);
        set_bit(&mut bits, 1, self.ossd1b);
        set_bit(&mut bits, 2, self.ossd2a);
        set_bit(&mut bits, 3, self.ossd2b);
        (bits as u8).encode(buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        let bits = u8::decode(buf)? as u16;
        Ok(OssdsState {
            ossd1a: bit(bits, 0),
            ossd1b: bit(bits, 1),
            ossd2a: bit(bits, 2),
            ossd2b: bit(bits, 3),
        })
    }

    fn wire_size(&self) -> usize {
        1
    }
}

/// Payload of the local I/O segment. The trailing words are reserved on
/// current firmware but still occupy wire space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalIosData {
    pub universal_io_configured: UniversalIoPins,
    pub universal_io_direction: UniversalIoPins,
    pub universal_io_input_values: UniversalIoPins,
    pub universal_io_output_values: UniversalIoOutputValues,
    pub ossds_state: OssdsState,
    pub ossds_dyn_count: u8,
    pub ossds_crc: u8,
    pub ossds_io_status: u8,
    pub dynamic_speed_a: u16,
    pub dynamic_speed_b: u16,
    pub dynamic_valid_flags: u16,
    pub flags: u16,
}

impl Wire for LocalIosData {
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        self.universal_io_configured.encode(buf)?;
        self.universal_io_direction.encode(buf)?;
        self.universal_io_input_values.encode(buf)?;
        self.universal_io_output_values.encode(buf)?;
        self.ossds_state.encode(buf)?;
        self.ossds_dyn_count.encode(buf)?;
        self.ossds_crc.encode(buf)?;
        self.ossds_io_status.encode(buf)?;
        self.dynamic_speed_a.encode(buf)?;
        self.dynamic_speed_b.encode(buf)?;
        self.dynamic_valid_flags.encode(buf)?;
        self.flags.encode(buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        Ok(LocalIosData {
            universal_io_configured: UniversalIoPins::decode(buf)?,
            universal_io_direction: UniversalIoPins::decode(buf)?,
            universal_io_input_values: UniversalIoPins::decode(buf)?,
            universal_io_output_values: UniversalIoOutputValues::decode(buf)?,
            ossds_state: OssdsState::decode(buf)?,
            ossds_dyn_count: u8::decode(buf)?,
            ossds_crc: u8::decode(buf)?,
            ossds_io_status: u8::decode(buf)?,
            dynamic_speed_a: u16::decode(buf)?,
            dynamic_speed_b: u16::decode(buf)?,
            dynamic_valid_flags: u16::decode(buf)?,
            flags: u16::decode(buf)?,
        })
    }

    fn wire_size(&self) -> usize {
        34
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldInformationElement {
    pub field_id: u8,
    pub field_set_id: u8,
    pub field_result: u8,
    pub eval_method: u8,
    pub field_active: u8,
}

impl Wire for FieldInformationElement {
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        self.field_id.encode(buf)?;
        self.field_set_id.encode(buf)?;
        self.field_result.encode(buf)?;
        self.eval_method.encode(buf)?;
        self.field_active.encode(buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        Ok(FieldInformationElement {
            field_id: u8::decode(buf)?,
            field_set_id: u8::decode(buf)?,
            field_result: u8::decode(buf)?,
            eval_method: u8::decode(buf)?,
            field_active: u8::decode(buf)?,
        })
    }

    fn wire_size(&self) -> usize {
        5
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldInformationData {
    pub elements: [FieldInformationElement; MAX_FIELD_INFORMATION_VALUES],
}

impl Wire for FieldInformationData {
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        self.elements.encode(buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        Ok(FieldInformationData {
            elements: <[FieldInformationElement; MAX_FIELD_INFORMATION_VALUES]>::decode(buf)?,
        })
    }

    fn wire_size(&self) -> usize {
        5 * MAX_FIELD_INFORMATION_VALUES
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicSignalsElement {
    pub signal_type: u8,
    pub instance: u8,
    pub configured: bool,
    pub signal_direction: bool,
    pub value: u16,
}

impl Wire for LogicSignalsElement {
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        self.signal_type.encode(buf)?;
        self.instance.encode(buf)?;
        let mut bits = 0u16;
        set_bit(&mut bits, 0, self.configured);
        set_bit(&mut bits, 1, self.signal_direction);
        bits.encode(buf)?;
        self.value.encode(buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        let signal_type = u8::decode(buf)?;
        let instance = u8::decode(buf)?;
        let bits = u16::decode(buf)?;
        let value = u16::decode(buf)?;
        Ok(LogicSignalsElement {
            signal_type,
            instance,
            configured: bit(bits, 0),
            signal_direction: bit(bits, 1),
            value,
        })
    }

    fn wire_size(&self) -> usize {
        6
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicSignalsData {
    pub elements: [LogicSignalsElement; MAX_LOGIC_SIGNAL_VALUES],
}

impl Wire for LogicSignalsData {
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        self.elements.encode(buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        Ok(LogicSignalsData {
            elements: <[LogicSignalsElement; MAX_LOGIC_SIGNAL_VALUES]>::decode(buf)?,
        })
    }

    fn wire_size(&self) -> usize {
        6 * MAX_LOGIC_SIGNAL_VALUES
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImuVector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub accuracy: u8,
}

impl Wire for ImuVector {
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        self.x.encode(buf)?;
        self.y.encode(buf)?;
        self.z.encode(buf)?;
        self.accuracy.encode(buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        Ok(ImuVector {
            x: f32::decode(buf)?,
            y: f32::decode(buf)?,
            z: f32::decode(buf)?,
            accuracy: u8::decode(buf)?,
        })
    }

    fn wire_size(&self) -> usize {
        13
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImuQuaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
    pub accuracy: f32,
}

impl Wire for ImuQuaternion {
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        self.x.encode(buf)?;
        self.y.encode(buf)?;
        self.z.encode(buf)?;
        self.w.encode(buf)?;
        self.accuracy.encode(buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        Ok(ImuQuaternion {
            x: f32::decode(buf)?,
            y: f32::decode(buf)?,
            z: f32::decode(buf)?,
            w: f32::decode(buf)?,
            accuracy: f32::decode(buf)?,
        })
    }

    fn wire_size(&self) -> usize {
        20
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImuData {
    pub acceleration: ImuVector,
    pub angular_velocity: ImuVector,
    pub orientation: ImuQuaternion,
}

impl Wire for ImuData {
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        self.acceleration.encode(buf)?;
        self.angular_velocity.encode(buf)?;
        self.orientation.encode(buf)
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        Ok(ImuData {
            acceleration: ImuVector::decode(buf)?,
            angular_velocity: ImuVector::decode(buf)?,
            orientation: ImuQuaternion::decode(buf)?,
        })
    }

    fn wire_size(&self) -> usize {
        46
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn roundtrip<T: Wire + PartialEq + std::fmt::Debug>(value: &T, expected_size: usize) {
        let mut buf = BytesMut::new();
        value.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), expected_size);
        let decoded = T::decode(&mut buf).unwrap();
        assert_eq!(&decoded, value);
    }

    #[test]
    fn record_sizes_match_the_wire_layout() {
        roundtrip(&DeviceStatusData::default(), 19);
        roundtrip(&RoiData::default(), 30);
        roundtrip(&LocalIosData::default(), 34);
        roundtrip(&FieldInformationData::default(), 80);
        roundtrip(&LogicSignalsData::default(), 120);
        roundtrip(&ImuData::default(), 46);
    }

    #[test]
    fn general_status_bits() {
        let mut buf = BytesMut::new();
        // run mode (bit 0), contamination warning (bit 6), temperature
        // warning (bit 9)
        (1u16 | 1 << 6 | 1 << 9).encode(&mut buf).unwrap();
        let status = GeneralStatus::decode(&mut buf).unwrap();
        assert!(status.run_mode_active);
        assert!(status.contamination_warning);
        assert!(status.temperature_warning);
        assert!(!status.device_error);
        assert!(!status.dead_zone_detection);
    }

    #[test]
    fn roi_safety_quality_class_occupies_bits_eight_and_nine() {
        let mut buf = BytesMut::new();
        ((2u16 << 8) | (1 << 10) | 1).encode(&mut buf).unwrap();
        let safety = RoiSafetyData::decode(&mut buf).unwrap();
        assert_eq!(safety.quality_class, RoiQualityClass::Moderate);
        assert!(safety.slot_active);
        assert!(safety.invalid_due_to_invalid_pixels);

        let status = RoiSafetyData {
            quality_class: RoiQualityClass::Low,
            slot_active: true,
            ..Default::default()
        };
        let mut buf = BytesMut::new();
        status.encode(&mut buf).unwrap();
        assert_eq!(u16::from_le_bytes([buf[0], buf[1]]), (3 << 8) | (1 << 10));
    }

    #[test]
    fn roi_element_roundtrip() {
        let element = RoiElement {
            id: 2,
            result: RoiResult {
                task_result: true,
                distance_safe: true,
                ..Default::default()
            },
            safety_data: RoiSafetyData {
                contamination_error: true,
                quality_class: RoiQualityClass::High,
                ..Default::default()
            },
            distance_value: 1234,
        };
        roundtrip(&element, 6);
    }
}
