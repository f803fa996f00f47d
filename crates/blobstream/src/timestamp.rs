//! Device timestamp decoding.
//!
//! The 64-bit device timestamp packs a civil date and time, MSB to LSB:
//! 5 unused, 12 year, 4 month, 5 day, 11 timezone, 5 hour, 6 minute,
//! 6 second, 10 millisecond.

use chrono::{LocalResult, NaiveDate, TimeZone};

/// The packed fields of a device timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampParts {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub timezone: u16,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millisecond: u16,
}

/// Split a raw device timestamp into its fields.
pub fn split_timestamp(timestamp: u64) -> TimestampParts {
    TimestampParts {
        millisecond: (timestamp & 0x3FF) as u16,
        second: ((timestamp >> 10) & 0x3F) as u8,
        minute: ((timestamp >> 16) & 0x3F) as u8,
        hour: ((timestamp >> 22) & 0x1F) as u8,
        timezone: ((timestamp >> 27) & 0x7FF) as u16,
        day: ((timestamp >> 38) & 0x1F) as u8,
        month: ((timestamp >> 43) & 0xF) as u8,
        year: ((timestamp >> 47) & 0xFFF) as u16,
    }
}

/// Pack timestamp fields into the device layout.
pub fn pack_timestamp(parts: TimestampParts) -> u64 {
    (parts.millisecond as u64 & 0x3FF)
        | ((parts.second as u64 & 0x3F) << 10)
        | ((parts.minute as u64 & 0x3F) << 16)
        | ((parts.hour as u64 & 0x1F) << 22)
        | ((parts.timezone as u64 & 0x7FF) << 27)
        | ((parts.day as u64 & 0x1F) << 38)
        | ((parts.month as u64 & 0xF) << 43)
        | ((parts.year as u64 & 0xFFF) << 47)
}

/// Convert a device timestamp to UTC epoch milliseconds, interpreting the
/// civil fields in the given zone. Returns `None` for dates the calendar
/// rejects.
pub fn timestamp_to_millis_in<Tz: TimeZone>(timestamp: u64, zone: &Tz) -> Option<u64> {
    let parts = split_timestamp(timestamp);
    let naive = NaiveDate::from_ymd_opt(parts.year as i32, parts.month as u32, parts.day as u32)?
        .and_hms_opt(parts.hour as u32, parts.minute as u32, parts.second as u32)?;
    let local = match zone.from_local_datetime(&naive) {
        LocalResult::Single(datetime) => datetime,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => return None,
    };
    let millis = local.timestamp_millis();
    if millis < 0 {
        return None;
    }
    Some(millis as u64 + parts.millisecond as u64)
}

/// Convert a device timestamp to UTC epoch milliseconds using the local
/// zone, as the device clock is configured against it.
pub fn timestamp_to_millis(timestamp: u64) -> Option<u64> {
    timestamp_to_millis_in(timestamp, &chrono::Local)
}
