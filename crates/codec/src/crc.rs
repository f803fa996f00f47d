//! CRC-32 and CRC-32C blocks in the device's non-complemented convention.
//!
//! Both functions return the raw remainder so callers can either chain
//! chunks or apply the final complement where the protocol stores the
//! complemented form (blob segments store `!crc32_block(..)`, UDP fragment
//! trailers store `!crc32c_block(..)`).

/// Default initial value for both checksum flavors.
pub const CRC_DEFAULT_INIT: u32 = 0xFFFF_FFFF;

/// CRC-32 (reflected polynomial 0xEDB88320) over `data`, seeded with
/// `init`, without the final complement.
pub fn crc32_block(data: &[u8], init: u32) -> u32 {
    // crc32fast resumes from finalized values; map in and out of that domain.
    let mut hasher = crc32fast::Hasher::new_with_initial(!init);
    hasher.update(data);
    !hasher.finalize()
}

/// CRC-32C (reflected Castagnoli polynomial 0x82F63B78) over `data`,
/// seeded with `init`, without the final complement.
pub fn crc32c_block(data: &[u8], init: u32) -> u32 {
    !crc32c::crc32c_append(!init, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_block_returns_init() {
        assert_eq!(crc32_block(&[], CRC_DEFAULT_INIT), CRC_DEFAULT_INIT);
        assert_eq!(crc32_block(&[], 0x1234_5678), 0x1234_5678);
        assert_eq!(crc32c_block(&[], CRC_DEFAULT_INIT), CRC_DEFAULT_INIT);
    }

    #[test]
    fn complemented_form_matches_reference_vectors() {
        // Standard check value for "123456789" is 0xCBF43926 (CRC-32) and
        // 0xE3069283 (CRC-32C); both include the final complement.
        assert_eq!(!crc32_block(b"123456789", CRC_DEFAULT_INIT), 0xCBF4_3926);
        assert_eq!(!crc32c_block(b"123456789", CRC_DEFAULT_INIT), 0xE306_9283);
    }

    #[test]
    fn chunked_computation_matches_one_shot() {
        let data = b"the quick brown fox jumps over the lazy dog";
        for split in [0, 1, 7, 20, data.len()] {
            let (a, b) = data.split_at(split);
            let chained = crc32_block(b, crc32_block(a, CRC_DEFAULT_INIT));
            assert_eq!(chained, crc32_block(data, CRC_DEFAULT_INIT));

            let chained = crc32c_block(b, crc32c_block(a, CRC_DEFAULT_INIT));
            assert_eq!(chained, crc32c_block(data, CRC_DEFAULT_INIT));
        }
    }
}
