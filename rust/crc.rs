//! Checksum for Razer battery feature reports
//!
//! XOR over bytes 2..=87 of the 90-byte report buffer. Firmware rejects
//! frames whose byte 88 does not match.
//!
//! Processes 8 bytes at a time as a u64, then folds the accumulator down
//! to a single byte.

/// First byte covered by the checksum.
pub const CRC_START: usize = 2;
/// One past the last byte covered by the checksum.
pub const CRC_END: usize = 88;

/// XOR checksum of `buf[2..88]`.
///
/// `buf` must be at least 88 bytes long.
#[inline]
pub fn report_crc(buf: &[u8]) -> u8 {
    // 86 bytes: 10 u64 words plus 6 trailing bytes
    let slice = &buf[CRC_START..CRC_END];

    let mut acc: u64 = 0;
    let chunks = slice.chunks_exact(8);
    let remainder = chunks.remainder();

    for chunk in chunks {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        acc ^= u64::from_ne_bytes(word);
    }

    let folded = acc.to_ne_bytes().iter().fold(0u8, |crc, &b| crc ^ b);
    remainder.iter().fold(folded, |crc, &b| crc ^ b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc_zeros() {
        let buf = [0u8; 90];
        assert_eq!(report_crc(&buf), 0);
    }

    #[test]
    fn test_crc_ignores_status_and_tag() {
        let mut buf = [0u8; 90];
        buf[0] = 0xFF;
        buf[1] = 0x1F;
        assert_eq!(report_crc(&buf), 0);
    }

    #[test]
    fn test_crc_includes_last_payload_byte() {
        let mut buf = [0u8; 90];
        buf[87] = 0x5A;
        assert_eq!(report_crc(&buf), 0x5A);
    }

    #[test]
    fn test_crc_ignores_trailer() {
        let mut buf = [0u8; 90];
        buf[88] = 0xFF;
        buf[89] = 0xFF;
        assert_eq!(report_crc(&buf), 0);
    }

    #[test]
    fn test_crc_battery_header() {
        let mut buf = [0u8; 90];
        buf[5] = 0x02;
        buf[6] = 0x07;
        buf[7] = 0x80;
        // 0x02 ^ 0x07 ^ 0x80
        assert_eq!(report_crc(&buf), 0x85);
    }

    #[test]
    fn test_crc_matches_naive() {
        let buf: Vec<u8> = (0..90).map(|i| (i * 7 + 13) as u8).collect();
        let naive: u8 = buf[2..=87].iter().fold(0, |acc, &b| acc ^ b);
        assert_eq!(report_crc(&buf), naive);
    }
}
