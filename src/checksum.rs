//! CRC-8 frame checksum
//!
//! Bit-serial polynomial division in normal (non-reflected) representation
//! with a zero initial value. The accumulator is seeded with the first
//! message byte and one implicit zero byte is appended, so the remainder of
//! `message || remainder(message)` under the same division equals the
//! appended byte — which is exactly the check the frame validator performs.

/// CRC-8 remainder of `values` for the given polynomial.
///
/// An empty input yields 0.
pub fn crc8_remainder(values: &[u8], polynomial: u8) -> u8 {
    if values.is_empty() {
        return 0;
    }

    let mut high = values[0];
    // one extra iteration shifts the implicit trailing zero byte through
    for index in 1..=values.len() {
        let mut low = values.get(index).copied().unwrap_or(0);
        for _ in 0..8 {
            let carry_in = low & 0x80 != 0;
            let carry_out = high & 0x80 != 0;
            low <<= 1;
            high = (high << 1) | carry_in as u8;
            if carry_out {
                high ^= polynomial;
            }
        }
    }
    high
}
