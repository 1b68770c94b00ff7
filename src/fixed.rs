//! Fixed-point arithmetic primitives
//!
//! The decoder's hot path compares squared bin magnitudes, so the two
//! operations here have very different precision contracts: [`scaled_mul`]
//! trades exactness for speed and only promises a bounded error, while
//! [`square`] is exact. Threshold derivation must stay on the exact side so
//! the approximation error never compounds into the decision bands.

/// Approximate `(x * y) >> 16`, where `y` encodes the fraction `y / 2^16`.
///
/// Evaluates the byte-wise partial products of `x * y` and drops the
/// low-byte-by-low-byte term entirely, which is what makes it cheap on a
/// machine with an 8x8 multiplier. Contract: the result equals
/// `floor(x * y / 65536)` or is exactly one unit below it, never above.
/// Callers that need the exact product must not use this.
pub fn scaled_mul(x: i16, y: u16) -> i16 {
    let x_lo = (x as u16 & 0xFF) as i32;
    let x_hi = (x >> 8) as i32; // sign-preserving
    let y_lo = (y & 0xFF) as i32;
    let y_hi = (y >> 8) as i32;

    // high*high lands exactly on the >>16 boundary; the two cross terms
    // contribute their high bytes; low*low never reaches the result
    let cross = x_lo * y_hi + x_hi * y_lo;
    (x_hi * y_hi + (cross >> 8)) as i16
}

/// Exact `x * x` widened to `u32`; cannot overflow for any `i16` input.
#[inline]
pub fn square(x: i16) -> u32 {
    (x as i32 * x as i32) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn exact_scaled(x: i16, y: u16) -> i32 {
        ((x as i64 * y as i64) >> 16) as i32
    }

    #[test]
    fn test_square_exact_at_extremes() {
        assert_eq!(square(-32768), 1_073_741_824);
        assert_eq!(square(32767), 1_073_676_289);
        assert_eq!(square(0), 0);
        assert_eq!(square(-1), 1);
        assert_eq!(square(181), 32761);
    }

    #[test]
    fn test_square_matches_widened_reference() {
        for x in (-32768i32..=32767).step_by(17) {
            let x = x as i16;
            assert_eq!(square(x), (x as i64 * x as i64) as u32, "x={}", x);
        }
    }

    #[test]
    fn test_scaled_mul_error_bound_randomized() {
        let mut rng = rand::thread_rng();
        for _ in 0..200_000 {
            let x: i16 = rng.gen();
            let y: u16 = rng.gen();
            let exact = exact_scaled(x, y);
            let approx = scaled_mul(x, y) as i32;
            let err = exact - approx;
            assert!(
                (0..=1).contains(&err),
                "x={} y={} exact={} approx={}",
                x,
                y,
                exact,
                approx
            );
        }
    }

    #[test]
    fn test_scaled_mul_domain_corners() {
        for &x in &[i16::MIN, -1, 0, 1, i16::MAX] {
            for &y in &[0u16, 1, 255, 256, 0x8000, u16::MAX] {
                let exact = exact_scaled(x, y);
                let approx = scaled_mul(x, y) as i32;
                assert!((exact - approx).abs() <= 1, "x={} y={}", x, y);
            }
        }
    }

    #[test]
    fn test_scaled_mul_identity_fractions() {
        // y = 0 is the fraction 0, y = 0x8000 is 1/2
        assert_eq!(scaled_mul(12345, 0), 0);
        let half = scaled_mul(12344, 0x8000) as i32;
        assert!((half - 6172).abs() <= 1);
        let half_neg = scaled_mul(-12344, 0x8000) as i32;
        assert!((half_neg + 6172).abs() <= 1);
    }
}
