//! Q16 fixed-point helpers
//!
//! Gains (envelope multiplier, velocity volume, mixer attenuation) are
//! fractions scaled by 2^16, so `UNITY` is full scale.

/// Full-scale Q16 gain (1.0)
pub const UNITY: i32 = 0x10000;

/// Convert a level in [0.0, 1.0] to a Q16 fraction (truncating)
///
/// Only used when building tables, never on the render path.
pub fn fract16(level: f64) -> i32 {
    (level * 65536.0) as i32
}

/// Signed 32x16 multiply returning the high 32 bits of the 48-bit product
///
/// Only the low 16 bits of `b` take part, interpreted as a signed sample.
#[inline(always)]
pub fn mul_32x16(a: i32, b: i32) -> i32 {
    ((a as i64 * (b as i16) as i64) >> 16) as i32
}

/// Clip an accumulated mix level into the i16 output range
#[inline(always)]
pub fn saturate_i16(level: i32) -> i16 {
    level.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// Volume fraction for a MIDI velocity
///
/// Maps 0..=127 onto 0x200..=0x10000 in steps of 0x200; bit 7 is ignored.
#[inline(always)]
pub fn volume_fraction(velocity: u8) -> i32 {
    ((velocity & 0x7F) as i32 + 1) << 9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fract16_levels() {
        assert_eq!(fract16(1.0), 0x10000);
        assert_eq!(fract16(0.5), 0x8000);
        assert_eq!(fract16(0.6), 39321);
        assert_eq!(fract16(0.0), 0);
    }

    #[test]
    fn test_mul_32x16() {
        assert_eq!(mul_32x16(UNITY, 1000), 1000);
        assert_eq!(mul_32x16(UNITY, -1000), -1000);
        assert_eq!(mul_32x16(0x8000, 1000), 500);
        assert_eq!(mul_32x16(0x8000, -1000), -500);
        assert_eq!(mul_32x16(UNITY, i16::MAX as i32), i16::MAX as i32);
        // Only the low 16 bits of the sample operand count
        assert_eq!(mul_32x16(UNITY, 0x1_0005), 5);
    }

    #[test]
    fn test_saturate() {
        assert_eq!(saturate_i16(40000), i16::MAX);
        assert_eq!(saturate_i16(-40000), i16::MIN);
        assert_eq!(saturate_i16(1234), 1234);
    }

    #[test]
    fn test_volume_fraction_monotonic_and_bounded() {
        let mut previous = 0;
        for velocity in 1..=127u8 {
            let fraction = volume_fraction(velocity);
            assert!(
                fraction > previous,
                "volume fraction not increasing at velocity {}",
                velocity
            );
            assert!((0x400..=UNITY).contains(&fraction));
            previous = fraction;
        }
        assert_eq!(volume_fraction(127), UNITY);
        assert_eq!(volume_fraction(1), 0x400);
        assert_eq!(volume_fraction(0), 0x200);
        assert_eq!(volume_fraction(0xFF), UNITY);
    }
}
