/// 8-bit xorshift generator used to randomise oscillator start phases
///
/// Full period of 255; zero is a fixed point and must never be used as a
/// seed.
#[derive(Debug, Clone)]
pub struct XorShift8 {
    state: u8,
}

impl XorShift8 {
    pub const DEFAULT_SEED: u8 = 23;

    pub fn new(seed: u8) -> Self {
        Self {
            state: if seed == 0 { Self::DEFAULT_SEED } else { seed },
        }
    }

    #[inline(always)]
    pub fn next_byte(&mut self) -> u8 {
        let mut x = self.state;
        x ^= x << 7;
        x ^= x >> 5;
        x ^= x << 3;
        self.state = x;
        x
    }
}

impl Default for XorShift8 {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_for_seed() {
        let mut a = XorShift8::new(23);
        let mut b = XorShift8::new(23);
        for _ in 0..64 {
            assert_eq!(a.next_byte(), b.next_byte());
        }
    }

    #[test]
    fn test_full_period() {
        let mut rng = XorShift8::default();
        let first = rng.next_byte();
        let mut period = 1;
        while rng.next_byte() != first {
            period += 1;
            assert!(period <= 255);
        }
        assert_eq!(period, 255);
    }

    #[test]
    fn test_zero_seed_replaced() {
        let mut rng = XorShift8::new(0);
        assert_ne!(rng.next_byte(), 0);
    }
}
