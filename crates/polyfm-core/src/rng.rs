//! Allocation-free pseudo-random numbers for the audio thread.

/// Xorshift32 generator.
///
/// Cheap enough to call while a note is being allocated on the render
/// path. Not suitable for anything but audio jitter.
#[derive(Debug, Clone)]
pub struct Xorshift32 {
    state: u32,
}

impl Xorshift32 {
    /// Create a generator. A zero seed is replaced, since xorshift never
    /// leaves the all-zero state.
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x12345678 } else { seed },
        }
    }

    /// Next raw 32-bit value.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Next value uniformly spread over `[-1, 1]`.
    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        // 24 bits fit an f32 mantissa exactly
        let unit = (self.next_u32() >> 8) as f32 / ((1_u32 << 24) - 1) as f32;
        2.0 * unit - 1.0
    }
}

impl Default for Xorshift32 {
    fn default() -> Self {
        Self::new(0x12345678)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bipolar_range() {
        let mut rng = Xorshift32::new(1);
        for _ in 0..10000 {
            let x = rng.next_bipolar();
            assert!((-1.0..=1.0).contains(&x), "out of range: {}", x);
        }
    }

    #[test]
    fn test_bipolar_covers_both_signs() {
        let mut rng = Xorshift32::default();
        let (mut neg, mut pos) = (0, 0);
        for _ in 0..1000 {
            if rng.next_bipolar() < 0.0 {
                neg += 1;
            } else {
                pos += 1;
            }
        }
        assert!(neg > 400 && pos > 400, "neg={} pos={}", neg, pos);
    }

    #[test]
    fn test_zero_seed_is_replaced() {
        let mut rng = Xorshift32::new(0);
        assert_ne!(rng.next_u32(), 0);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = Xorshift32::new(42);
        let mut b = Xorshift32::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }
}
