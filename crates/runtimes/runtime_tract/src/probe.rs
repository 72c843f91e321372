//! Seeded pseudo-random tensor data for probe inferences

pub struct ProbeInput {
    rng_state: u64,
}

impl ProbeInput {
    pub fn new(seed: u64) -> Self {
        Self {
            // xorshift never leaves zero
            rng_state: seed.max(1),
        }
    }

    /// Next value in `[0, 1)`
    pub fn next_unit(&mut self) -> f32 {
        // Simple xorshift64 PRNG
        self.rng_state ^= self.rng_state << 13;
        self.rng_state ^= self.rng_state >> 7;
        self.rng_state ^= self.rng_state << 17;

        // Top 24 bits fit an f32 mantissa exactly
        (self.rng_state >> 40) as f32 / (1u64 << 24) as f32
    }

    /// `len` values in `[0, 1)`
    pub fn unit_values(&mut self, len: usize) -> Vec<f32> {
        (0..len).map(|_| self.next_unit()).collect()
    }

    /// `len` whole values in `0..=255`
    pub fn byte_values(&mut self, len: usize) -> Vec<f32> {
        (0..len).map(|_| (self.next_unit() * 256.0).floor()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let a = ProbeInput::new(42).unit_values(16);
        let b = ProbeInput::new(42).unit_values(16);
        assert_eq!(a, b);
        assert_ne!(a, ProbeInput::new(7).unit_values(16));
    }

    #[test]
    fn values_stay_in_range() {
        let mut probe = ProbeInput::new(0);
        assert!(probe.unit_values(1000).iter().all(|v| (0.0..1.0).contains(v)));
        assert!(probe
            .byte_values(1000)
            .iter()
            .all(|v| (0.0..=255.0).contains(v) && v.fract() == 0.0));
    }
}
