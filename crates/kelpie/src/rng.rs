//! Seeded xorshift64* generator.
//!
//! Layout output must be reproducible for a given seed, so the engine carries
//! its own small PRNG instead of a global entropy source.

#[derive(Debug, Clone)]
pub struct XorShift64Star {
    state: u64,
}

impl XorShift64Star {
    /// Seed 0 is mapped to 1; xorshift has a fixed point at zero.
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed.max(1),
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D_u64)
    }

    /// Uniform in [0, 1) with 53 bits of precision.
    pub fn next_f64_unit(&mut self) -> f64 {
        let u = self.next_u64() >> 11;
        (u as f64) / ((1u64 << 53) as f64)
    }

    /// Uniform in [-1, 1).
    pub fn next_f64_signed(&mut self) -> f64 {
        self.next_f64_unit() * 2.0 - 1.0
    }

    /// Uniform in [lo, hi). Returns `lo` when the range is empty.
    pub fn next_range(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        lo + self.next_f64_unit() * (hi - lo)
    }

    /// A unit-length direction, used as the tie-broken fallback when two
    /// points coincide and no real direction exists.
    pub fn unit_direction(&mut self) -> (f64, f64) {
        let angle = self.next_f64_unit() * std::f64::consts::TAU;
        (angle.cos(), angle.sin())
    }
}
