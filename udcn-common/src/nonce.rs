//! Pluggable Interest nonce source.
//!
//! The source seeds its PRNG from `0` in tests and from a platform timer in
//! production. Rather than hard-coding either, `NonceSource` is a trait; a
//! fixed seed gives byte-exact, reproducible Interest encodings for tests,
//! while `Xorshift32::from_entropy` gives a reasonable production default.

use std::time::{SystemTime, UNIX_EPOCH};

pub trait NonceSource: Send {
    fn next_nonce(&mut self) -> u32;
}

/// A small, fast, non-cryptographic PRNG — sufficient for Interest nonce
/// de-duplication, which needs uniqueness, not unpredictability.
pub struct Xorshift32 {
    state: u32,
}

impl Xorshift32 {
    /// `seed` must be non-zero; zero is remapped to a fixed non-zero value
    /// since xorshift has a fixed point at zero.
    pub fn seeded(seed: u32) -> Self {
        Self { state: if seed == 0 { 0x9e3779b9 } else { seed } }
    }

    pub fn from_entropy() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0x2545F491);
        Self::seeded(nanos)
    }
}

impl NonceSource for Xorshift32 {
    fn next_nonce(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
}
