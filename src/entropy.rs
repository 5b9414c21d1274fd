//! Injectable randomness.
//!
//! View counters and prompt session tokens are cosmetic; routing them
//! through `Entropy` keeps them out of any correctness contract and lets
//! tests pin exact values.

use rand::Rng;

pub trait Entropy: Send + Sync {
    /// Uniform pick in `[lo, hi)`.
    fn pick(&self, lo: u32, hi: u32) -> u32;

    /// Opaque token used to ask the upstream model for non-cached output.
    fn session_token(&self) -> String {
        format!("{:08x}{:08x}", self.pick(0, u32::MAX), self.pick(0, u32::MAX))
    }
}

/// Production source backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadEntropy;

impl Entropy for ThreadEntropy {
    fn pick(&self, lo: u32, hi: u32) -> u32 {
        rand::rng().random_range(lo..hi)
    }
}

/// Returns `lo` (clamped to a fixed value) every time; for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedEntropy(pub u32);

impl Entropy for FixedEntropy {
    fn pick(&self, lo: u32, hi: u32) -> u32 {
        self.0.clamp(lo, hi.saturating_sub(1))
    }
}
