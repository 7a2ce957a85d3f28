/// Stochastic mechanics: RNG helpers for reward rolls and scheduler picks.
/// Note: uses `bevy_prng::WyRand` behind `RefCell` so one seeded stream can be
/// shared by several subsystems.
use bevy_prng::WyRand;
use rand_core::RngCore;
use std::cell::RefCell;

/// Uniform in [0, 1) with 53 bits of precision.
#[inline]
pub fn uniform01(rng: &RefCell<WyRand>) -> f64 {
    let mut r = rng.borrow_mut();
    ((r.next_u64() >> 11) as f64) / ((1u64 << 53) as f64)
}

/// Uniform in [lo, hi).
#[inline]
pub fn uniform(rng: &RefCell<WyRand>, lo: f64, hi: f64) -> f64 {
    lo + uniform01(rng) * (hi - lo)
}

/// Bernoulli(p) with WyRand.
#[inline]
pub fn bernoulli(rng: &RefCell<WyRand>, p: f64) -> bool {
    uniform01(rng) < p.clamp(0.0, 1.0)
}

/// Uniform index in [0, len). `len` must be non-zero.
#[inline]
pub fn index(rng: &RefCell<WyRand>, len: usize) -> usize {
    ((uniform01(rng) * len as f64) as usize).min(len.saturating_sub(1))
}
