/// Control mechanics: proportional moves and rounding.

/// Proportional approach: x' = clamp(x + k * (target - x)).
/// With `k` in [0, 1] this is a clamped linear interpolation from `x` to `target`.
#[inline]
pub fn approach(x: f64, target: f64, k: f64, lo: f64, hi: f64) -> f64 {
    (x + k * (target - x)).clamp(lo, hi)
}

/// Fraction of the way `x` sits between `from` and `to`, clamped to [0, 1].
#[inline]
pub fn progress_between(x: f64, from: f64, to: f64) -> f64 {
    if to <= from {
        return if x >= to { 1.0 } else { 0.0 };
    }
    ((x - from) / (to - from)).clamp(0.0, 1.0)
}

/// Round to 6 decimals (secondary-currency precision).
#[inline]
pub fn round6(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}
