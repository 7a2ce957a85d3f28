/// Softcap mechanics: bounded effective stats from unbounded raw totals.

/// Rational softcap: `1 + a·k / (a + k)`.
///
/// Monotonically increasing in `a`, equal to 1 at `a = 0` and strictly below
/// `1 + k` for every finite `a` that f64 can still tell apart from infinity
/// relative to `k`. Negative or NaN raw totals count as 0.
///
/// Evaluated as `k / (1 + k / a)` so an infinite `a` lands on the limit instead
/// of `inf / inf`.
#[inline]
pub fn rational(a: f64, k: f64) -> f64 {
    if !(a > 0.0) || !(k > 0.0) {
        return 1.0;
    }
    1.0 + k / (1.0 + k / a)
}
