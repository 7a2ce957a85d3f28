/// Pricing mechanics: geometric bulk cost, milestone steepening, discounts.

use serde::{Deserialize, Serialize};

/// One price step: once `owned >= at`, prices are multiplied by `factor`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MilestoneStep {
    pub at: u32,
    pub factor: f64,
}

/// Cost of `count` units bought after `owned` units:
/// `base · growth^owned · (growth^count − 1) / (growth − 1)`.
///
/// Requires `growth > 1`; callers validate the catalog first. Exponents are
/// taken as `f64`, so huge counts saturate to `+inf` rather than wrapping.
#[inline]
pub fn geometric_series_cost(base: f64, growth: f64, owned: u32, count: u32) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let series = (growth.powf(f64::from(count)) - 1.0) / (growth - 1.0);
    base * growth.powf(f64::from(owned)) * series
}

/// Cumulative product of every step whose threshold `owned` has reached.
/// Non-decreasing in `owned` as long as every factor is ≥ 1.
#[inline]
pub fn milestone_factor(owned: u32, steps: &[MilestoneStep]) -> f64 {
    steps
        .iter()
        .filter(|s| owned >= s.at)
        .fold(1.0, |m, s| m * s.factor.max(1.0))
}

/// Price after a fractional discount in [0, 1).
#[inline]
pub fn apply_discount(price: f64, fraction: f64) -> f64 {
    price * (1.0 - fraction.clamp(0.0, 0.99))
}

/// Whole-currency price, rounded up. Tiny float noise below an integer does not
/// bump the price to the next unit.
#[inline]
pub fn round_up(price: f64) -> f64 {
    if price <= 0.0 {
        return 0.0;
    }
    (price - 1e-9).ceil()
}
