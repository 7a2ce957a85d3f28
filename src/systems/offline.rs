//! Offline accrual: a one-shot grant for time spent away.

use crate::config::OfflineAccrual;
use crate::mechanics::control;
use crate::state::{GameState, Millis};
use crate::systems::economy;
use crate::systems::sdk::Env;

/// Fraction of normal production paid for an absence of `secs` (already
/// capped). Flat up to `short_secs`, then linear down to `ratio_cap` at
/// `max_secs`.
pub fn offline_ratio(secs: f64, cfg: &OfflineAccrual) -> f64 {
    let t = control::progress_between(secs, cfg.short_secs as f64, cfg.max_secs as f64);
    let lo = cfg.ratio_cap.min(cfg.ratio_short);
    let hi = cfg.ratio_cap.max(cfg.ratio_short);
    control::approach(cfg.ratio_short, cfg.ratio_cap, t, lo, hi)
}

/// Result of an offline claim.
#[derive(Clone, Debug, PartialEq)]
pub struct OfflineGrant {
    pub state: GameState,
    pub amount: f64,
    /// Absence that was paid for, after the cap.
    pub paid_secs: f64,
}

/// Convert the unclaimed absence since the last commit into currency.
/// Returns `None` when the absence is too short or already claimed. The
/// claimed-through stamp moves to `now`, so the same gap never pays twice.
pub fn offline_grant(state: &GameState, env: Env<'_>, now: Millis) -> Option<OfflineGrant> {
    let cfg = &env.tuning.offline;
    let since = state.offline.last_seen.max(state.offline.claimed_through);
    let gap_ms = now.checked_sub(since)?;
    let secs = gap_ms as f64 / 1_000.0;
    if secs <= cfg.min_secs as f64 {
        return None;
    }
    let paid_secs = secs.min(cfg.max_secs as f64);
    let rate = economy::rates(state, env, since).base_production;
    let amount = rate * paid_secs * offline_ratio(paid_secs, cfg);

    let mut next = state.clone();
    next.offline.claimed_through = now;
    next.offline.last_seen = now;
    if amount > 0.0 && amount.is_finite() {
        next.earn(amount);
        next.offline.ever_collected = true;
    }
    Some(OfflineGrant { state: next, amount, paid_secs })
}
