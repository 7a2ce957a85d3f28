//! Tick accumulator.
//!
//! Production is sampled at a short fixed interval into a volatile buffer and
//! committed to the authoritative snapshot at a longer one, or immediately when
//! a secondary unit becomes mintable or a temporary effect runs out. The buffer
//! lives only in memory; a fresh accumulator primes its clock on the first
//! sample so restarts never replay elapsed time (offline accrual covers that).

use crate::state::{GameState, Millis};
use crate::systems::economy;
use crate::systems::sdk::Env;
use crate::systems::secondary;

/// Buffered, uncommitted deltas.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pending {
    pub balance: f64,
    pub lifetime: f64,
    /// Milliseconds of production covered by the buffer.
    pub covered_ms: u64,
}

impl Pending {
    pub fn is_empty(&self) -> bool {
        self.covered_ms == 0 && self.balance == 0.0
    }
}

/// Why a sample asked for a commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitReason {
    Interval,
    Mint,
    EffectExpired,
}

#[derive(Clone, Debug, Default)]
pub struct TickAccumulator {
    last_sample: Option<Millis>,
    last_commit: Millis,
    pending: Pending,
}

impl TickAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Pending {
        self.pending
    }

    /// Sample production since the previous sample. Returns the reason a
    /// commit is due, if any. Calls closer together than the tick interval
    /// are ignored.
    pub fn sample(&mut self, state: &GameState, env: Env<'_>, now: Millis) -> Option<CommitReason> {
        let Some(prev) = self.last_sample else {
            self.last_sample = Some(now);
            self.last_commit = now;
            return None;
        };
        let timing = env.tuning.loop_timing;
        let elapsed = now.saturating_sub(prev);
        if elapsed < timing.tick_ms {
            return None;
        }
        self.last_sample = Some(now);

        // Full gap credited: N short samples add up to one long one.
        let rate = economy::rates(state, env, prev).production;
        let delta = rate * elapsed as f64 / 1_000.0;
        if delta.is_finite() && delta > 0.0 {
            self.pending.balance += delta;
            self.pending.lifetime += delta;
        }
        self.pending.covered_ms += elapsed;

        let lifetime = state.lifetime + self.pending.lifetime;
        if secondary::mintable_units(lifetime, &env.tuning.faucet) > state.secondary.minted_units {
            return Some(CommitReason::Mint);
        }
        if state.effects.any_expired(now) {
            return Some(CommitReason::EffectExpired);
        }
        if now.saturating_sub(self.last_commit) >= timing.commit_ms {
            return Some(CommitReason::Interval);
        }
        None
    }

    /// Drain the buffer into a new snapshot.
    pub fn flush(&mut self, state: &GameState, env: Env<'_>, now: Millis) -> GameState {
        let pending = std::mem::take(&mut self.pending);
        self.last_commit = now;
        commit(state, pending, env, now)
    }

    /// Drop buffered deltas and re-prime the clock (used on reset and prestige).
    pub fn discard(&mut self) {
        *self = Self::default();
    }
}

/// Apply buffered deltas, mint what the faucet owes, clear expired effects and
/// stamp the last-seen time. All in one new snapshot.
pub fn commit(state: &GameState, pending: Pending, env: Env<'_>, now: Millis) -> GameState {
    let mut next = state.clone();
    next.earn(pending.balance);

    let minted = secondary::mint(&mut next, &env.tuning.faucet);
    if minted > 0 {
        tracing::debug!(minted, total = next.secondary.minted_units, "secondary units minted");
    }
    if next.effects.clear_expired(now) {
        tracing::debug!("temporary effect expired");
    }
    if next.flash_sale.as_ref().is_some_and(|s| now >= s.expires_at) {
        next.flash_sale = None;
    }
    next.offline.last_seen = now;
    next.offline.claimed_through = next.offline.claimed_through.max(now);
    next
}
