//! Secondary currency: faucet bookkeeping and staking.

use crate::config::Faucet;
use crate::error::{Result, SimError};
use crate::mechanics::control::round6;
use crate::state::GameState;

/// Units the faucet owes for a lifetime total: `floor(lifetime / per_lifetime)`.
#[inline]
pub fn mintable_units(lifetime: f64, faucet: &Faucet) -> u64 {
    if !(lifetime > 0.0) || !(faucet.per_lifetime > 0.0) {
        return 0;
    }
    (lifetime / faucet.per_lifetime).floor() as u64
}

/// Credit every unit owed beyond the minted counter. The counter only moves
/// forward, so recomputing from the same lifetime never mints twice.
/// Returns the number of units minted.
pub fn mint(state: &mut GameState, faucet: &Faucet) -> u64 {
    let owed = mintable_units(state.lifetime, faucet);
    let minted = state.secondary.minted_units;
    if owed <= minted {
        return 0;
    }
    let units = owed - minted;
    state.secondary.minted_units = owed;
    state.secondary.balance = round6(state.secondary.balance + units as f64 * faucet.unit_amount);
    units
}

/// Move `amount` from the secondary balance into the stake.
pub fn stake(state: &GameState, amount: f64) -> Result<GameState> {
    let amount = round6(amount);
    if !(amount > 0.0) {
        return Ok(state.clone());
    }
    if state.secondary.balance + 1e-9 < amount {
        return Err(SimError::InsufficientSecondary { needed: amount, available: state.secondary.balance });
    }
    let mut next = state.clone();
    next.secondary.balance = round6((next.secondary.balance - amount).max(0.0));
    next.secondary.staked = round6(next.secondary.staked + amount);
    Ok(next)
}

/// Move `amount` out of the stake back into the balance.
pub fn unstake(state: &GameState, amount: f64) -> Result<GameState> {
    let amount = round6(amount);
    if !(amount > 0.0) {
        return Ok(state.clone());
    }
    if state.secondary.staked + 1e-9 < amount {
        return Err(SimError::InsufficientSecondary { needed: amount, available: state.secondary.staked });
    }
    let mut next = state.clone();
    next.secondary.staked = round6((next.secondary.staked - amount).max(0.0));
    next.secondary.balance = round6(next.secondary.balance + amount);
    Ok(next)
}
