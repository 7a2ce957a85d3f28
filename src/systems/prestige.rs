// src/systems/prestige.rs
#![cfg(feature = "system-prestige")]

//! Prestige: trade the current run for a permanent production bonus.
//!
//! - Potential level is `floor(sqrt(lifetime / lifetime_unit))`.
//! - Allowed when the potential beats the current level and the balance is at
//!   least `min_balance`.
//! - The new run starts from a fresh snapshot that only keeps the level; the
//!   secondary faucet counter restarts with it.

use crate::config::PrestigeRules;
use crate::error::{Result, SimError};
use crate::state::{GameState, Millis};
use crate::systems::sdk::Env;

#[inline]
pub fn potential_level(lifetime: f64, rules: &PrestigeRules) -> u32 {
    if !(lifetime > 0.0) || !(rules.lifetime_unit > 0.0) {
        return 0;
    }
    (lifetime / rules.lifetime_unit).sqrt().floor().min(u32::MAX as f64) as u32
}

pub fn can_prestige(state: &GameState, env: Env<'_>) -> bool {
    let rules = &env.tuning.prestige;
    potential_level(state.lifetime, rules) > state.prestige_level && state.balance >= rules.min_balance
}

pub fn prestige(state: &GameState, env: Env<'_>, now: Millis) -> Result<GameState> {
    let potential = potential_level(state.lifetime, &env.tuning.prestige);
    if !can_prestige(state, env) {
        return Err(SimError::PrestigeUnavailable { potential, current: state.prestige_level });
    }
    let mut next = GameState::fresh(now);
    next.prestige_level = potential;
    tracing::info!(from = state.prestige_level, to = potential, "prestige");
    Ok(next)
}
