//! Pricing engine and purchases.

use crate::catalog::ModifierDef;
use crate::error::{Result, SimError};
use crate::mechanics::pricing::{apply_discount, geometric_series_cost, milestone_factor, round_up};
use crate::state::{GameState, Millis};
use crate::systems::sdk::Env;

/// Price of `count` more units of `producer`: geometric series × milestone
/// factor (at the current owned count), minus the live reward discount and any
/// flash sale on this producer, rounded up. `count == 0` costs 0.
pub fn cost_of(state: &GameState, env: Env<'_>, producer: &str, count: u32, now: Millis) -> Result<f64> {
    let def = env
        .catalog
        .producer(producer)
        .ok_or_else(|| SimError::UnknownProducer(producer.to_string()))?;
    if count == 0 {
        return Ok(0.0);
    }
    let owned = state.owned(producer);
    let raw = geometric_series_cost(def.base_cost, def.growth, owned, count)
        * milestone_factor(owned, &env.tuning.milestones);

    let flash = state
        .flash_sale
        .as_ref()
        .filter(|s| s.producer == producer && now < s.expires_at)
        .map_or(0.0, |s| s.discount);
    let price = apply_discount(apply_discount(raw, state.effects.discount(now)), flash);
    Ok(round_up(price))
}

/// Buy `count` units. Insufficient funds or an owned count past `u32::MAX`
/// leave the snapshot untouched.
pub fn buy_producer(state: &GameState, env: Env<'_>, producer: &str, count: u32, now: Millis) -> Result<GameState> {
    let cost = cost_of(state, env, producer, count, now)?;
    if count == 0 {
        return Ok(state.clone());
    }
    let owned = state.owned(producer);
    let total = owned
        .checked_add(count)
        .ok_or_else(|| SimError::QuantityOverflow { producer: producer.to_string(), owned, count })?;
    if state.balance < cost {
        tracing::debug!(producer, count, cost, balance = state.balance, "purchase rejected");
        return Err(SimError::InsufficientFunds { needed: cost, available: state.balance });
    }

    let mut next = state.clone();
    next.balance = (next.balance - cost).max(0.0);
    next.owned.insert(producer.to_string(), total);
    mark_purchase(&mut next, now);
    tracing::debug!(producer, count, cost, "producer bought");
    Ok(next)
}

pub fn is_unlocked(state: &GameState, def: &ModifierDef) -> bool {
    def.unlock.holds(state)
}

/// Buy a one-off modifier.
pub fn buy_modifier(state: &GameState, env: Env<'_>, id: &str, now: Millis) -> Result<GameState> {
    let def = env
        .catalog
        .modifier(id)
        .ok_or_else(|| SimError::UnknownModifier(id.to_string()))?;
    if state.modifiers.contains(id) {
        return Err(SimError::ModifierOwned(id.to_string()));
    }
    if !is_unlocked(state, def) {
        return Err(SimError::ModifierLocked(id.to_string()));
    }
    let cost = round_up(apply_discount(def.cost, state.effects.discount(now)));
    if state.balance < cost {
        return Err(SimError::InsufficientFunds { needed: cost, available: state.balance });
    }

    let mut next = state.clone();
    next.balance = (next.balance - cost).max(0.0);
    next.modifiers.insert(id.to_string());
    mark_purchase(&mut next, now);
    tracing::debug!(modifier = id, cost, "modifier bought");
    Ok(next)
}

/// Any purchase resets the idle timer and ends a running flash sale.
fn mark_purchase(state: &mut GameState, now: Millis) {
    state.last_purchase_at = now;
    state.flash_sale = None;
}
