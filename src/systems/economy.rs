//! Resource & multiplier model.
//!
//! Pure functions from owned counts and purchased modifiers to the production
//! rate and the value of one click.

use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::{Category, ModifierTarget};
use crate::mechanics::softcap;
use crate::state::{Axis, GameState, Millis};
use crate::systems::sdk::Env;

/// Multiplier for one producer: purchased modifiers targeting it (or `All`)
/// multiply in, then every synergy rule targeting it adds its bonus.
pub fn per_producer_multiplier(
    env: Env<'_>,
    owned: &BTreeMap<String, u32>,
    modifiers: &BTreeSet<String>,
    producer: &str,
) -> f64 {
    let from_modifiers = modifiers
        .iter()
        .filter_map(|id| env.catalog.modifier(id))
        .filter(|m| match &m.target {
            ModifierTarget::All => true,
            ModifierTarget::Producer(p) => p == producer,
            ModifierTarget::Click => false,
        })
        .fold(1.0, |acc, m| acc * m.multiplier);

    env.catalog
        .synergies
        .iter()
        .filter(|s| s.target == producer)
        .fold(from_modifiers, |acc, s| {
            let n = owned.get(&s.source).copied().unwrap_or(0);
            acc * (1.0 + s.per_unit * f64::from(n))
        })
}

/// Σ owned × output × multiplier over passive producers, then the prestige
/// bonus and the stake multiplier. Linear in both trailing factors.
pub fn production_rate(
    env: Env<'_>,
    owned: &BTreeMap<String, u32>,
    modifiers: &BTreeSet<String>,
    prestige_level: u32,
    stake_multiplier: f64,
) -> f64 {
    let base: f64 = env
        .catalog
        .producers
        .iter()
        .filter(|p| p.category == Category::Passive)
        .map(|p| {
            let n = owned.get(&p.id).copied().unwrap_or(0);
            if n == 0 {
                return 0.0;
            }
            f64::from(n) * p.output * per_producer_multiplier(env, owned, modifiers, &p.id)
        })
        .sum();
    base * (1.0 + f64::from(prestige_level) * env.tuning.prestige_bonus) * stake_multiplier
}

/// Softcapped click multiplier. The raw total `A` is additive over click
/// producers; the result is `1 + A·K/(A+K)`.
pub fn click_multiplier(env: Env<'_>, owned: &BTreeMap<String, u32>, modifiers: &BTreeSet<String>) -> f64 {
    let raw: f64 = env
        .catalog
        .producers
        .iter()
        .filter(|p| p.category == Category::Click)
        .map(|p| {
            let n = owned.get(&p.id).copied().unwrap_or(0);
            f64::from(n) * p.output * per_producer_multiplier(env, owned, modifiers, &p.id)
        })
        .sum();
    softcap::rational(raw, env.tuning.softcap_k)
}

#[inline]
pub fn stake_multiplier(staked: f64, bonus: f64) -> f64 {
    1.0 + staked.max(0.0) * bonus
}

/// Value of one click right now: base × softcapped power × click modifiers ×
/// live click effect.
pub fn click_value(state: &GameState, env: Env<'_>, now: Millis) -> f64 {
    let modifier_mult = state
        .modifiers
        .iter()
        .filter_map(|id| env.catalog.modifier(id))
        .filter(|m| m.target == ModifierTarget::Click)
        .fold(1.0, |acc, m| acc * m.multiplier);
    env.tuning.base_click
        * click_multiplier(env, &state.owned, &state.modifiers)
        * modifier_mult
        * state.effects.multiplier(Axis::Click, now)
}

/// Live rates derived from a snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rates {
    /// Production per second without temporary effects.
    pub base_production: f64,
    /// Production per second including the live production effect.
    pub production: f64,
    pub click: f64,
}

pub fn rates(state: &GameState, env: Env<'_>, now: Millis) -> Rates {
    let base_production = production_rate(
        env,
        &state.owned,
        &state.modifiers,
        state.prestige_level,
        stake_multiplier(state.secondary.staked, env.tuning.stake_bonus),
    );
    Rates {
        base_production,
        production: base_production * state.effects.multiplier(Axis::Production, now),
        click: click_value(state, env, now),
    }
}

/// One click: credit the click value and count it.
pub fn click(state: &GameState, env: Env<'_>, now: Millis) -> GameState {
    let mut next = state.clone();
    next.earn(click_value(state, env, now));
    next.clicks += 1;
    next
}
