// src/systems/golden.rs
#![cfg(feature = "system-golden")]

//! Golden events: every couple of minutes a golden cookie is catchable for a
//! few seconds. Catching it rolls one of four payouts:
//! - frenzy: production multiplier for a short window
//! - click frenzy: click multiplier for a shorter window
//! - lucky: a lump sum sized on the bank or the production rate
//! - crumbs: a burst worth a fixed number of clicks
//!
//! Catches in quick succession stack diminishing returns (`dr_factor ^ stacks`)
//! on every payout but crumbs. Multipliers go through the same merge as
//! objective rewards, so they never stack twice on one axis.

use std::cell::RefCell;
use std::rc::Rc;

use bevy_prng::WyRand;

use crate::config::GoldenEvents;
use crate::error::{Result, SimError};
use crate::mechanics::stoch;
use crate::missions::rewards::{merge_effect, EffectGrant};
use crate::state::{Axis, GameState, GoldenLedger, Millis};
use crate::systems::economy;
use crate::systems::sdk::{Env, Notify, System, Tone};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GoldenOutcome {
    Frenzy { multiplier: f64, duration_ms: u64 },
    ClickFrenzy { multiplier: f64, duration_ms: u64 },
    Lucky { amount: f64 },
    Crumbs { amount: f64 },
}

impl GoldenOutcome {
    pub fn describe(&self) -> String {
        match self {
            Self::Frenzy { multiplier, duration_ms } => {
                format!("Frenzy: production x{multiplier:.2} for {}s", duration_ms / 1_000)
            }
            Self::ClickFrenzy { multiplier, duration_ms } => {
                format!("Click frenzy: clicks x{multiplier:.2} for {}s", duration_ms / 1_000)
            }
            Self::Lucky { amount } => format!("Lucky! +{amount:.0}"),
            Self::Crumbs { amount } => format!("Crumb shower +{amount:.0}"),
        }
    }
}

/// Stack count for a catch at `now`: one more than the last catch when it
/// falls inside the window, otherwise back to zero.
pub fn stacks_at(ledger: &GoldenLedger, now: Millis, cfg: &GoldenEvents) -> u32 {
    match ledger.last_caught_at {
        Some(last) if now.saturating_sub(last) < cfg.dr_window_ms => ledger.stacks.saturating_add(1),
        _ => 0,
    }
}

#[inline]
pub fn diminishing(stacks: u32, cfg: &GoldenEvents) -> f64 {
    cfg.dr_factor.powf(f64::from(stacks))
}

/// Payout for a roll in [0, 1) against the cumulative weights.
pub fn outcome_for(roll: f64, stacks: u32, state: &GameState, env: Env<'_>, now: Millis) -> GoldenOutcome {
    let cfg = &env.tuning.golden;
    let dr = diminishing(stacks, cfg);
    let total: f64 = cfg.weights.iter().sum();
    let mut at = roll * total;
    let mut pick = cfg.weights.len() - 1;
    for (i, w) in cfg.weights.iter().enumerate() {
        if at < *w {
            pick = i;
            break;
        }
        at -= *w;
    }

    let rates = economy::rates(state, env, now);
    match pick {
        0 => GoldenOutcome::Frenzy {
            multiplier: (cfg.frenzy_max * dr).clamp(1.0, cfg.frenzy_max.max(1.0)),
            duration_ms: cfg.frenzy_secs * 1_000,
        },
        1 => GoldenOutcome::ClickFrenzy {
            multiplier: (cfg.click_frenzy_max * dr).clamp(1.0, cfg.click_frenzy_max.max(1.0)),
            duration_ms: cfg.click_frenzy_secs * 1_000,
        },
        2 => {
            let base = (state.balance * cfg.lucky_balance).max(rates.base_production * cfg.lucky_rate_secs);
            GoldenOutcome::Lucky { amount: base * dr }
        }
        _ => GoldenOutcome::Crumbs { amount: rates.click * cfg.crumb_clicks },
    }
}

/// Apply `outcome` caught at `now` with `stacks`, and clear the event.
pub fn apply_outcome(state: &GameState, env: Env<'_>, outcome: &GoldenOutcome, stacks: u32, now: Millis) -> GameState {
    let mut next = state.clone();
    let boost = match *outcome {
        GoldenOutcome::Frenzy { multiplier, duration_ms } => Some(EffectGrant { axis: Axis::Production, multiplier, duration_ms }),
        GoldenOutcome::ClickFrenzy { multiplier, duration_ms } => Some(EffectGrant { axis: Axis::Click, multiplier, duration_ms }),
        GoldenOutcome::Lucky { amount } | GoldenOutcome::Crumbs { amount } => {
            next.earn(amount);
            None
        }
    };
    if let Some(grant) = boost {
        let slot = next.effects.get_mut(grant.axis);
        let merged = merge_effect(slot.as_ref(), &grant, &outcome.describe(), now, &env.tuning.effects);
        *slot = Some(merged);
    }
    next.golden = GoldenLedger {
        visible_until: None,
        stacks,
        last_caught_at: Some(now),
        caught: state.golden.caught + 1,
    };
    next
}

/// Catch the visible golden event.
pub fn catch(state: &GameState, env: Env<'_>, now: Millis, rng: &RefCell<WyRand>) -> Result<(GameState, GoldenOutcome)> {
    if !state.golden.is_visible(now) {
        return Err(SimError::GoldenUnavailable);
    }
    let stacks = stacks_at(&state.golden, now, &env.tuning.golden);
    let outcome = outcome_for(stoch::uniform01(rng), stacks, state, env, now);
    tracing::debug!(?outcome, stacks, "golden event caught");
    Ok((apply_outcome(state, env, &outcome, stacks, now), outcome))
}

/// Spawns golden events and lets uncaught ones fade.
pub struct GoldenScheduler {
    rng: Rc<RefCell<WyRand>>,
    next_spawn_at: Option<Millis>,
}

impl GoldenScheduler {
    pub fn new(rng: Rc<RefCell<WyRand>>) -> Self {
        Self { rng, next_spawn_at: None }
    }

    fn delay(&self, cfg: &GoldenEvents) -> Millis {
        if cfg.spawn_max_ms <= cfg.spawn_min_ms {
            return cfg.spawn_min_ms;
        }
        stoch::uniform(&self.rng, cfg.spawn_min_ms as f64, cfg.spawn_max_ms as f64) as Millis
    }
}

impl System for GoldenScheduler {
    fn name(&self) -> &'static str {
        "golden"
    }

    fn step(&mut self, state: &GameState, env: Env<'_>, now: Millis, sink: &mut dyn Notify) -> Option<GameState> {
        let cfg = &env.tuning.golden;
        match state.golden.visible_until {
            Some(until) if now < until => None,
            Some(_) => {
                let mut next = state.clone();
                next.golden.visible_until = None;
                self.next_spawn_at = Some(now + self.delay(cfg));
                tracing::debug!("golden event missed");
                Some(next)
            }
            None => {
                let due = match self.next_spawn_at {
                    Some(t) => t,
                    None => {
                        let t = now + self.delay(cfg);
                        self.next_spawn_at = Some(t);
                        t
                    }
                };
                if now < due {
                    return None;
                }
                self.next_spawn_at = None;
                let mut next = state.clone();
                next.golden.visible_until = Some(now + cfg.visible_ms);
                sink.notify("A golden cookie appeared!".into(), Tone::Info);
                Some(next)
            }
        }
    }
}
