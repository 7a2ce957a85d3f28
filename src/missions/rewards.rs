//! Reward adapter.
//!
//! Scales objective rewards to the player's stage and folds temporary effects
//! into the snapshot without ever stacking two effects on one axis.

use std::cell::RefCell;

use bevy_prng::WyRand;

use crate::config::EffectLimits;
use crate::mechanics::stoch;
use crate::missions::context::{classify, Stage, StageMetrics};
use crate::state::{Axis, Discount, GameState, Millis, TemporaryEffect};
use crate::systems::sdk::Env;

#[derive(Clone, Debug, PartialEq)]
pub struct EffectGrant {
    pub axis: Axis,
    pub multiplier: f64,
    pub duration_ms: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DiscountGrant {
    pub fraction: f64,
    pub duration_ms: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RewardPackage {
    pub currency: f64,
    pub effect: Option<EffectGrant>,
    pub discount: Option<DiscountGrant>,
    pub description: String,
    pub stage: Stage,
}

/// Stage as the reward adapter sees it: the same ANY rule as the context
/// builder, with its own gates (which also look at producers owned).
pub fn detect_stage(state: &GameState, env: Env<'_>, now: Millis) -> Stage {
    classify(&StageMetrics::of(state, env, now), &env.tuning.reward_stages)
}

fn whole_secs(lo: f64, hi: f64, rng: &RefCell<WyRand>) -> u64 {
    stoch::uniform(rng, lo, hi).round() as u64 * 1_000
}

fn axis_name(axis: Axis) -> &'static str {
    match axis {
        Axis::Production => "production",
        Axis::Click => "click",
    }
}

/// Roll a stage-scaled reward package.
pub fn adapt(state: &GameState, env: Env<'_>, now: Millis, rng: &RefCell<WyRand>) -> RewardPackage {
    let stage = detect_stage(state, env, now);
    let balance = state.balance.max(0.0);
    let rate = StageMetrics::of(state, env, now).rate;

    let (currency, effect, discount) = match stage {
        Stage::Early => {
            let currency = (balance * 0.02).floor().clamp(25.0, 500.0);
            let multiplier = stoch::uniform(rng, 1.10, 1.15);
            let duration_ms = whole_secs(15.0, 20.0, rng);
            let axis = if stoch::bernoulli(rng, 0.5) { Axis::Click } else { Axis::Production };
            (currency, Some(EffectGrant { axis, multiplier, duration_ms }), None)
        }
        Stage::Mid => {
            let cap = (rate * 60.0).max(1_000.0);
            let currency = (balance * 0.015).floor().max(100.0).min(cap);
            let multiplier = stoch::uniform(rng, 1.15, 1.25);
            let duration_ms = whole_secs(25.0, 35.0, rng);
            let axis = if stoch::bernoulli(rng, 0.7) { Axis::Production } else { Axis::Click };
            (currency, Some(EffectGrant { axis, multiplier, duration_ms }), None)
        }
        Stage::Late => {
            let floor = (rate * 30.0).max(500.0);
            let currency = (balance * 0.01).floor().max(floor).min(rate * 300.0);
            if stoch::bernoulli(rng, 0.6) {
                let multiplier = stoch::uniform(rng, 1.25, 1.40);
                let duration_ms = whole_secs(40.0, 60.0, rng);
                let axis = if stoch::bernoulli(rng, 0.6) { Axis::Production } else { Axis::Click };
                (currency, Some(EffectGrant { axis, multiplier, duration_ms }), None)
            } else {
                let fraction = stoch::uniform(rng, 0.10, 0.20);
                let duration_ms = whole_secs(45.0, 90.0, rng);
                (currency, None, Some(DiscountGrant { fraction, duration_ms }))
            }
        }
    };

    RewardPackage { currency, description: describe(currency, effect.as_ref(), discount.as_ref()), effect, discount, stage }
}

pub(crate) fn describe(currency: f64, effect: Option<&EffectGrant>, discount: Option<&DiscountGrant>) -> String {
    let mut parts = Vec::new();
    if currency > 0.0 {
        parts.push(format!("+{currency:.0}"));
    }
    if let Some(e) = effect {
        parts.push(format!(
            "+{:.0}% {} ({}s)",
            (e.multiplier - 1.0) * 100.0,
            axis_name(e.axis),
            e.duration_ms / 1_000
        ));
    }
    if let Some(d) = discount {
        parts.push(format!("-{:.0}% prices ({}s)", d.fraction * 100.0, d.duration_ms / 1_000));
    }
    parts.join(" + ")
}

/// Fold a new grant onto the live effect of the same axis: magnitudes
/// multiply, expiry becomes the later of the two, capped at
/// `now + max_duration_ms`. An expired effect is replaced outright.
pub fn merge_effect(
    existing: Option<&TemporaryEffect>,
    grant: &EffectGrant,
    label: &str,
    now: Millis,
    limits: &EffectLimits,
) -> TemporaryEffect {
    let ceiling = now + limits.max_duration_ms;
    let fresh_until = now + grant.duration_ms;
    match existing.filter(|e| e.is_active(now)) {
        Some(old) => TemporaryEffect {
            multiplier: old.multiplier * grant.multiplier,
            expires_at: old.expires_at.max(fresh_until).min(ceiling),
            label: format!("{} · {}", old.label, label),
        },
        None => TemporaryEffect {
            multiplier: grant.multiplier,
            expires_at: fresh_until.min(ceiling),
            label: label.to_string(),
        },
    }
}

/// Discount counterpart of [`merge_effect`]: `(1−a)(1−b)`, capped at the
/// configured ceiling.
pub fn merge_discount(
    existing: Option<&Discount>,
    grant: &DiscountGrant,
    label: &str,
    now: Millis,
    limits: &EffectLimits,
) -> Discount {
    let ceiling = now + limits.max_duration_ms;
    let fresh_until = now + grant.duration_ms;
    let cap = limits.max_discount;
    match existing.filter(|d| now < d.expires_at) {
        Some(old) => Discount {
            fraction: (1.0 - (1.0 - old.fraction) * (1.0 - grant.fraction)).min(cap),
            expires_at: old.expires_at.max(fresh_until).min(ceiling),
            label: format!("{} · {}", old.label, label),
        },
        None => Discount {
            fraction: grant.fraction.min(cap),
            expires_at: fresh_until.min(ceiling),
            label: label.to_string(),
        },
    }
}

/// Credit the currency and merge effect/discount into a new snapshot.
pub fn apply_reward(state: &GameState, reward: &RewardPackage, env: Env<'_>, now: Millis) -> GameState {
    let limits = &env.tuning.effects;
    let mut next = state.clone();
    next.earn(reward.currency);
    if let Some(grant) = &reward.effect {
        let slot = next.effects.get_mut(grant.axis);
        let merged = merge_effect(slot.as_ref(), grant, &reward.description, now, limits);
        *slot = Some(merged);
    }
    if let Some(grant) = &reward.discount {
        let merged = merge_discount(next.effects.discount.as_ref(), grant, &reward.description, now, limits);
        next.effects.discount = Some(merged);
    }
    tracing::debug!(stage = reward.stage.as_str(), currency = reward.currency, "reward applied");
    next
}
