//! Objective strategies.
//!
//! Templates in the catalog are data with a kind tag. `strategy_for` maps a
//! tag to the code that knows how to judge eligibility, instantiate a target,
//! evaluate progress, score and (for primary objectives) reward it.

use crate::catalog::{ObjectiveTemplate, TemplateKind};
use crate::missions::context::{PlayerContext, Stage};
use crate::missions::rewards::{describe, DiscountGrant, EffectGrant, RewardPackage};
use crate::state::{Axis, GameState, Millis, ObjectiveTarget, Progress};

pub trait ObjectiveStrategy: Sync {
    fn eligible(&self, template: &ObjectiveTemplate, state: &GameState, ctx: &PlayerContext) -> bool;

    /// Concrete target for a new objective; `None` when the context no longer
    /// supports one.
    fn instantiate(&self, template: &ObjectiveTemplate, state: &GameState, ctx: &PlayerContext) -> Option<ObjectiveTarget>;

    fn progress(&self, target: &ObjectiveTarget, state: &GameState, ctx: &PlayerContext) -> Progress;

    /// Context-dependent part of the selection score.
    fn score(&self, state: &GameState, ctx: &PlayerContext) -> f64;

    /// Template-specific reward. `None` defers to the reward adapter.
    fn reward(&self, _ctx: &PlayerContext) -> Option<RewardPackage> {
        None
    }
}

pub fn strategy_for(kind: &TemplateKind) -> &'static dyn ObjectiveStrategy {
    match kind {
        TemplateKind::BuyAffordableProducer => &BuyAffordable,
        TemplateKind::GainBalanceFraction => &GainFraction,
        TemplateKind::ClickBurst => &ClickBurst,
        TemplateKind::ReachBalanceDynamic => &ReachBalance,
        TemplateKind::ReachRateMilestone => &ReachRate,
        TemplateKind::OwnAtLeast { .. } => &OwnProducers,
    }
}

/// Progress for a target handed to the wrong strategy: finish it as failed so
/// the engine replaces it.
fn mismatched() -> Progress {
    Progress { done: true, failed: true, ..Progress::default() }
}

fn threshold(current: f64, target: f64) -> Progress {
    Progress { current: current.clamp(0.0, target.max(0.0)), target, done: current >= target, ..Progress::default() }
}

fn by_stage<T>(stage: Stage, early: T, mid: T, late: T) -> T {
    match stage {
        Stage::Early => early,
        Stage::Mid => mid,
        Stage::Late => late,
    }
}

fn effect_reward(ctx: &PlayerContext, axis: Axis, multiplier: f64, secs: u64) -> RewardPackage {
    let effect = EffectGrant { axis, multiplier, duration_ms: secs * 1_000 };
    RewardPackage { currency: 0.0, description: describe(0.0, Some(&effect), None), effect: Some(effect), discount: None, stage: ctx.stage }
}

fn discount_reward(ctx: &PlayerContext, fraction: f64, secs: u64) -> RewardPackage {
    let discount = DiscountGrant { fraction, duration_ms: secs * 1_000 };
    RewardPackage {
        currency: 0.0,
        description: describe(0.0, None, Some(&discount)),
        effect: None,
        discount: Some(discount),
        stage: ctx.stage,
    }
}

/* ─── micro: delta-based ─────────────────────────────────────────────────── */

pub struct BuyAffordable;

impl ObjectiveStrategy for BuyAffordable {
    fn eligible(&self, _t: &ObjectiveTemplate, _s: &GameState, ctx: &PlayerContext) -> bool {
        ctx.next_affordable.is_some()
    }

    fn instantiate(&self, _t: &ObjectiveTemplate, state: &GameState, ctx: &PlayerContext) -> Option<ObjectiveTarget> {
        let pick = ctx.next_affordable.as_ref()?;
        Some(ObjectiveTarget::BuyMore {
            producer: pick.producer.clone(),
            qty: if ctx.stage == Stage::Early { 1 } else { 3 },
            owned_at_start: state.owned(&pick.producer),
        })
    }

    fn progress(&self, target: &ObjectiveTarget, state: &GameState, _ctx: &PlayerContext) -> Progress {
        let ObjectiveTarget::BuyMore { producer, qty, owned_at_start } = target else {
            return mismatched();
        };
        let bought = state.owned(producer).saturating_sub(*owned_at_start);
        threshold(f64::from(bought), f64::from(*qty))
    }

    fn score(&self, _s: &GameState, ctx: &PlayerContext) -> f64 {
        let afford = if ctx.affordability > 0.0 { (1.0 - 1.0 / ctx.affordability).clamp(0.0, 1.0) } else { 0.0 };
        0.6 + afford * 0.4
    }
}

pub struct GainFraction;

impl ObjectiveStrategy for GainFraction {
    fn eligible(&self, _t: &ObjectiveTemplate, state: &GameState, _ctx: &PlayerContext) -> bool {
        state.balance > 50.0
    }

    fn instantiate(&self, _t: &ObjectiveTemplate, state: &GameState, ctx: &PlayerContext) -> Option<ObjectiveTarget> {
        Some(ObjectiveTarget::GainBalance { amount: ctx.target_balance, balance_at_start: state.balance })
    }

    fn progress(&self, target: &ObjectiveTarget, state: &GameState, _ctx: &PlayerContext) -> Progress {
        let ObjectiveTarget::GainBalance { amount, balance_at_start } = target else {
            return mismatched();
        };
        threshold(state.balance - balance_at_start, *amount)
    }

    fn score(&self, _s: &GameState, ctx: &PlayerContext) -> f64 {
        0.5 + (ctx.balance / 1e6).min(0.5)
    }
}

/* ─── micro: timed ───────────────────────────────────────────────────────── */

pub struct ClickBurst;

impl ObjectiveStrategy for ClickBurst {
    fn eligible(&self, _t: &ObjectiveTemplate, _s: &GameState, _ctx: &PlayerContext) -> bool {
        true
    }

    fn instantiate(&self, _t: &ObjectiveTemplate, state: &GameState, ctx: &PlayerContext) -> Option<ObjectiveTarget> {
        let window: Millis = if ctx.stage == Stage::Early { 30_000 } else { 40_000 };
        Some(ObjectiveTarget::ClickBurst {
            clicks: by_stage(ctx.stage, 50, 80, 120),
            clicks_at_start: state.clicks,
            deadline: ctx.now + window,
        })
    }

    fn progress(&self, target: &ObjectiveTarget, state: &GameState, ctx: &PlayerContext) -> Progress {
        let ObjectiveTarget::ClickBurst { clicks, clicks_at_start, deadline } = target else {
            return mismatched();
        };
        let made = state.clicks.saturating_sub(*clicks_at_start);
        let left = deadline.saturating_sub(ctx.now);
        // Only an evaluation before the deadline can succeed; a target first
        // seen at or after it is a miss.
        let expired = left == 0;
        Progress {
            current: made.min(*clicks) as f64,
            target: *clicks as f64,
            done: expired || made >= *clicks,
            failed: expired,
            time_left_ms: Some(left),
        }
    }

    fn score(&self, _s: &GameState, ctx: &PlayerContext) -> f64 {
        if ctx.stage == Stage::Early { 0.7 } else { 0.4 }
    }
}

/* ─── primary ────────────────────────────────────────────────────────────── */

pub struct ReachBalance;

impl ObjectiveStrategy for ReachBalance {
    fn eligible(&self, _t: &ObjectiveTemplate, _s: &GameState, _ctx: &PlayerContext) -> bool {
        true
    }

    fn instantiate(&self, _t: &ObjectiveTemplate, state: &GameState, ctx: &PlayerContext) -> Option<ObjectiveTarget> {
        let factor = by_stage(ctx.stage, 2.5, 1.8, 1.4);
        Some(ObjectiveTarget::ReachBalance {
            amount: (ctx.balance * factor).round().max(500.0),
            balance_at_start: state.balance,
        })
    }

    fn progress(&self, target: &ObjectiveTarget, state: &GameState, _ctx: &PlayerContext) -> Progress {
        let ObjectiveTarget::ReachBalance { amount, balance_at_start } = target else {
            return mismatched();
        };
        threshold(state.balance - balance_at_start, *amount)
    }

    fn score(&self, _s: &GameState, _ctx: &PlayerContext) -> f64 {
        0.6
    }

    fn reward(&self, ctx: &PlayerContext) -> Option<RewardPackage> {
        Some(effect_reward(ctx, Axis::Production, by_stage(ctx.stage, 1.5, 1.35, 1.3), 25))
    }
}

const RATE_STEPS: [f64; 9] = [10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1_000.0, 2_500.0, 5_000.0];

pub struct ReachRate;

impl ObjectiveStrategy for ReachRate {
    fn eligible(&self, _t: &ObjectiveTemplate, _s: &GameState, ctx: &PlayerContext) -> bool {
        ctx.rate > 0.0
    }

    fn instantiate(&self, _t: &ObjectiveTemplate, _s: &GameState, ctx: &PlayerContext) -> Option<ObjectiveTarget> {
        let rate = RATE_STEPS
            .iter()
            .copied()
            .find(|&step| step > ctx.rate)
            .unwrap_or_else(|| (ctx.rate * 1.3).ceil());
        Some(ObjectiveTarget::ReachRate { rate })
    }

    fn progress(&self, target: &ObjectiveTarget, _s: &GameState, ctx: &PlayerContext) -> Progress {
        let ObjectiveTarget::ReachRate { rate } = target else {
            return mismatched();
        };
        threshold(ctx.rate, *rate)
    }

    fn score(&self, _s: &GameState, _ctx: &PlayerContext) -> f64 {
        0.55
    }

    fn reward(&self, ctx: &PlayerContext) -> Option<RewardPackage> {
        let fraction = if ctx.stage == Stage::Late { 0.2 } else { 0.15 };
        Some(discount_reward(ctx, fraction, 25))
    }
}

/// Direct threshold on a single producer count.
pub struct OwnProducers;

impl ObjectiveStrategy for OwnProducers {
    fn eligible(&self, template: &ObjectiveTemplate, state: &GameState, _ctx: &PlayerContext) -> bool {
        match &template.kind {
            TemplateKind::OwnAtLeast { producer, qty } => state.owned(producer) < *qty,
            _ => false,
        }
    }

    fn instantiate(&self, template: &ObjectiveTemplate, _s: &GameState, _ctx: &PlayerContext) -> Option<ObjectiveTarget> {
        match &template.kind {
            TemplateKind::OwnAtLeast { producer, qty } => {
                Some(ObjectiveTarget::OwnAtLeast { producer: producer.clone(), qty: *qty })
            }
            _ => None,
        }
    }

    fn progress(&self, target: &ObjectiveTarget, state: &GameState, _ctx: &PlayerContext) -> Progress {
        let ObjectiveTarget::OwnAtLeast { producer, qty } = target else {
            return mismatched();
        };
        threshold(f64::from(state.owned(producer)), f64::from(*qty))
    }

    fn score(&self, _s: &GameState, _ctx: &PlayerContext) -> f64 {
        0.5
    }

    fn reward(&self, ctx: &PlayerContext) -> Option<RewardPackage> {
        Some(effect_reward(ctx, Axis::Click, by_stage(ctx.stage, 1.25, 1.3, 1.35), 30))
    }
}
