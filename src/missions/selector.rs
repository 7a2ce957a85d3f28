//! Objective selector.
//!
//! 1. Filter: drop the slot's current template, templates sharing a tag with
//!    the other slot's active template, templates under cooldown and templates
//!    whose strategy rejects the context.
//! 2. Score: base affinity + strategy score + variety adjustment + anti-spam.
//! 3. Pick the highest score and instantiate it; fall through to the next
//!    candidate if instantiation fails.

use std::collections::BTreeSet;

use crate::catalog::ObjectiveTemplate;
use crate::config::SelectorWeights;
use crate::error::{Result, SimError};
use crate::missions::context::PlayerContext;
use crate::missions::templates::strategy_for;
use crate::state::{GameState, Millis, Objective, Progress, Slot, SlotLog};
use crate::systems::sdk::Env;

#[derive(Clone, Debug, PartialEq)]
pub struct Candidate<'a> {
    pub template: &'a ObjectiveTemplate,
    pub score: f64,
}

/// Tags of the template active in `slot`, if any.
pub fn active_tags(state: &GameState, env: Env<'_>, slot: Slot) -> BTreeSet<String> {
    state
        .objectives
        .get(slot)
        .and_then(|o| env.catalog.template(&o.template_id))
        .map(|t| t.tags.iter().cloned().collect())
        .unwrap_or_default()
}

fn variety(log: &SlotLog, id: &str, w: &SelectorWeights) -> f64 {
    let recent = log.history.iter().rev().take(w.variety_window).any(|h| h.template_id == id);
    if recent { -w.variety_penalty } else { w.variety_bonus }
}

fn anti_spam(log: &SlotLog, id: &str, now: Millis, w: &SelectorWeights) -> f64 {
    match log.cooldowns.get(id) {
        Some(&until) if until <= now && now - until < w.anti_spam_window_ms => -w.anti_spam_penalty,
        _ => 0.0,
    }
}

/// Eligible templates for `slot` with their scores, best first. Ties keep
/// catalog order.
pub fn score_candidates<'a>(
    state: &GameState,
    env: Env<'a>,
    ctx: &PlayerContext,
    slot: Slot,
    exclude: Option<&str>,
) -> Vec<Candidate<'a>> {
    let forbidden = active_tags(state, env, slot.other());
    let log = state.missions.get(slot);
    let weights = &env.tuning.selector;
    let now = ctx.now;

    let mut out: Vec<Candidate<'a>> = env
        .catalog
        .templates_for(slot)
        .filter(|t| exclude != Some(t.id.as_str()))
        .filter(|t| !t.tags.iter().any(|tag| forbidden.contains(tag)))
        .filter(|t| log.cooldowns.get(&t.id).is_none_or(|&until| until <= now))
        .filter(|t| strategy_for(&t.kind).eligible(t, state, ctx))
        .map(|t| {
            let score = t.base_score
                + strategy_for(&t.kind).score(state, ctx)
                + variety(log, &t.id, weights)
                + anti_spam(log, &t.id, now, weights);
            Candidate { template: t, score }
        })
        .collect();
    out.sort_by(|a, b| b.score.total_cmp(&a.score));
    out
}

/// Choose and instantiate the next objective for `slot`. The caller assigns
/// the serial. `SelectionExhausted` means "leave the slot empty, retry later".
pub fn select(state: &GameState, env: Env<'_>, ctx: &PlayerContext, slot: Slot, exclude: Option<&str>) -> Result<Objective> {
    score_candidates(state, env, ctx, slot, exclude)
        .into_iter()
        .find_map(|c| {
            let strategy = strategy_for(&c.template.kind);
            let target = strategy.instantiate(c.template, state, ctx)?;
            Some(Objective {
                serial: 0,
                template_id: c.template.id.clone(),
                progress: Progress::default(),
                target,
                started_at: ctx.now,
                completed: false,
                pending_reward: false,
            })
        })
        .ok_or(SimError::SelectionExhausted { slot })
}
