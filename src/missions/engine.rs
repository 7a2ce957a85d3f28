//! Objective orchestration.
//!
//! Every pass re-derives the player context, advances the primary and micro
//! objectives independently and, when one is done, runs the two-phase
//! completion:
//!
//! - [`MissionEngine::claim`] sets `pending_reward` and pays. A set flag (or a
//!   serial that no longer matches the slot) makes it a no-op, so a repeated
//!   completion never pays twice.
//! - [`MissionEngine::settle`] logs the completion, applies the cooldown and
//!   replaces the objective. Replacement is what clears the flag.
//!
//! A snapshot persisted between the two phases resumes at `settle`.

use std::cell::RefCell;
use std::rc::Rc;

use bevy_prng::WyRand;

use crate::missions::context::{build_context, PlayerContext};
use crate::missions::rewards;
use crate::missions::selector::select;
use crate::missions::templates::strategy_for;
use crate::state::{GameState, HistoryEntry, Millis, Slot};
use crate::systems::sdk::{Env, Notify, System, Tone};

pub struct MissionEngine {
    rng: Rc<RefCell<WyRand>>,
}

impl MissionEngine {
    pub fn new(rng: Rc<RefCell<WyRand>>) -> Self {
        Self { rng }
    }

    /// One orchestration pass over both slots.
    pub fn update(&self, state: &GameState, env: Env<'_>, now: Millis, sink: &mut dyn Notify) -> GameState {
        let mut next = state.clone();
        for slot in Slot::ALL {
            next = self.update_slot(next, env, now, slot, sink);
        }
        next
    }

    fn update_slot(&self, state: GameState, env: Env<'_>, now: Millis, slot: Slot, sink: &mut dyn Notify) -> GameState {
        let Some(obj) = state.objectives.get(slot) else {
            let ctx = build_context(&state, env, now);
            return self.fill(state, env, &ctx, slot, None);
        };
        let serial = obj.serial;
        if obj.pending_reward {
            tracing::debug!(?slot, serial, "resuming interrupted completion without paying");
            return self.settle(&state, env, now, slot, serial);
        }
        let Some(template) = env.catalog.template(&obj.template_id) else {
            tracing::warn!(?slot, template = %obj.template_id, "active objective has no template; replacing");
            let mut next = state;
            *next.objectives.get_mut(slot) = None;
            let ctx = build_context(&next, env, now);
            return self.fill(next, env, &ctx, slot, None);
        };

        let ctx = build_context(&state, env, now);
        let progress = strategy_for(&template.kind).progress(&obj.target, &state, &ctx);
        let done = progress.done;
        let mut next = state;
        if let Some(o) = next.objectives.get_mut(slot) {
            o.progress = progress;
        }
        if !done {
            return next;
        }
        let claimed = self.claim(&next, env, now, slot, serial, sink);
        self.settle(&claimed, env, now, slot, serial)
    }

    /// Pay the reward for objective `serial` in `slot`. No-op unless that
    /// objective is current, done and not yet claimed.
    pub fn claim(
        &self,
        state: &GameState,
        env: Env<'_>,
        now: Millis,
        slot: Slot,
        serial: u64,
        sink: &mut dyn Notify,
    ) -> GameState {
        let Some(obj) = state.objectives.get(slot).filter(|o| o.serial == serial) else {
            return state.clone();
        };
        if obj.pending_reward || obj.completed || !obj.progress.done {
            return state.clone();
        }
        let failed = obj.progress.failed;
        let template_id = obj.template_id.clone();

        let mut next = state.clone();
        if let Some(o) = next.objectives.get_mut(slot) {
            o.pending_reward = true;
            o.completed = true;
        }
        if failed {
            sink.notify(format!("Objective missed: {template_id}"), Tone::Warn);
            return next;
        }

        let ctx = build_context(&next, env, now);
        let reward = self.reward_for(&template_id, &next, env, &ctx, now);
        next = rewards::apply_reward(&next, &reward, env, now);
        tracing::info!(?slot, template = %template_id, stage = reward.stage.as_str(), "objective completed");
        sink.notify(format!("Objective complete: {}", reward.description), Tone::Success);
        next
    }

    fn reward_for(
        &self,
        template_id: &str,
        state: &GameState,
        env: Env<'_>,
        ctx: &PlayerContext,
        now: Millis,
    ) -> rewards::RewardPackage {
        env.catalog
            .template(template_id)
            .and_then(|t| strategy_for(&t.kind).reward(ctx))
            .unwrap_or_else(|| rewards::adapt(state, env, now, &self.rng))
    }

    /// Log the claimed objective `serial`, cool its template down and select a
    /// replacement. No-op unless that objective is current and claimed.
    pub fn settle(&self, state: &GameState, env: Env<'_>, now: Millis, slot: Slot, serial: u64) -> GameState {
        let Some(obj) = state.objectives.get(slot).filter(|o| o.serial == serial && o.pending_reward) else {
            return state.clone();
        };
        let template_id = obj.template_id.clone();
        let entry = HistoryEntry {
            template_id: template_id.clone(),
            completed_at: now,
            duration_ms: now.saturating_sub(obj.started_at),
            failed: obj.progress.failed,
        };

        let mut next = state.clone();
        let tuning = env.tuning;
        let log = next.missions.get_mut(slot);
        if !entry.failed {
            log.completed += 1;
        }
        log.history.push_back(entry);
        while log.history.len() > tuning.selector.history_len {
            log.history.pop_front();
        }
        let cooldown = tuning.cooldown_ms(&template_id);
        if cooldown > 0 {
            log.cooldowns.insert(template_id.clone(), now + cooldown);
        }
        *next.objectives.get_mut(slot) = None;

        let ctx = build_context(&next, env, now);
        self.fill(next, env, &ctx, slot, Some(&template_id))
    }

    fn fill(&self, mut state: GameState, env: Env<'_>, ctx: &PlayerContext, slot: Slot, exclude: Option<&str>) -> GameState {
        match select(&state, env, ctx, slot, exclude) {
            Ok(mut obj) => {
                obj.serial = state.objectives.next_serial;
                state.objectives.next_serial += 1;
                tracing::debug!(?slot, template = %obj.template_id, serial = obj.serial, "objective selected");
                *state.objectives.get_mut(slot) = Some(obj);
            }
            Err(e) => tracing::debug!(%e, "no objective this pass"),
        }
        state
    }
}

impl System for MissionEngine {
    fn name(&self) -> &'static str {
        "missions"
    }

    fn step(&mut self, state: &GameState, env: Env<'_>, now: Millis, sink: &mut dyn Notify) -> Option<GameState> {
        let next = self.update(state, env, now, sink);
        (next != *state).then_some(next)
    }
}
