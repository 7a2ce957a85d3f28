//! Achievements: one-time unlocks checked on every state change.

use crate::state::{GameState, Millis};
use crate::systems::sdk::{Env, Notify, System, Tone};

/// Ids of achievements that hold now and were not unlocked before.
pub fn check(state: &GameState, env: Env<'_>) -> Vec<String> {
    env.catalog
        .achievements
        .iter()
        .filter(|a| !state.achievements.contains(&a.id) && a.rule.holds(state))
        .map(|a| a.id.clone())
        .collect()
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Achievements;

impl System for Achievements {
    fn name(&self) -> &'static str {
        "achievements"
    }

    fn step(&mut self, state: &GameState, env: Env<'_>, _now: Millis, sink: &mut dyn Notify) -> Option<GameState> {
        let newly = check(state, env);
        if newly.is_empty() {
            return None;
        }
        let mut next = state.clone();
        for id in newly {
            if let Some(def) = env.catalog.achievements.iter().find(|a| a.id == id) {
                sink.notify(format!("Achievement: {}", def.name), Tone::Success);
            }
            next.achievements.insert(id);
        }
        Some(next)
    }
}
