// src/systems/sdk.rs

//! # Systems SDK
//!
//! Shared protocol for the **systems** that make up the simulation (tick
//! accumulation, flash sales, golden events, achievements, the objective
//! engine). A *system*
//! reads the latest committed snapshot and either returns a new snapshot or
//! `None` when it has nothing to change.
//!
//! ## Snapshot discipline
//! - A system never mutates the snapshot it is handed. It clones, edits the
//!   clone and returns it. The caller swaps it in as the new authoritative
//!   state, so readers never observe a half-applied step.
//! - All inputs that vary (time, randomness) are explicit: `now` is passed in,
//!   RNG streams are injected at construction.
//!
//! ## Pieces
//! - [`Env`] bundles the read-only catalog and tuning every system needs.
//! - [`Notify`] is the feedback sink (`notify(message, tone)`). The host wires
//!   it to toasts; tests collect into a `Vec<Notice>`.
//! - [`Clock`] is the monotonic `now()` source for hosts that do not want to
//!   pass timestamps by hand.
//! - [`System`] is the step protocol that `Game::advance` fans out to.
//!
//! ## Feature flags
//! - Optional systems live under `src/systems/*` behind `feature = "system-*"`.
//! - Systems must not depend on `game`; the orchestrator composes systems, not
//!   the other way round.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::catalog::Catalog;
use crate::config::Tuning;
use crate::fold_steps;
use crate::state::{GameState, Millis};

/// Read-only context shared by every system.
#[derive(Clone, Copy, Debug)]
pub struct Env<'a> {
    pub catalog: &'a Catalog,
    pub tuning: &'a Tuning,
}

/// Presentation hint attached to a notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Warn,
    /// State was reset; hosts should make this unmistakable.
    Reset,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub message: String,
    pub tone: Tone,
}

/// Feedback sink for rewards, rejections and resets.
pub trait Notify {
    fn notify(&mut self, message: String, tone: Tone);
}

impl Notify for Vec<Notice> {
    fn notify(&mut self, message: String, tone: Tone) {
        self.push(Notice { message, tone });
    }
}

/// Drops every notice.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl Notify for Silent {
    fn notify(&mut self, _message: String, _tone: Tone) {}
}

/// Monotonic time source in milliseconds.
pub trait Clock {
    fn now(&self) -> Millis;
}

impl<F: Fn() -> Millis> Clock for F {
    fn now(&self) -> Millis {
        self()
    }
}

/// Wall clock, milliseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Millis {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as Millis)
    }
}

/// One subsystem step: snapshot in, snapshot out.
pub trait System {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Returns `Some(next)` when the step changed anything.
    fn step(&mut self, state: &GameState, env: Env<'_>, now: Millis, sink: &mut dyn Notify) -> Option<GameState>;
}

/// Run `systems` in order, threading the snapshot through. Returns the final
/// snapshot when at least one system changed it.
pub fn run_all(
    systems: &mut [Box<dyn System>],
    state: &GameState,
    env: Env<'_>,
    now: Millis,
    sink: &mut dyn Notify,
) -> Option<GameState> {
    fold_steps(state, systems.iter_mut(), |current, sys| {
        let next = sys.step(current, env, now, sink);
        if next.is_some() {
            tracing::trace!(system = sys.name(), "system stepped");
        }
        next
    })
}
