//! Game orchestrator.
//!
//! Owns the authoritative snapshot and composes the systems:
//! - tick accumulator  → buffered production, periodic commits
//! - schedulers        → timer-driven systems (flash sales, golden events)
//! - reactors          → state-change-driven systems (objectives, achievements)
//! - shop / secondary / prestige / offline → player actions
//!
//! The host calls [`Game::advance`] from its timer with the current time and
//! routes player input to the action methods. Every action commits buffered
//! production first, so it sees the same balance the player does, then runs
//! the reactors over the resulting snapshot.

use std::cell::RefCell;
use std::rc::Rc;

use bevy_prng::WyRand;
use rand_core::SeedableRng;

use crate::catalog::Catalog;
use crate::config::Tuning;
use crate::error::{Result, SimError};
use crate::missions::engine::MissionEngine;
use crate::persist::{self, MigrationStatus};
use crate::state::{GameState, Millis};
use crate::systems::achievements::Achievements;
use crate::systems::economy::{self, Rates};
use crate::systems::offline;
use crate::systems::sdk::{run_all, Clock, Env, Notice, Notify, System, Tone};
use crate::systems::secondary;
use crate::systems::shop;
use crate::systems::tick::TickAccumulator;

pub struct Game {
    state: GameState,
    catalog: Catalog,
    tuning: Tuning,
    #[cfg_attr(not(feature = "system-golden"), allow(dead_code))]
    rng: Rc<RefCell<WyRand>>,
    tick: TickAccumulator,
    schedulers: Vec<Box<dyn System>>,
    reactors: Vec<Box<dyn System>>,
    notices: Vec<Notice>,
    resumed: bool,
}

impl Game {
    /// Start a new run at `now`. Catalog and tuning are validated: degenerate
    /// values are errors in debug builds and clamped in release builds.
    pub fn new(catalog: Catalog, tuning: Tuning, seed: u64, now: Millis) -> Result<Self> {
        let mut game = Self::with_state(catalog, tuning, seed, GameState::fresh(now))?;
        game.react(now);
        Ok(game)
    }

    /// Resume from a persisted blob. An unusable blob starts a fresh run and
    /// leaves a `Tone::Reset` notice.
    pub fn load(catalog: Catalog, tuning: Tuning, seed: u64, blob: &[u8], now: Millis) -> Result<Self> {
        let migrated = persist::migrate(blob, now);
        let mut game = Self::with_state(catalog, tuning, seed, migrated.state)?;
        match migrated.status {
            MigrationStatus::Reset { reason } => {
                game.notices.notify(format!("Save could not be restored, starting over ({reason})"), Tone::Reset);
            }
            MigrationStatus::Upgraded { from } => tracing::info!(from, "save upgraded"),
            MigrationStatus::Fresh | MigrationStatus::Loaded => {}
        }
        game.react(now);
        Ok(game)
    }

    fn with_state(catalog: Catalog, tuning: Tuning, seed: u64, state: GameState) -> Result<Self> {
        let strict = cfg!(debug_assertions);
        let catalog = catalog.sanitize(strict)?;
        let tuning = tuning.sanitize(strict)?;
        if catalog.producers.is_empty() {
            return Err(SimError::Config("catalog has no producers".into()));
        }

        let rng = Rc::new(RefCell::new(WyRand::from_seed(seed.to_le_bytes())));
        #[allow(unused_mut)]
        let mut schedulers: Vec<Box<dyn System>> = Vec::new();
        #[cfg(feature = "system-flash_sale")]
        schedulers.push(Box::new(crate::systems::flash_sale::FlashSaleScheduler::new(Rc::clone(&rng))));
        #[cfg(feature = "system-golden")]
        schedulers.push(Box::new(crate::systems::golden::GoldenScheduler::new(Rc::clone(&rng))));
        let reactors: Vec<Box<dyn System>> = vec![Box::new(MissionEngine::new(Rc::clone(&rng))), Box::new(Achievements)];

        Ok(Self {
            state,
            catalog,
            tuning,
            rng,
            tick: TickAccumulator::new(),
            schedulers,
            reactors,
            notices: Vec::new(),
            resumed: false,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn env(&self) -> Env<'_> {
        Env { catalog: &self.catalog, tuning: &self.tuning }
    }

    /// Balance including production still sitting in the tick buffer.
    pub fn display_balance(&self) -> f64 {
        self.state.balance + self.tick.pending().balance
    }

    pub fn rates(&self, now: Millis) -> Rates {
        economy::rates(&self.state, self.env(), now)
    }

    pub fn cost_of(&self, producer: &str, count: u32, now: Millis) -> Result<f64> {
        shop::cost_of(&self.state, self.env(), producer, count, now)
    }

    /// Take the notices emitted since the last call.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Host timer entry point: sample production, commit when due, run the
    /// timer-driven systems, then the reactors if anything changed. Returns
    /// whether the snapshot changed.
    pub fn advance(&mut self, now: Millis) -> bool {
        if !self.resumed {
            self.resume(now);
        }
        let env = Env { catalog: &self.catalog, tuning: &self.tuning };
        let mut changed = false;

        if let Some(reason) = self.tick.sample(&self.state, env, now) {
            tracing::trace!(?reason, "commit");
            self.state = self.tick.flush(&self.state, env, now);
            changed = true;
        }
        if let Some(next) = run_all(&mut self.schedulers, &self.state, env, now, &mut self.notices) {
            self.state = next;
            changed = true;
        }
        if changed {
            self.react(now);
        }
        changed
    }

    /// [`advance`](Self::advance) with time taken from `clock`.
    pub fn advance_with(&mut self, clock: &impl Clock) -> bool {
        self.advance(clock.now())
    }

    fn commit_pending(&mut self, now: Millis) {
        if !self.resumed {
            self.resume(now);
        }
        let env = Env { catalog: &self.catalog, tuning: &self.tuning };
        self.state = self.tick.flush(&self.state, env, now);
    }

    fn react(&mut self, now: Millis) {
        let env = Env { catalog: &self.catalog, tuning: &self.tuning };
        if let Some(next) = run_all(&mut self.reactors, &self.state, env, now, &mut self.notices) {
            self.state = next;
        }
    }

    /// Swap in the result of a fallible action, or surface its rejection.
    fn apply(&mut self, result: Result<GameState>, now: Millis) -> Result<()> {
        match result {
            Ok(next) => {
                self.state = next;
                self.react(now);
                Ok(())
            }
            Err(e) => Err(self.rejected(e)),
        }
    }

    fn rejected(&mut self, e: SimError) -> SimError {
        if e.is_recoverable() {
            self.notices.notify(e.to_string(), Tone::Warn);
        }
        e
    }

    /// Register a click; returns the amount credited.
    pub fn click(&mut self, now: Millis) -> f64 {
        self.commit_pending(now);
        let before = self.state.balance;
        self.state = economy::click(&self.state, self.env(), now);
        let gained = self.state.balance - before;
        self.react(now);
        gained
    }

    pub fn buy(&mut self, producer: &str, count: u32, now: Millis) -> Result<()> {
        self.commit_pending(now);
        let result = shop::buy_producer(&self.state, self.env(), producer, count, now);
        self.apply(result, now)
    }

    pub fn buy_modifier(&mut self, id: &str, now: Millis) -> Result<()> {
        self.commit_pending(now);
        let result = shop::buy_modifier(&self.state, self.env(), id, now);
        self.apply(result, now)
    }

    pub fn stake(&mut self, amount: f64, now: Millis) -> Result<()> {
        self.commit_pending(now);
        let result = secondary::stake(&self.state, amount);
        self.apply(result, now)
    }

    pub fn unstake(&mut self, amount: f64, now: Millis) -> Result<()> {
        self.commit_pending(now);
        let result = secondary::unstake(&self.state, amount);
        self.apply(result, now)
    }

    /// Catch the golden event on screen.
    #[cfg(feature = "system-golden")]
    pub fn golden_click(&mut self, now: Millis) -> Result<crate::systems::golden::GoldenOutcome> {
        self.commit_pending(now);
        let caught = crate::systems::golden::catch(&self.state, self.env(), now, &self.rng);
        match caught {
            Ok((next, outcome)) => {
                tracing::info!(?outcome, "golden event");
                self.notices.notify(outcome.describe(), Tone::Success);
                self.state = next;
                self.react(now);
                Ok(outcome)
            }
            Err(e) => Err(self.rejected(e)),
        }
    }

    #[cfg(feature = "system-prestige")]
    pub fn can_prestige(&self) -> bool {
        crate::systems::prestige::can_prestige(&self.state, self.env())
    }

    /// Trade the run for prestige levels. Buffered production and every
    /// objective and effect go with it.
    #[cfg(feature = "system-prestige")]
    pub fn prestige(&mut self, now: Millis) -> Result<()> {
        self.commit_pending(now);
        let result = crate::systems::prestige::prestige(&self.state, self.env(), now);
        if result.is_ok() {
            self.tick.discard();
            self.notices.notify("Prestige! A new run begins.".into(), Tone::Reset);
        }
        self.apply(result, now)
    }

    /// Pay the one-shot offline grant for the time since the last commit.
    /// Runs once per session (`advance` calls it on first use); returns the
    /// amount granted.
    pub fn resume(&mut self, now: Millis) -> Option<f64> {
        if self.resumed {
            return None;
        }
        self.resumed = true;
        let grant = offline::offline_grant(&self.state, self.env(), now)?;
        self.state = grant.state;
        if grant.amount > 0.0 {
            tracing::info!(amount = grant.amount, secs = grant.paid_secs, "offline grant");
            self.notices.notify(format!("+{:.0} earned while away", grant.amount), Tone::Success);
        }
        self.react(now);
        Some(grant.amount)
    }

    /// Discard the run unconditionally: objectives, effects and buffered
    /// production included.
    pub fn reset(&mut self, keep_prestige: bool, now: Millis) {
        let level = if keep_prestige { self.state.prestige_level } else { 0 };
        self.tick.discard();
        self.state = GameState { prestige_level: level, ..GameState::fresh(now) };
        self.resumed = true;
        tracing::info!(keep_prestige, "reset");
        self.notices.notify("Game reset".into(), Tone::Reset);
        self.react(now);
    }

    /// Commit buffered production and serialize the snapshot.
    pub fn save(&mut self, now: Millis) -> Result<Vec<u8>> {
        self.commit_pending(now);
        persist::serialize(&self.state)
    }
}
