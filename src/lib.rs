/*!
`idle_core`: the simulation core of an incremental ("idle-clicker") game.

What it does
- Grows a resource balance through passive production and clicks, derived by
  pure functions from owned producers, purchased modifiers, synergies,
  prestige and staked secondary currency.
- Prices purchases on a geometric curve with milestone steps, reward
  discounts and flash sales.
- Spawns golden events whose catch pays a timed frenzy or a lump sum, with
  diminishing returns for catches in quick succession.
- Batches production in a tick accumulator and commits it to a single
  authoritative snapshot at a lower rate.
- Runs an adaptive objective engine: two independent slots (primary and
  micro), scored selection with cooldowns and anti-repetition, and rewards
  scaled to the player's progression stage.

How to use (call surface only)
- Build a [`Game`](game::Game) from a [`Catalog`](catalog::Catalog), a
  [`Tuning`](config::Tuning), an RNG seed and the current time in ms, or
  restore one with `Game::load` from a blob produced by `Game::save`.
- Call `advance(now)` from the host timer; route input to `click`, `buy`,
  `buy_modifier`, `stake`, `unstake`, `golden_click`, `prestige`, `reset`.
- Read `state()` for rendering and `drain_notices()` for feedback.
- Every piece is also usable on its own: the `systems::*` and `missions::*`
  functions take a snapshot and return a new one.

What it does NOT do
- No rendering, audio, input handling or storage medium. Timestamps come from
  the host; persistence is a byte blob the host stores wherever it likes.
*/

pub mod catalog;
pub mod config;
pub mod error;
pub mod game;
pub mod mechanics;
pub mod missions;
pub mod persist;
pub mod state;
pub mod systems;

pub use catalog::Catalog;
pub use config::Tuning;
pub use error::{Result, SimError};
pub use game::Game;
pub use state::{GameState, Millis, Slot};

/// Thread `init` through `step` once per item. Each step reads the latest
/// snapshot and returns `Some(next)` to replace it or `None` to leave it.
/// Returns the final snapshot if any step replaced it.
pub fn fold_steps<S, T, F>(init: &S, items: impl IntoIterator<Item = T>, mut step: F) -> Option<S>
where
    F: FnMut(&S, T) -> Option<S>,
{
    let mut latest: Option<S> = None;
    for item in items {
        let current = latest.as_ref().unwrap_or(init);
        if let Some(next) = step(current, item) {
            latest = Some(next);
        }
    }
    latest
}
