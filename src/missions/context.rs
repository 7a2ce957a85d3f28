//! Player context builder.
//!
//! A cheap, pure summary of a snapshot that the selector, the templates and
//! the reward adapter read instead of re-deriving rates themselves.

use serde::{Deserialize, Serialize};

use crate::config::{StageGate, StageGates};
use crate::mechanics::pricing::{geometric_series_cost, round_up};
use crate::state::{GameState, Millis};
use crate::systems::economy;
use crate::systems::sdk::Env;

/// Coarse progression stage. Ordered: `Early < Mid < Late`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Early,
    Mid,
    Late,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Stage::Early => "early",
            Stage::Mid => "mid",
            Stage::Late => "late",
        }
    }
}

/// The metrics stage classification looks at.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageMetrics {
    pub lifetime: f64,
    pub rate: f64,
    pub age_ms: u64,
    pub producers: u64,
}

impl StageMetrics {
    pub fn of(state: &GameState, env: Env<'_>, now: Millis) -> Self {
        Self {
            lifetime: state.lifetime,
            rate: economy::rates(state, env, now).base_production,
            age_ms: state.age_ms(now),
            producers: state.producers_owned(),
        }
    }
}

/// True while ANY metric is still under its gate.
fn below(m: &StageMetrics, gate: &StageGate) -> bool {
    m.lifetime < gate.lifetime
        || m.rate < gate.rate
        || m.age_ms < gate.age_ms
        || gate.producers.is_some_and(|p| m.producers < p)
}

/// One low metric keeps the lower stage even when the others are advanced.
pub fn classify(m: &StageMetrics, gates: &StageGates) -> Stage {
    if below(m, &gates.mid) {
        Stage::Early
    } else if below(m, &gates.late) {
        Stage::Mid
    } else {
        Stage::Late
    }
}

/// Cheapest producer whose single-unit price fits under α × balance.
#[derive(Clone, Debug, PartialEq)]
pub struct Affordable {
    pub producer: String,
    pub cost: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerContext {
    pub stage: Stage,
    pub now: Millis,
    pub balance: f64,
    pub lifetime: f64,
    /// Production per second without temporary effects.
    pub rate: f64,
    pub click_multiplier: f64,
    pub next_affordable: Option<Affordable>,
    /// `balance / cost` of `next_affordable`; 0 when nothing qualifies.
    pub affordability: f64,
    /// Stage-scaled balance goal (0.4 / 0.6 / 0.8 of the balance, at least
    /// 50) that balance-gain objectives aim for.
    pub target_balance: f64,
}

pub fn build_context(state: &GameState, env: Env<'_>, now: Millis) -> PlayerContext {
    let metrics = StageMetrics::of(state, env, now);
    let stage = classify(&metrics, &env.tuning.context_stages);
    let alpha = env.tuning.affordability_alpha;
    let balance = state.balance;

    let budget = (balance * alpha).max(1.0);
    let next_affordable = env
        .catalog
        .producers
        .iter()
        .map(|p| Affordable {
            producer: p.id.clone(),
            cost: round_up(geometric_series_cost(p.base_cost, p.growth, state.owned(&p.id), 1)),
        })
        .filter(|a| a.cost.is_finite() && a.cost <= budget)
        .min_by(|a, b| a.cost.total_cmp(&b.cost));
    let affordability = next_affordable
        .as_ref()
        .map_or(0.0, |a| if a.cost > 0.0 { balance / a.cost } else { 0.0 });

    let fraction = match stage {
        Stage::Early => 0.4,
        Stage::Mid => 0.6,
        Stage::Late => 0.8,
    };

    PlayerContext {
        stage,
        now,
        balance,
        lifetime: state.lifetime,
        rate: metrics.rate,
        click_multiplier: economy::click_multiplier(env, &state.owned, &state.modifiers),
        next_affordable,
        affordability,
        target_balance: (balance * fraction).round().max(50.0),
    }
}
