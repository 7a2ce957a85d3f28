//! Tuning constants.
//!
//! Everything numeric the simulation depends on lives here with a sane
//! default, so a host can ship `Tuning::default()` or load a partial JSON
//! override. `sanitize` is the single gate against degenerate values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::mechanics::pricing::MilestoneStep;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Softcap constant K for the click multiplier.
    pub softcap_k: f64,
    /// Click value before any multiplier.
    pub base_click: f64,
    /// Production bonus per prestige level.
    pub prestige_bonus: f64,
    /// Production bonus per staked secondary unit.
    pub stake_bonus: f64,
    pub milestones: Vec<MilestoneStep>,
    pub loop_timing: LoopTiming,
    pub faucet: Faucet,
    /// Gates used by the context builder (lifetime, rate, age).
    pub context_stages: StageGates,
    /// Gates used by the reward adapter (adds producers owned).
    pub reward_stages: StageGates,
    /// A producer counts as affordable when its price is ≤ α × balance.
    pub affordability_alpha: f64,
    pub selector: SelectorWeights,
    /// Seconds of cooldown applied to a template after it completes.
    pub cooldowns: BTreeMap<String, u64>,
    pub effects: EffectLimits,
    pub offline: OfflineAccrual,
    pub flash_sale: FlashSale,
    pub golden: GoldenEvents,
    pub prestige: PrestigeRules,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopTiming {
    pub tick_ms: u64,
    pub commit_ms: u64,
}
impl Default for LoopTiming {
    fn default() -> Self {
        Self { tick_ms: 300, commit_ms: 600 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Faucet {
    /// Lifetime production per minted unit.
    pub per_lifetime: f64,
    /// Secondary currency credited per unit.
    pub unit_amount: f64,
}
impl Default for Faucet {
    fn default() -> Self {
        Self { per_lifetime: 20_000.0, unit_amount: 0.001 }
    }
}

/// One stage boundary. A player stays *below* the boundary while ANY metric
/// is under its gate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageGate {
    pub lifetime: f64,
    pub rate: f64,
    pub age_ms: u64,
    /// `None` ignores the producers-owned metric.
    #[serde(default)]
    pub producers: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageGates {
    pub mid: StageGate,
    pub late: StageGate,
}
impl StageGates {
    pub fn context_defaults() -> Self {
        Self {
            mid: StageGate { lifetime: 10_000.0, rate: 10.0, age_ms: 30 * 60_000, producers: None },
            late: StageGate { lifetime: 1_000_000.0, rate: 500.0, age_ms: 180 * 60_000, producers: None },
        }
    }
    pub fn reward_defaults() -> Self {
        Self {
            mid: StageGate { lifetime: 10_000.0, rate: 10.0, age_ms: 30 * 60_000, producers: Some(20) },
            late: StageGate { lifetime: 1_000_000.0, rate: 500.0, age_ms: 180 * 60_000, producers: Some(100) },
        }
    }
}
impl Default for StageGates {
    fn default() -> Self {
        Self::context_defaults()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorWeights {
    /// How many recent completions count as "recent".
    pub variety_window: usize,
    pub variety_penalty: f64,
    pub variety_bonus: f64,
    /// A template whose cooldown ended less than this long ago is penalized.
    pub anti_spam_window_ms: u64,
    pub anti_spam_penalty: f64,
    /// Completion log length per slot.
    pub history_len: usize,
}
impl Default for SelectorWeights {
    fn default() -> Self {
        Self {
            variety_window: 5,
            variety_penalty: 0.2,
            variety_bonus: 0.1,
            anti_spam_window_ms: 15_000,
            anti_spam_penalty: 0.3,
            history_len: 20,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectLimits {
    /// Hard ceiling on how far into the future a merged effect may expire.
    pub max_duration_ms: u64,
    /// Ceiling on the merged reward discount.
    pub max_discount: f64,
}
impl Default for EffectLimits {
    fn default() -> Self {
        Self { max_duration_ms: 180_000, max_discount: 0.5 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineAccrual {
    /// Absences shorter than this grant nothing.
    pub min_secs: u64,
    /// Up to this absence the short ratio applies in full.
    pub short_secs: u64,
    /// Absence cap; the ratio decays linearly to `ratio_cap` here.
    pub max_secs: u64,
    pub ratio_short: f64,
    pub ratio_cap: f64,
}
impl Default for OfflineAccrual {
    fn default() -> Self {
        Self { min_secs: 3, short_secs: 600, max_secs: 7_200, ratio_short: 0.10, ratio_cap: 0.03 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashSale {
    pub check_ms: u64,
    /// No purchase for this long starts a sale.
    pub idle_ms: u64,
    pub discount: f64,
    pub duration_ms: u64,
}
impl Default for FlashSale {
    fn default() -> Self {
        Self { check_ms: 2_000, idle_ms: 60_000, discount: 0.25, duration_ms: 20_000 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoldenEvents {
    /// Delay before the next golden event, drawn uniformly from this range.
    pub spawn_min_ms: u64,
    pub spawn_max_ms: u64,
    /// How long an event stays catchable.
    pub visible_ms: u64,
    /// Catches closer together than this stack diminishing returns.
    pub dr_window_ms: u64,
    /// Payout factor per stack: `dr_factor ^ stacks`.
    pub dr_factor: f64,
    /// Roll weights: production frenzy, click frenzy, lucky, crumbs.
    pub weights: [f64; 4],
    pub frenzy_max: f64,
    pub frenzy_secs: u64,
    pub click_frenzy_max: f64,
    pub click_frenzy_secs: u64,
    /// Lucky pays `max(balance × lucky_balance, rate × lucky_rate_secs)`.
    pub lucky_balance: f64,
    pub lucky_rate_secs: f64,
    /// Crumbs pay this many clicks' worth.
    pub crumb_clicks: f64,
}
impl Default for GoldenEvents {
    fn default() -> Self {
        Self {
            spawn_min_ms: 100_000,
            spawn_max_ms: 150_000,
            visible_ms: 10_000,
            dr_window_ms: 120_000,
            dr_factor: 0.85,
            weights: [0.35, 0.30, 0.20, 0.15],
            frenzy_max: 5.0,
            frenzy_secs: 20,
            click_frenzy_max: 10.0,
            click_frenzy_secs: 12,
            lucky_balance: 0.10,
            lucky_rate_secs: 12.0,
            crumb_clicks: 30.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrestigeRules {
    /// Potential level is `floor(sqrt(lifetime / lifetime_unit))`.
    pub lifetime_unit: f64,
    pub min_balance: f64,
}
impl Default for PrestigeRules {
    fn default() -> Self {
        Self { lifetime_unit: 1_000_000.0, min_balance: 100_000.0 }
    }
}

impl Default for Tuning {
    fn default() -> Self {
        let cooldowns = [
            ("buy_affordable_producer", 45),
            ("gain_balance_fraction", 60),
            ("click_burst", 90),
            ("reach_balance_dynamic", 120),
            ("reach_rate_milestone", 120),
            ("own_producers", 180),
        ]
        .into_iter()
        .map(|(id, secs)| (id.to_string(), secs))
        .collect();

        Self {
            softcap_k: 16.0,
            base_click: 1.0,
            prestige_bonus: 0.02,
            stake_bonus: 0.5,
            milestones: vec![
                MilestoneStep { at: 10, factor: 1.15 },
                MilestoneStep { at: 25, factor: 1.4 },
                MilestoneStep { at: 50, factor: 2.0 },
                MilestoneStep { at: 100, factor: 3.5 },
                MilestoneStep { at: 200, factor: 5.0 },
            ],
            loop_timing: LoopTiming::default(),
            faucet: Faucet::default(),
            context_stages: StageGates::context_defaults(),
            reward_stages: StageGates::reward_defaults(),
            affordability_alpha: 0.7,
            selector: SelectorWeights::default(),
            cooldowns,
            effects: EffectLimits::default(),
            offline: OfflineAccrual::default(),
            flash_sale: FlashSale::default(),
            golden: GoldenEvents::default(),
            prestige: PrestigeRules::default(),
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override; missing keys keep defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| SimError::Config(e.to_string()))
    }

    /// Cooldown for a template id, in milliseconds (0 when unset).
    pub fn cooldown_ms(&self, template_id: &str) -> u64 {
        self.cooldowns.get(template_id).copied().unwrap_or(0) * 1_000
    }

    /// Reject (`strict`) or clamp degenerate values.
    pub fn sanitize(mut self, strict: bool) -> Result<Self> {
        let d = Tuning::default();
        self.softcap_k = guard(strict, "softcap_k", self.softcap_k, self.softcap_k > 0.0, d.softcap_k)?;
        self.base_click = guard(strict, "base_click", self.base_click, self.base_click > 0.0, d.base_click)?;
        self.prestige_bonus =
            guard(strict, "prestige_bonus", self.prestige_bonus, self.prestige_bonus >= 0.0, d.prestige_bonus)?;
        self.stake_bonus = guard(strict, "stake_bonus", self.stake_bonus, self.stake_bonus >= 0.0, d.stake_bonus)?;
        self.faucet.per_lifetime = guard(
            strict,
            "faucet.per_lifetime",
            self.faucet.per_lifetime,
            self.faucet.per_lifetime > 0.0,
            d.faucet.per_lifetime,
        )?;
        self.affordability_alpha = guard(
            strict,
            "affordability_alpha",
            self.affordability_alpha,
            self.affordability_alpha > 0.0,
            d.affordability_alpha,
        )?;
        self.effects.max_discount = guard(
            strict,
            "effects.max_discount",
            self.effects.max_discount,
            (0.0..1.0).contains(&self.effects.max_discount),
            d.effects.max_discount,
        )?;
        self.golden.dr_factor = guard(
            strict,
            "golden.dr_factor",
            self.golden.dr_factor,
            self.golden.dr_factor > 0.0 && self.golden.dr_factor <= 1.0,
            d.golden.dr_factor,
        )?;
        for w in &mut self.golden.weights {
            *w = guard(strict, "golden weight", *w, *w >= 0.0, 0.0)?;
        }
        if self.golden.spawn_max_ms < self.golden.spawn_min_ms {
            if strict {
                return Err(SimError::NumericDegenerate {
                    what: "golden.spawn_max_ms".into(),
                    value: self.golden.spawn_max_ms as f64,
                });
            }
            tracing::warn!("golden spawn range inverted, swapping bounds");
            std::mem::swap(&mut self.golden.spawn_min_ms, &mut self.golden.spawn_max_ms);
        }
        for step in &mut self.milestones {
            step.factor = guard(strict, "milestone factor", step.factor, step.factor >= 1.0, 1.0)?;
        }
        if self.loop_timing.tick_ms == 0 {
            if strict {
                return Err(SimError::NumericDegenerate { what: "loop_timing.tick_ms".into(), value: 0.0 });
            }
            tracing::warn!("tick_ms = 0, clamping to default");
            self.loop_timing.tick_ms = d.loop_timing.tick_ms;
        }
        if self.offline.max_secs <= self.offline.short_secs {
            if strict {
                return Err(SimError::NumericDegenerate {
                    what: "offline.max_secs".into(),
                    value: self.offline.max_secs as f64,
                });
            }
            tracing::warn!("offline window inverted, restoring defaults");
            self.offline = d.offline;
        }
        Ok(self)
    }
}

/// Pass `value` through when `ok` and finite; otherwise fail (strict) or fall back.
pub(crate) fn guard(strict: bool, what: &str, value: f64, ok: bool, fallback: f64) -> Result<f64> {
    if ok && value.is_finite() {
        return Ok(value);
    }
    if strict {
        return Err(SimError::NumericDegenerate { what: what.to_string(), value });
    }
    tracing::warn!(what, value, fallback, "degenerate tuning value clamped");
    Ok(fallback)
}
