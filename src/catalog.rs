//! Static game content: producers, modifiers, synergies, objective templates
//! and achievements.
//!
//! Everything here is plain data. Behavior is attached by kind tag elsewhere
//! (`missions::templates::strategy_for`), so a catalog can be loaded from JSON
//! and persisted objectives never carry code.

use serde::{Deserialize, Serialize};

use crate::config::guard;
use crate::error::{Result, SimError};
use crate::state::{GameState, Slot};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Contributes to the production rate.
    Passive,
    /// Contributes raw click power (softcapped).
    Click,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProducerDef {
    pub id: String,
    pub name: String,
    pub base_cost: f64,
    /// Strictly greater than 1.
    pub growth: f64,
    /// Units/second for passive producers, raw click power for click producers.
    pub output: f64,
    pub category: Category,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierTarget {
    Producer(String),
    All,
    Click,
}

/// Predicate over the game state, used by modifiers and achievements.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum UnlockRule {
    Always,
    Owned { producer: String, at_least: u32 },
    Lifetime { at_least: f64 },
    Clicks { at_least: u64 },
    Balance { at_least: f64 },
    OfflineCollected,
}

impl UnlockRule {
    pub fn holds(&self, state: &GameState) -> bool {
        match self {
            Self::Always => true,
            Self::Owned { producer, at_least } => state.owned(producer) >= *at_least,
            Self::Lifetime { at_least } => state.lifetime >= *at_least,
            Self::Clicks { at_least } => state.clicks >= *at_least,
            Self::Balance { at_least } => state.balance >= *at_least,
            Self::OfflineCollected => state.offline.ever_collected,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModifierDef {
    pub id: String,
    pub name: String,
    pub target: ModifierTarget,
    pub multiplier: f64,
    pub cost: f64,
    pub unlock: UnlockRule,
}

/// `target` gains `per_unit` (fractional) for every owned `source`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynergyRule {
    pub target: String,
    pub source: String,
    pub per_unit: f64,
}

/// Objective kinds. Each tag maps to one strategy implementation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplateKind {
    BuyAffordableProducer,
    GainBalanceFraction,
    ClickBurst,
    ReachBalanceDynamic,
    ReachRateMilestone,
    OwnAtLeast { producer: String, qty: u32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveTemplate {
    pub id: String,
    pub slot: Slot,
    #[serde(flatten)]
    pub kind: TemplateKind,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Base affinity added to the context-dependent score.
    #[serde(default)]
    pub base_score: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AchievementDef {
    pub id: String,
    pub name: String,
    pub rule: UnlockRule,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub producers: Vec<ProducerDef>,
    pub modifiers: Vec<ModifierDef>,
    pub synergies: Vec<SynergyRule>,
    pub templates: Vec<ObjectiveTemplate>,
    pub achievements: Vec<AchievementDef>,
}

impl Catalog {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| SimError::Config(e.to_string()))
    }

    pub fn producer(&self, id: &str) -> Option<&ProducerDef> {
        self.producers.iter().find(|p| p.id == id)
    }

    pub fn modifier(&self, id: &str) -> Option<&ModifierDef> {
        self.modifiers.iter().find(|m| m.id == id)
    }

    pub fn template(&self, id: &str) -> Option<&ObjectiveTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn templates_for(&self, slot: Slot) -> impl Iterator<Item = &ObjectiveTemplate> {
        self.templates.iter().filter(move |t| t.slot == slot)
    }

    /// Reject (`strict`) or clamp producers and modifiers that would break the
    /// price curve or the multiplier chain.
    pub fn sanitize(mut self, strict: bool) -> Result<Self> {
        for p in &mut self.producers {
            p.growth = guard(strict, "producer growth", p.growth, p.growth > 1.0, 1.0001)?;
            p.base_cost = guard(strict, "producer base_cost", p.base_cost, p.base_cost > 0.0, 1.0)?;
            p.output = guard(strict, "producer output", p.output, p.output >= 0.0, 0.0)?;
        }
        for m in &mut self.modifiers {
            m.multiplier = guard(strict, "modifier multiplier", m.multiplier, m.multiplier > 0.0, 1.0)?;
            m.cost = guard(strict, "modifier cost", m.cost, m.cost >= 0.0, 0.0)?;
        }
        for s in &mut self.synergies {
            s.per_unit = guard(strict, "synergy per_unit", s.per_unit, s.per_unit >= 0.0, 0.0)?;
        }
        Ok(self)
    }

    /// Reference content: eight passive tiers, seven click tiers.
    pub fn standard() -> Self {
        let producers = [
            ("oven", "Oven", 60.0, 1.13, 0.6, Category::Passive),
            ("bakery", "Bakery", 500.0, 1.135, 5.0, Category::Passive),
            ("farm_cps", "Farm", 5_000.0, 1.14, 32.0, Category::Passive),
            ("factory_cps", "Factory", 60_000.0, 1.145, 180.0, Category::Passive),
            ("bank_cps", "Bank", 750_000.0, 1.15, 900.0, Category::Passive),
            ("temple", "Temple", 9_000_000.0, 1.155, 4_200.0, Category::Passive),
            ("lab", "Laboratory", 120_000_000.0, 1.16, 18_000.0, Category::Passive),
            ("portal", "Portal", 1_800_000_000.0, 1.165, 75_000.0, Category::Passive),
            ("cursor", "Cursor", 18.0, 1.15, 0.04, Category::Click),
            ("grandma", "Grandma", 140.0, 1.155, 0.14, Category::Click),
            ("farm", "Click Farm", 1_400.0, 1.16, 0.7, Category::Click),
            ("factory", "Click Factory", 18_000.0, 1.165, 2.8, Category::Click),
            ("bank", "Click Bank", 220_000.0, 1.17, 9.0, Category::Click),
            ("ai", "Bakery AI", 3_000_000.0, 1.175, 27.0, Category::Click),
            ("tm", "Time Machine", 32_000_000.0, 1.18, 72.0, Category::Click),
        ]
        .into_iter()
        .map(|(id, name, base_cost, growth, output, category)| ProducerDef {
            id: id.into(),
            name: name.into(),
            base_cost,
            growth,
            output,
            category,
        })
        .collect();

        let owned = |producer: &str, at_least| UnlockRule::Owned { producer: producer.into(), at_least };
        let on = |producer: &str| ModifierTarget::Producer(producer.into());
        let modifiers = vec![
            ("cursor_10", "Oiled Cursor", on("cursor"), 2.0, 320.0, owned("cursor", 10)),
            ("cursor_25", "Macro Clicks", on("cursor"), 2.0, 5_200.0, owned("cursor", 25)),
            ("grandma_10", "Turbo Tea", on("grandma"), 2.0, 4_800.0, owned("grandma", 10)),
            ("farm_10", "Chocolate Fertilizer", on("farm"), 2.0, 38_000.0, owned("farm", 10)),
            ("oven_10", "Firestone", on("oven"), 2.0, 600.0, owned("oven", 10)),
            ("bakery_10", "Ancient Leaven", on("bakery"), 2.0, 5_000.0, owned("bakery", 10)),
            ("farm_cps_10", "Drip Irrigation", on("farm_cps"), 2.0, 50_000.0, owned("farm_cps", 10)),
            ("factory_cps_10", "Optimized Line", on("factory_cps"), 2.0, 600_000.0, owned("factory_cps", 10)),
            ("global_s", "Quantum Yeast", ModifierTarget::All, 1.1, 260_000.0, UnlockRule::Lifetime { at_least: 50_000.0 }),
            ("click_1", "Nitro Mouse", ModifierTarget::Click, 1.3, 6_200.0, UnlockRule::Clicks { at_least: 100 }),
        ]
        .into_iter()
        .map(|(id, name, target, multiplier, cost, unlock)| ModifierDef {
            id: id.into(),
            name: name.into(),
            target,
            multiplier,
            cost,
            unlock,
        })
        .collect();

        let synergies = [("cursor", "grandma", 0.01), ("grandma", "farm", 0.005), ("farm", "factory", 0.002)]
            .into_iter()
            .map(|(target, source, per_unit)| SynergyRule { target: target.into(), source: source.into(), per_unit })
            .collect();

        let template = |id: &str, slot, kind, tags: &[&str], base_score| ObjectiveTemplate {
            id: id.into(),
            slot,
            kind,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            base_score,
        };
        let templates = vec![
            template("reach_balance_dynamic", Slot::Primary, TemplateKind::ReachBalanceDynamic, &["bank"], 0.0),
            template("reach_rate_milestone", Slot::Primary, TemplateKind::ReachRateMilestone, &["rate"], 0.0),
            template(
                "own_producers",
                Slot::Primary,
                TemplateKind::OwnAtLeast { producer: "cursor".into(), qty: 25 },
                &["build"],
                0.0,
            ),
            template("buy_affordable_producer", Slot::Micro, TemplateKind::BuyAffordableProducer, &["build"], 0.0),
            template("gain_balance_fraction", Slot::Micro, TemplateKind::GainBalanceFraction, &["bank"], 0.0),
            template("click_burst", Slot::Micro, TemplateKind::ClickBurst, &["click"], 0.0),
        ];

        let achievements = vec![
            ("first_click", "First Bite", UnlockRule::Clicks { at_least: 1 }),
            ("ten_clicks", "Clicking Along", UnlockRule::Clicks { at_least: 10 }),
            ("hundred_clicks", "Click Frenzy", UnlockRule::Clicks { at_least: 100 }),
            ("bank_1k", "Nest Egg", UnlockRule::Balance { at_least: 1_000.0 }),
            ("bank_1m", "Heavyweight", UnlockRule::Balance { at_least: 1_000_000.0 }),
            ("ten_grandmas", "Teatime", owned("grandma", 10)),
            ("fifty_cursors", "Octopus", owned("cursor", 50)),
            ("offline", "Rentier", UnlockRule::OfflineCollected),
        ]
        .into_iter()
        .map(|(id, name, rule)| AchievementDef { id: id.into(), name: name.into(), rule })
        .collect();

        Self { producers, modifiers, synergies, templates, achievements }
    }
}
