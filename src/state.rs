//! The authoritative game snapshot.
//!
//! `GameState` is plain serde data: every subsystem reads a snapshot and
//! returns a new one, and this is the only thing that is persisted.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

/// Host-supplied wall-clock time in milliseconds.
pub type Millis = u64;

/// Current persisted layout.
pub const STATE_VERSION: u32 = 2;

/// The two independent objective slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Primary,
    Micro,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::Primary, Slot::Micro];

    pub const fn other(self) -> Self {
        match self {
            Slot::Primary => Slot::Micro,
            Slot::Micro => Slot::Primary,
        }
    }
}

/// What a temporary multiplier boosts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Production,
    Click,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemporaryEffect {
    pub multiplier: f64,
    pub expires_at: Millis,
    pub label: String,
}

impl TemporaryEffect {
    pub fn is_active(&self, now: Millis) -> bool {
        now < self.expires_at
    }
}

/// Time-limited global price reduction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub fraction: f64,
    pub expires_at: Millis,
    pub label: String,
}

/// At most one authoritative effect per axis, plus one discount.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Effects {
    pub production: Option<TemporaryEffect>,
    pub click: Option<TemporaryEffect>,
    pub discount: Option<Discount>,
}

impl Effects {
    pub fn get(&self, axis: Axis) -> Option<&TemporaryEffect> {
        match axis {
            Axis::Production => self.production.as_ref(),
            Axis::Click => self.click.as_ref(),
        }
    }

    pub fn get_mut(&mut self, axis: Axis) -> &mut Option<TemporaryEffect> {
        match axis {
            Axis::Production => &mut self.production,
            Axis::Click => &mut self.click,
        }
    }

    /// Live multiplier on `axis`; 1 when absent or expired.
    pub fn multiplier(&self, axis: Axis, now: Millis) -> f64 {
        self.get(axis)
            .filter(|e| e.is_active(now))
            .map_or(1.0, |e| e.multiplier)
    }

    /// Live discount fraction; 0 when absent or expired.
    pub fn discount(&self, now: Millis) -> f64 {
        self.discount
            .as_ref()
            .filter(|d| now < d.expires_at)
            .map_or(0.0, |d| d.fraction)
    }

    /// True when some stored effect has run out and still needs clearing.
    pub fn any_expired(&self, now: Millis) -> bool {
        self.production.as_ref().is_some_and(|e| !e.is_active(now))
            || self.click.as_ref().is_some_and(|e| !e.is_active(now))
            || self.discount.as_ref().is_some_and(|d| now >= d.expires_at)
    }

    /// Drop expired entries (multiplier back to 1). Returns whether anything changed.
    pub fn clear_expired(&mut self, now: Millis) -> bool {
        let before = self.clone();
        if self.production.as_ref().is_some_and(|e| !e.is_active(now)) {
            self.production = None;
        }
        if self.click.as_ref().is_some_and(|e| !e.is_active(now)) {
            self.click = None;
        }
        if self.discount.as_ref().is_some_and(|d| now >= d.expires_at) {
            self.discount = None;
        }
        *self != before
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlashSaleState {
    pub producer: String,
    pub discount: f64,
    pub expires_at: Millis,
}

/// Golden events: the one on screen, if any, and diminishing-returns stacks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoldenLedger {
    /// A golden event can be caught until this time.
    pub visible_until: Option<Millis>,
    /// Consecutive catches inside the diminishing-returns window.
    pub stacks: u32,
    pub last_caught_at: Option<Millis>,
    pub caught: u64,
}

impl GoldenLedger {
    pub fn is_visible(&self, now: Millis) -> bool {
        self.visible_until.is_some_and(|t| now < t)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondaryCurrency {
    pub balance: f64,
    pub staked: f64,
    /// Units minted so far; never decreases within a run.
    pub minted_units: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineLedger {
    /// Last time the state was committed while the player was present.
    pub last_seen: Millis,
    /// Offline time up to here has already been paid out.
    pub claimed_through: Millis,
    pub ever_collected: bool,
}

/// Instantiated target parameters of an objective.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectiveTarget {
    /// Own `qty` more of `producer` than at start.
    BuyMore { producer: String, qty: u32, owned_at_start: u32 },
    /// Grow the balance by `amount` over its value at start.
    GainBalance { amount: f64, balance_at_start: f64 },
    /// Click `clicks` times before `deadline`.
    ClickBurst { clicks: u64, clicks_at_start: u64, deadline: Millis },
    /// Reach `balance_at_start + amount`.
    ReachBalance { amount: f64, balance_at_start: f64 },
    /// Production rate reaches `rate`.
    ReachRate { rate: f64 },
    /// Own at least `qty` of `producer`.
    OwnAtLeast { producer: String, qty: u32 },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    pub current: f64,
    pub target: f64,
    pub done: bool,
    /// Done because time ran out rather than because the target was met.
    pub failed: bool,
    pub time_left_ms: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    /// Unique per instantiation; completion is keyed on it.
    pub serial: u64,
    pub template_id: String,
    pub target: ObjectiveTarget,
    #[serde(default)]
    pub progress: Progress,
    pub started_at: Millis,
    #[serde(default)]
    pub completed: bool,
    /// Set while a completion is being settled; a set flag never pays twice.
    #[serde(default)]
    pub pending_reward: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Objectives {
    pub primary: Option<Objective>,
    pub micro: Option<Objective>,
    pub next_serial: u64,
}

impl Objectives {
    pub fn get(&self, slot: Slot) -> Option<&Objective> {
        match slot {
            Slot::Primary => self.primary.as_ref(),
            Slot::Micro => self.micro.as_ref(),
        }
    }

    pub fn get_mut(&mut self, slot: Slot) -> &mut Option<Objective> {
        match slot {
            Slot::Primary => &mut self.primary,
            Slot::Micro => &mut self.micro,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub template_id: String,
    pub completed_at: Millis,
    pub duration_ms: u64,
    #[serde(default)]
    pub failed: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotLog {
    pub history: VecDeque<HistoryEntry>,
    /// Template id → time its cooldown ends.
    pub cooldowns: BTreeMap<String, Millis>,
    pub completed: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionLog {
    pub primary: SlotLog,
    pub micro: SlotLog,
}

impl MissionLog {
    pub fn get(&self, slot: Slot) -> &SlotLog {
        match slot {
            Slot::Primary => &self.primary,
            Slot::Micro => &self.micro,
        }
    }

    pub fn get_mut(&mut self, slot: Slot) -> &mut SlotLog {
        match slot {
            Slot::Primary => &mut self.primary,
            Slot::Micro => &mut self.micro,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    pub version: u32,
    pub balance: f64,
    /// Total ever earned from production, clicks and rewards; spending never lowers it.
    pub lifetime: f64,
    pub owned: BTreeMap<String, u32>,
    pub modifiers: BTreeSet<String>,
    pub clicks: u64,
    pub secondary: SecondaryCurrency,
    pub prestige_level: u32,
    pub effects: Effects,
    pub flash_sale: Option<FlashSaleState>,
    pub golden: GoldenLedger,
    pub created_at: Millis,
    pub last_purchase_at: Millis,
    pub offline: OfflineLedger,
    pub objectives: Objectives,
    pub missions: MissionLog,
    pub achievements: BTreeSet<String>,
}

impl GameState {
    /// All-zero state for a run starting at `now`.
    pub fn fresh(now: Millis) -> Self {
        Self {
            version: STATE_VERSION,
            created_at: now,
            last_purchase_at: now,
            offline: OfflineLedger { last_seen: now, claimed_through: now, ever_collected: false },
            ..Self::default()
        }
    }

    pub fn owned(&self, producer: &str) -> u32 {
        self.owned.get(producer).copied().unwrap_or(0)
    }

    /// Total units across every producer.
    pub fn producers_owned(&self) -> u64 {
        self.owned.values().map(|&n| u64::from(n)).sum()
    }

    pub fn age_ms(&self, now: Millis) -> u64 {
        now.saturating_sub(self.created_at)
    }

    /// Credit earned currency (balance and lifetime move together).
    pub fn earn(&mut self, amount: f64) {
        if amount > 0.0 && amount.is_finite() {
            self.balance += amount;
            self.lifetime += amount;
        }
    }
}
