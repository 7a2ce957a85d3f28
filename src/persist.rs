//! Persistence hooks: `serialize(state) -> blob`, `migrate(blob) -> state`.
//!
//! The blob is JSON. Current blobs carry `version`; blobs without one are the
//! legacy layout (`cookies`, `items`, `upgrades`, `prestige.chips`, ...) and
//! are upgraded field by field. A blob that cannot be turned into a valid
//! state never surfaces as an error to the host: `migrate` falls back to a
//! fresh state and reports why.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, SimError};
use crate::state::{GameState, GoldenLedger, Millis, OfflineLedger, SecondaryCurrency, STATE_VERSION};

pub fn serialize(state: &GameState) -> Result<Vec<u8>> {
    serde_json::to_vec(state).map_err(|e| SimError::CorruptedPersistedState(e.to_string()))
}

#[derive(Clone, Debug, PartialEq)]
pub enum MigrationStatus {
    /// No blob; a new run was started.
    Fresh,
    Loaded,
    Upgraded { from: u32 },
    /// The blob was unusable and was replaced by a fresh state.
    Reset { reason: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Migrated {
    pub state: GameState,
    pub status: MigrationStatus,
}

/// Reconstruct a state from `blob`, falling back to `GameState::fresh(now)`.
pub fn migrate(blob: &[u8], now: Millis) -> Migrated {
    if blob.iter().all(u8::is_ascii_whitespace) {
        return Migrated { state: GameState::fresh(now), status: MigrationStatus::Fresh };
    }
    match try_migrate(blob) {
        Ok((state, status)) => Migrated { state, status },
        Err(e) => {
            tracing::warn!(%e, "persisted state unusable, starting fresh");
            Migrated { state: GameState::fresh(now), status: MigrationStatus::Reset { reason: e.to_string() } }
        }
    }
}

/// Strict variant of [`migrate`]: errors instead of falling back.
pub fn try_migrate(blob: &[u8]) -> Result<(GameState, MigrationStatus)> {
    let value: Value = serde_json::from_slice(blob).map_err(corrupt)?;
    let Some(obj) = value.as_object() else {
        return Err(SimError::CorruptedPersistedState("top level is not an object".into()));
    };

    let version = obj.get("version").and_then(Value::as_u64);

    let (state, status) = match version {
        Some(v) if v > u64::from(STATE_VERSION) => {
            return Err(SimError::CorruptedPersistedState(format!("written by a newer layout (version {v})")));
        }
        Some(v) if v == u64::from(STATE_VERSION) => {
            (serde_json::from_value::<GameState>(value).map_err(corrupt)?, MigrationStatus::Loaded)
        }
        Some(v) => {
            let mut state = serde_json::from_value::<GameState>(value).map_err(corrupt)?;
            state.version = STATE_VERSION;
            (state, MigrationStatus::Upgraded { from: v as u32 })
        }
        None => {
            let legacy = serde_json::from_value::<LegacyV1>(value).map_err(corrupt)?;
            (legacy.upgrade(), MigrationStatus::Upgraded { from: 1 })
        }
    };
    validate(&state)?;
    Ok((state, status))
}

fn corrupt(e: serde_json::Error) -> SimError {
    SimError::CorruptedPersistedState(e.to_string())
}

fn validate(state: &GameState) -> Result<()> {
    let quantities = [
        ("balance", state.balance),
        ("lifetime", state.lifetime),
        ("secondary.balance", state.secondary.balance),
        ("secondary.staked", state.secondary.staked),
    ];
    for (what, v) in quantities {
        if !v.is_finite() || v < 0.0 {
            return Err(SimError::CorruptedPersistedState(format!("{what} = {v}")));
        }
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LegacyPrestige {
    chips: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LegacyStats {
    clicks: u64,
    last_purchase_ts: Option<Millis>,
    golden_clicks: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LegacyCrypto {
    balance: f64,
    staked: f64,
    minted_units: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LegacyFlags {
    offline_collected: bool,
    golden_last_ts: Millis,
    golden_stacks: u32,
}

/// Ids that changed between layouts.
const RENAMED: [(&str, &str); 11] = [
    ("farmm_10", "farm_10"),
    ("farmcps_10", "farm_cps_10"),
    ("factorycps_10", "factory_cps_10"),
    ("cpc_1", "click_1"),
    ("firstClick", "first_click"),
    ("tenClicks", "ten_clicks"),
    ("hundredClicks", "hundred_clicks"),
    ("1kBank", "bank_1k"),
    ("1mBank", "bank_1m"),
    ("10grandmas", "ten_grandmas"),
    ("50cursor", "fifty_cursors"),
];

fn renamed(id: &str) -> Option<&'static str> {
    RENAMED.iter().find(|(old, _)| *old == id).map(|(_, new)| *new)
}

/// First-generation save layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LegacyV1 {
    cookies: f64,
    lifetime: f64,
    items: BTreeMap<String, u32>,
    upgrades: BTreeMap<String, bool>,
    prestige: LegacyPrestige,
    stats: LegacyStats,
    crypto: LegacyCrypto,
    created_at: Millis,
    last_ts: Millis,
    flags: LegacyFlags,
    unlocked: BTreeMap<String, bool>,
}

impl LegacyV1 {
    fn upgrade(self) -> GameState {
        let enabled = |m: BTreeMap<String, bool>| -> BTreeSet<String> {
            m.into_iter().filter(|(_, on)| *on).map(|(id, _)| renamed(&id).unwrap_or(id.as_str()).to_string()).collect()
        };
        GameState {
            version: STATE_VERSION,
            balance: self.cookies,
            lifetime: self.lifetime.max(self.cookies),
            owned: self.items.into_iter().filter(|(_, n)| *n > 0).collect(),
            modifiers: enabled(self.upgrades),
            clicks: self.stats.clicks,
            secondary: SecondaryCurrency {
                balance: self.crypto.balance,
                staked: self.crypto.staked,
                minted_units: self.crypto.minted_units,
            },
            prestige_level: self.prestige.chips,
            created_at: self.created_at,
            last_purchase_at: self.stats.last_purchase_ts.unwrap_or(self.last_ts),
            offline: OfflineLedger {
                last_seen: self.last_ts,
                claimed_through: self.last_ts,
                ever_collected: self.flags.offline_collected,
            },
            golden: GoldenLedger {
                visible_until: None,
                stacks: self.flags.golden_stacks,
                last_caught_at: (self.flags.golden_last_ts > 0).then_some(self.flags.golden_last_ts),
                caught: self.stats.golden_clicks,
            },
            achievements: enabled(self.unlocked),
            ..GameState::default()
        }
    }
}
