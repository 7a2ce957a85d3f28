//! Error types raised by the simulation core.

use thiserror::Error;

use crate::state::Slot;

/// Everything a state transition can reject.
///
/// None of these leave the snapshot half-written: an operation either returns
/// a complete new state or an error and the caller keeps the old one.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SimError {
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("insufficient secondary currency: need {needed}, have {available}")]
    InsufficientSecondary { needed: f64, available: f64 },

    #[error("no eligible objective template for the {slot:?} slot")]
    SelectionExhausted { slot: Slot },

    #[error("persisted state could not be reconstructed: {0}")]
    CorruptedPersistedState(String),

    #[error("degenerate numeric parameter {what}: {value}")]
    NumericDegenerate { what: String, value: f64 },

    #[error("unknown producer: {0}")]
    UnknownProducer(String),

    #[error("cannot own more than u32::MAX of {producer}: have {owned}, buying {count}")]
    QuantityOverflow { producer: String, owned: u32, count: u32 },

    #[error("unknown modifier: {0}")]
    UnknownModifier(String),

    #[error("modifier is still locked: {0}")]
    ModifierLocked(String),

    #[error("modifier already owned: {0}")]
    ModifierOwned(String),

    #[error("prestige unavailable: potential level {potential}, current level {current}")]
    PrestigeUnavailable { potential: u32, current: u32 },

    #[error("no golden event to catch")]
    GoldenUnavailable,

    #[error("configuration error: {0}")]
    Config(String),
}

impl SimError {
    /// Failures the player can act on (earn more, wait) rather than bugs or bad data.
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InsufficientFunds { .. }
                | Self::InsufficientSecondary { .. }
                | Self::SelectionExhausted { .. }
                | Self::ModifierLocked(_)
                | Self::PrestigeUnavailable { .. }
                | Self::GoldenUnavailable
        )
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
