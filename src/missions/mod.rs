//! Adaptive objectives: context, templates, selection, rewards, orchestration.

pub mod context;
pub mod engine;
pub mod rewards;
pub mod selector;
pub mod templates;
