// src/systems/flash_sale.rs
#![cfg(feature = "system-flash_sale")]

//! Flash sales: after a stretch without purchases, one random producer goes on
//! sale for a short window. Any purchase ends the sale (see `shop`).

use std::cell::RefCell;
use std::rc::Rc;

use bevy_prng::WyRand;

use crate::mechanics::stoch;
use crate::state::{FlashSaleState, GameState, Millis};
use crate::systems::sdk::{Env, Notify, System, Tone};

pub struct FlashSaleScheduler {
    rng: Rc<RefCell<WyRand>>,
    last_check: Option<Millis>,
}

impl FlashSaleScheduler {
    pub fn new(rng: Rc<RefCell<WyRand>>) -> Self {
        Self { rng, last_check: None }
    }
}

impl System for FlashSaleScheduler {
    fn name(&self) -> &'static str {
        "flash_sale"
    }

    fn step(&mut self, state: &GameState, env: Env<'_>, now: Millis, sink: &mut dyn Notify) -> Option<GameState> {
        let cfg = &env.tuning.flash_sale;
        if self.last_check.is_some_and(|t| now.saturating_sub(t) < cfg.check_ms) {
            return None;
        }
        self.last_check = Some(now);

        let active = state.flash_sale.as_ref().is_some_and(|s| now < s.expires_at);
        if active || now.saturating_sub(state.last_purchase_at) <= cfg.idle_ms {
            return None;
        }
        let producers = &env.catalog.producers;
        if producers.is_empty() {
            return None;
        }
        let pick = &producers[stoch::index(&self.rng, producers.len())];

        let mut next = state.clone();
        next.flash_sale = Some(FlashSaleState {
            producer: pick.id.clone(),
            discount: cfg.discount,
            expires_at: now + cfg.duration_ms,
        });
        tracing::debug!(producer = %pick.id, "flash sale started");
        sink.notify(
            format!("Flash sale: {} -{:.0}% for {}s", pick.name, cfg.discount * 100.0, cfg.duration_ms / 1_000),
            Tone::Info,
        );
        Some(next)
    }
}
