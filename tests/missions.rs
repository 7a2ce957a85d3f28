// tests/missions.rs
use std::cell::RefCell;
use std::rc::Rc;

use bevy_prng::WyRand;
use idle_core::catalog::Catalog;
use idle_core::config::{StageGates, Tuning};
use idle_core::missions::context::{build_context, classify, Stage, StageMetrics};
use idle_core::missions::engine::MissionEngine;
use idle_core::missions::rewards::{adapt, detect_stage};
use idle_core::missions::selector::{score_candidates, select, Candidate};
use idle_core::missions::templates::strategy_for;
use idle_core::state::{Axis, GameState, HistoryEntry, Objective, ObjectiveTarget, Progress, Slot};
use idle_core::systems::sdk::{Env, Notice, Silent, Tone};
use idle_core::SimError;
use rand_core::SeedableRng;

fn rng(seed: u64) -> Rc<RefCell<WyRand>> {
    Rc::new(RefCell::new(WyRand::from_seed(seed.to_le_bytes())))
}

fn objective(serial: u64, template_id: &str, target: ObjectiveTarget, started_at: u64) -> Objective {
    Objective {
        serial,
        template_id: template_id.into(),
        target,
        progress: Progress::default(),
        started_at,
        completed: false,
        pending_reward: false,
    }
}

fn score_of(cands: &[Candidate<'_>], id: &str) -> Option<f64> {
    cands.iter().find(|c| c.template.id == id).map(|c| c.score)
}

const MIN: u64 = 60_000;

/* ──────────────────────────────────────────────────────────────────────────
1) Stage classification
────────────────────────────────────────────────────────────────────────── */

#[test]
fn stage_reference_scenarios() {
    let gates = StageGates::context_defaults();
    let early = StageMetrics { lifetime: 5_000.0, rate: 5.0, age_ms: 10 * MIN, producers: 4 };
    assert_eq!(classify(&early, &gates), Stage::Early);

    let late = StageMetrics { lifetime: 2_000_000.0, rate: 600.0, age_ms: 240 * MIN, producers: 150 };
    assert_eq!(classify(&late, &gates), Stage::Late);

    let one_low = StageMetrics { age_ms: 5 * MIN, ..late };
    assert_eq!(classify(&one_low, &gates), Stage::Early, "one metric under the mid gate keeps early");
}

#[test]
fn stage_never_drops_when_a_metric_grows() {
    let gates = StageGates::reward_defaults();
    let lifetimes = [0.0, 5_000.0, 20_000.0, 2_000_000.0];
    let rates = [0.0, 20.0, 800.0];
    let ages = [0, 40 * MIN, 200 * MIN];
    let producers = [0, 30, 120];

    for &l in &lifetimes {
        for &r in &rates {
            for &a in &ages {
                for &p in &producers {
                    let m = StageMetrics { lifetime: l, rate: r, age_ms: a, producers: p };
                    let s = classify(&m, &gates);
                    let bumps = [
                        StageMetrics { lifetime: l * 10.0 + 1.0, ..m },
                        StageMetrics { rate: r * 10.0 + 1.0, ..m },
                        StageMetrics { age_ms: a * 10 + 1, ..m },
                        StageMetrics { producers: p * 10 + 1, ..m },
                    ];
                    for b in bumps {
                        assert!(classify(&b, &gates) >= s, "stage dropped from {m:?} to {b:?}");
                    }
                }
            }
        }
    }
}

#[test]
fn context_summarizes_the_snapshot() {
    let (catalog, tuning) = (Catalog::standard(), Tuning::default());
    let env = Env { catalog: &catalog, tuning: &tuning };
    let mut s = GameState::fresh(0);
    s.balance = 100.0;

    let ctx = build_context(&s, env, 1_000);
    assert_eq!(ctx.stage, Stage::Early);
    assert_eq!(ctx.target_balance, 50.0, "floor of 50");
    let pick = ctx.next_affordable.expect("cursor fits under 0.7 × 100");
    assert_eq!(pick.producer, "cursor");
    assert_eq!(pick.cost, 18.0);
    assert!((ctx.affordability - 100.0 / 18.0).abs() < 1e-12);

    s.balance = 10.0;
    let ctx = build_context(&s, env, 1_000);
    assert!(ctx.next_affordable.is_none());
    assert_eq!(ctx.affordability, 0.0);
}

#[test]
fn balance_gain_aims_at_the_context_target() {
    let (catalog, tuning) = (Catalog::standard(), Tuning::default());
    let env = Env { catalog: &catalog, tuning: &tuning };
    let template = catalog.template("gain_balance_fraction").unwrap();
    let mut s = GameState::fresh(0);
    s.balance = 1_000.0;

    let ctx = build_context(&s, env, 1_000);
    assert_eq!(ctx.target_balance, 400.0, "early stage aims at 40% of the balance");
    let target = strategy_for(&template.kind).instantiate(template, &s, &ctx);
    assert_eq!(target, Some(ObjectiveTarget::GainBalance { amount: ctx.target_balance, balance_at_start: 1_000.0 }));
}

/* ──────────────────────────────────────────────────────────────────────────
2) Reward adapter
────────────────────────────────────────────────────────────────────────── */

#[test]
fn early_reward_for_a_thousand_is_twenty_five() {
    let (catalog, tuning) = (Catalog::standard(), Tuning::default());
    let env = Env { catalog: &catalog, tuning: &tuning };
    let mut s = GameState::fresh(0);
    s.balance = 1_000.0;
    s.lifetime = 1_000.0;
    assert_eq!(detect_stage(&s, env, 60_000), Stage::Early);

    let rng = rng(3);
    for _ in 0..50 {
        let r = adapt(&s, env, 60_000, &rng);
        assert_eq!(r.currency, 25.0);
        let e = r.effect.expect("early rewards carry an effect");
        assert!((1.10..=1.15).contains(&e.multiplier), "multiplier {}", e.multiplier);
        assert!((15_000..=20_000).contains(&e.duration_ms));
        assert_eq!(e.duration_ms % 1_000, 0, "whole seconds");
        assert!(r.discount.is_none());
    }
}

#[test]
fn late_reward_scales_with_rate() {
    let (catalog, tuning) = (Catalog::standard(), Tuning::default());
    let env = Env { catalog: &catalog, tuning: &tuning };
    let mut s = GameState::fresh(0);
    s.owned.insert("bank_cps".into(), 120);
    s.balance = 10.0;
    s.lifetime = 5_000_000.0;
    let now = 200 * MIN;
    assert_eq!(detect_stage(&s, env, now), Stage::Late);

    let rate = 120.0 * 900.0;
    let rng = rng(11);
    for _ in 0..50 {
        let r = adapt(&s, env, now, &rng);
        assert_eq!(r.currency, rate * 30.0, "floor of 30s of production");
        assert!(r.effect.is_some() != r.discount.is_some(), "exactly one of effect or discount");
        if let Some(d) = r.discount {
            assert!((0.10..=0.20).contains(&d.fraction));
        }
    }
}

/* ──────────────────────────────────────────────────────────────────────────
3) Selector
────────────────────────────────────────────────────────────────────────── */

#[test]
fn fresh_run_gets_balance_goal_and_click_burst() {
    let (catalog, tuning) = (Catalog::standard(), Tuning::default());
    let env = Env { catalog: &catalog, tuning: &tuning };
    let engine = MissionEngine::new(rng(1));

    let s = engine.update(&GameState::fresh(0), env, 0, &mut Silent);
    let primary = s.objectives.get(Slot::Primary).expect("primary filled");
    let micro = s.objectives.get(Slot::Micro).expect("micro filled");
    assert_eq!(primary.template_id, "reach_balance_dynamic");
    assert_eq!(micro.template_id, "click_burst");
    assert_ne!(primary.serial, micro.serial);
    assert_eq!(s.objectives.next_serial, 2);
}

#[test]
fn selector_drops_tags_active_in_the_other_slot() {
    let (catalog, tuning) = (Catalog::standard(), Tuning::default());
    let env = Env { catalog: &catalog, tuning: &tuning };
    let mut s = GameState::fresh(0);
    s.balance = 1_000.0;
    s.objectives.primary = Some(objective(
        0,
        "reach_balance_dynamic",
        ObjectiveTarget::ReachBalance { amount: 2_500.0, balance_at_start: 1_000.0 },
        0,
    ));

    let ctx = build_context(&s, env, 1_000);
    let ids: Vec<&str> = score_candidates(&s, env, &ctx, Slot::Micro, None)
        .iter()
        .map(|c| c.template.id.as_str())
        .collect();
    assert!(!ids.contains(&"gain_balance_fraction"), "bank tag is taken by the primary slot: {ids:?}");
    assert!(ids.contains(&"buy_affordable_producer"));
    assert!(ids.contains(&"click_burst"));

    s.objectives.primary = None;
    let ctx = build_context(&s, env, 1_000);
    let ids: Vec<String> = score_candidates(&s, env, &ctx, Slot::Micro, None)
        .into_iter()
        .map(|c| c.template.id.clone())
        .collect();
    assert!(ids.iter().any(|id| id == "gain_balance_fraction"));
}

#[test]
fn cooling_templates_are_skipped_until_expiry() {
    let (catalog, tuning) = (Catalog::standard(), Tuning::default());
    let env = Env { catalog: &catalog, tuning: &tuning };
    let mut s = GameState::fresh(0);
    s.missions.micro.cooldowns.insert("click_burst".into(), 10_000);

    let ctx = build_context(&s, env, 5_000);
    assert_eq!(select(&s, env, &ctx, Slot::Micro, None), Err(SimError::SelectionExhausted { slot: Slot::Micro }));

    let ctx = build_context(&s, env, 10_000);
    let obj = select(&s, env, &ctx, Slot::Micro, None).unwrap();
    assert_eq!(obj.template_id, "click_burst");
}

#[test]
fn settled_template_is_never_reselected() {
    let (catalog, mut tuning) = (Catalog::standard(), Tuning::default());
    tuning.cooldowns.insert("click_burst".into(), 0);
    let env = Env { catalog: &catalog, tuning: &tuning };
    let engine = MissionEngine::new(rng(21));

    // With an empty bank, click_burst is the only eligible micro template.
    let mut s = GameState::fresh(0);
    let ctx = build_context(&s, env, 5_000);
    assert_eq!(select(&s, env, &ctx, Slot::Micro, None).unwrap().template_id, "click_burst");
    assert_eq!(
        select(&s, env, &ctx, Slot::Micro, Some("click_burst")),
        Err(SimError::SelectionExhausted { slot: Slot::Micro })
    );

    let mut obj = objective(4, "click_burst", ObjectiveTarget::ClickBurst { clicks: 50, clicks_at_start: 0, deadline: 30_000 }, 0);
    obj.progress.done = true;
    obj.completed = true;
    obj.pending_reward = true;
    s.objectives.micro = Some(obj);
    s.objectives.next_serial = 5;

    let settled = engine.settle(&s, env, 5_000, Slot::Micro, 4);
    assert!(settled.missions.micro.cooldowns.get("click_burst").is_none_or(|&until| until <= 5_000));
    assert!(settled.objectives.micro.is_none(), "the only candidate was the one just settled");

    // Once something else qualifies, the replacement is a different template.
    s.balance = 100.0;
    let settled = engine.settle(&s, env, 5_000, Slot::Micro, 4);
    let replacement = settled.objectives.get(Slot::Micro).expect("slot refilled");
    assert_ne!(replacement.template_id, "click_burst");
}

#[test]
fn recent_completion_lowers_the_score() {
    let (catalog, tuning) = (Catalog::standard(), Tuning::default());
    let env = Env { catalog: &catalog, tuning: &tuning };
    let mut s = GameState::fresh(0);
    let ctx = build_context(&s, env, 100_000);
    let before = score_candidates(&s, env, &ctx, Slot::Primary, None);
    let fresh = score_of(&before, "own_producers").unwrap();

    s.missions.primary.history.push_back(HistoryEntry {
        template_id: "own_producers".into(),
        completed_at: 90_000,
        duration_ms: 1_000,
        failed: false,
    });
    s.missions.primary.cooldowns.insert("own_producers".into(), 95_000);
    let after = score_candidates(&s, env, &ctx, Slot::Primary, None);
    let penalized = score_of(&after, "own_producers").unwrap();
    let w = &tuning.selector;
    let expected = fresh - w.variety_bonus - w.variety_penalty - w.anti_spam_penalty;
    assert!((penalized - expected).abs() < 1e-12, "got {penalized}, expected {expected}");
}

/* ──────────────────────────────────────────────────────────────────────────
4) Completion: two phases, at most one payout
────────────────────────────────────────────────────────────────────────── */

#[test]
fn claiming_twice_pays_once() {
    let (catalog, tuning) = (Catalog::standard(), Tuning::default());
    let env = Env { catalog: &catalog, tuning: &tuning };
    let engine = MissionEngine::new(rng(5));
    let mut sink: Vec<Notice> = Vec::new();

    let mut s = GameState::fresh(0);
    s.clicks = 50;
    let mut obj = objective(7, "click_burst", ObjectiveTarget::ClickBurst { clicks: 50, clicks_at_start: 0, deadline: 30_000 }, 0);
    obj.progress = Progress { current: 50.0, target: 50.0, done: true, ..Progress::default() };
    s.objectives.micro = Some(obj);
    s.objectives.next_serial = 8;

    let once = engine.claim(&s, env, 1_000, Slot::Micro, 7, &mut sink);
    assert_eq!(once.balance, 25.0, "early floor reward");
    assert!(once.objectives.micro.as_ref().is_some_and(|o| o.pending_reward && o.completed));

    let twice = engine.claim(&once, env, 1_000, Slot::Micro, 7, &mut sink);
    assert_eq!(twice, once, "a claimed objective never pays again");

    let settled = engine.settle(&once, env, 1_000, Slot::Micro, 7);
    assert_eq!(settled.missions.micro.completed, 1);
    assert_eq!(settled.missions.micro.history.len(), 1);
    assert_eq!(settled.missions.micro.cooldowns.get("click_burst"), Some(&(1_000 + 90_000)));
    assert!(settled.objectives.micro.as_ref().is_none_or(|o| o.serial != 7));

    let stale = engine.claim(&settled, env, 1_000, Slot::Micro, 7, &mut sink);
    assert_eq!(stale, settled, "a stale serial is a no-op");
    assert_eq!(sink.iter().filter(|n| n.tone == Tone::Success).count(), 1);
}

#[test]
fn interrupted_completion_settles_without_paying() {
    let (catalog, tuning) = (Catalog::standard(), Tuning::default());
    let env = Env { catalog: &catalog, tuning: &tuning };
    let engine = MissionEngine::new(rng(9));
    let mut sink: Vec<Notice> = Vec::new();

    let mut s = GameState::fresh(0);
    s.balance = 40.0;
    s.lifetime = 40.0;
    let mut obj = objective(3, "click_burst", ObjectiveTarget::ClickBurst { clicks: 50, clicks_at_start: 0, deadline: 30_000 }, 0);
    obj.progress.done = true;
    obj.completed = true;
    obj.pending_reward = true;
    s.objectives.micro = Some(obj);
    s.objectives.next_serial = 4;

    let next = engine.update(&s, env, 2_000, &mut sink);
    assert_eq!(next.balance, 40.0);
    assert_eq!(next.lifetime, 40.0);
    assert_eq!(next.missions.micro.history.len(), 1);
    assert!(next.objectives.micro.as_ref().is_none_or(|o| o.serial != 3 && !o.pending_reward));
    assert!(sink.iter().all(|n| n.tone != Tone::Success));
}

#[test]
fn missed_click_burst_fails_without_reward() {
    let (catalog, tuning) = (Catalog::standard(), Tuning::default());
    let env = Env { catalog: &catalog, tuning: &tuning };
    let engine = MissionEngine::new(rng(13));
    let mut sink: Vec<Notice> = Vec::new();

    let mut s = GameState::fresh(0);
    s.clicks = 10;
    s.objectives.micro = Some(objective(
        0,
        "click_burst",
        ObjectiveTarget::ClickBurst { clicks: 50, clicks_at_start: 0, deadline: 30_000 },
        0,
    ));
    s.objectives.next_serial = 1;

    let next = engine.update(&s, env, 31_000, &mut sink);
    assert_eq!(next.balance, 0.0);
    assert!(next.effects.click.is_none() && next.effects.production.is_none());
    let log = &next.missions.micro;
    assert_eq!(log.completed, 0, "a failure is not a completion");
    assert!(log.history.back().is_some_and(|h| h.failed && h.template_id == "click_burst"));
    assert!(log.cooldowns.contains_key("click_burst"));
    assert!(sink.iter().any(|n| n.tone == Tone::Warn));
}

#[test]
fn click_burst_reached_after_the_deadline_is_a_miss() {
    let (catalog, tuning) = (Catalog::standard(), Tuning::default());
    let env = Env { catalog: &catalog, tuning: &tuning };
    let engine = MissionEngine::new(rng(19));
    let target = ObjectiveTarget::ClickBurst { clicks: 50, clicks_at_start: 0, deadline: 30_000 };

    let mut s = GameState::fresh(0);
    s.clicks = 50;
    s.objectives.micro = Some(objective(0, "click_burst", target.clone(), 0));
    s.objectives.next_serial = 1;

    let mut sink: Vec<Notice> = Vec::new();
    let late = engine.update(&s, env, 31_000, &mut sink);
    assert_eq!(late.balance, 0.0, "no reward for a late target");
    assert!(late.effects.click.is_none() && late.effects.production.is_none());
    assert_eq!(late.missions.micro.completed, 0);
    assert!(late.missions.micro.history.back().is_some_and(|h| h.failed));
    assert!(sink.iter().all(|n| n.tone != Tone::Success));

    let mut sink: Vec<Notice> = Vec::new();
    let on_time = engine.update(&s, env, 29_999, &mut sink);
    assert_eq!(on_time.balance, 25.0, "early floor reward");
    assert_eq!(on_time.missions.micro.completed, 1);
    assert!(on_time.missions.micro.history.back().is_some_and(|h| !h.failed));
}

#[test]
fn primary_balance_goal_pays_its_own_effect() {
    let (catalog, tuning) = (Catalog::standard(), Tuning::default());
    let env = Env { catalog: &catalog, tuning: &tuning };
    let engine = MissionEngine::new(rng(17));

    let mut s = GameState::fresh(0);
    s.balance = 600.0;
    s.lifetime = 600.0;
    s.objectives.primary = Some(objective(
        0,
        "reach_balance_dynamic",
        ObjectiveTarget::ReachBalance { amount: 500.0, balance_at_start: 0.0 },
        0,
    ));
    s.objectives.next_serial = 1;

    let next = engine.update(&s, env, 10_000, &mut Silent);
    let effect = next.effects.get(Axis::Production).expect("production boost granted");
    assert_eq!(effect.multiplier, 1.5);
    assert_eq!(effect.expires_at, 10_000 + 25_000);
    assert_eq!(next.balance, 600.0, "effect-only reward");
    assert_eq!(next.missions.primary.completed, 1);
    let replacement = next.objectives.get(Slot::Primary).expect("slot refilled");
    assert_eq!(replacement.template_id, "own_producers");
}
