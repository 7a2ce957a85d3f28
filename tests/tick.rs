// tests/tick.rs
use idle_core::catalog::Catalog;
use idle_core::config::Tuning;
use idle_core::state::{GameState, TemporaryEffect};
use idle_core::systems::economy::rates;
use idle_core::systems::sdk::Env;
use idle_core::systems::secondary::mintable_units;
use idle_core::systems::tick::{commit, CommitReason, Pending, TickAccumulator};

/// A run with steady passive production and no temporary effects.
fn producing(oven: u32, bank_cps: u32) -> GameState {
    let mut s = GameState::fresh(0);
    s.owned.insert("oven".into(), oven);
    s.owned.insert("bank_cps".into(), bank_cps);
    s
}

/* ──────────────────────────────────────────────────────────────────────────
1) Batching: many small commits credit what one big commit would
────────────────────────────────────────────────────────────────────────── */

#[test]
fn batched_commits_match_direct_integration() {
    let (catalog, tuning) = (Catalog::standard(), Tuning::default());
    let env = Env { catalog: &catalog, tuning: &tuning };
    let start = producing(10, 0);
    let rate = rates(&start, env, 0).production;
    assert!((rate - 6.0).abs() < 1e-9, "10 ovens → 6/s, got {rate}");

    let mut acc = TickAccumulator::new();
    let mut state = start.clone();
    assert_eq!(acc.sample(&state, env, 0), None, "first sample only primes the clock");

    let mut commits = 0;
    let mut now = 0;
    while now < 30_000 {
        now += tuning.loop_timing.tick_ms;
        if acc.sample(&state, env, now).is_some() {
            state = acc.flush(&state, env, now);
            commits += 1;
        }
    }
    state = acc.flush(&state, env, now);

    let direct = rate * 30.0;
    assert!(commits > 10, "commits should be periodic, got {commits}");
    assert!((state.lifetime - direct).abs() < 1e-6, "batched {} vs direct {direct}", state.lifetime);
    assert!((state.balance - direct).abs() < 1e-6);
    assert_eq!(acc.pending(), Pending::default(), "flush drains the buffer");
}

#[test]
fn samples_inside_one_tick_are_ignored() {
    let (catalog, tuning) = (Catalog::standard(), Tuning::default());
    let env = Env { catalog: &catalog, tuning: &tuning };
    let state = producing(10, 0);

    let mut acc = TickAccumulator::new();
    acc.sample(&state, env, 1_000_000);
    acc.sample(&state, env, 1_000_100);
    assert!(acc.pending().is_empty(), "a sample closer than the tick interval adds nothing");

    acc.sample(&state, env, 1_000_300);
    assert!((acc.pending().balance - 1.8).abs() < 1e-9);
    assert_eq!(acc.pending().covered_ms, 300);
}

#[test]
fn one_long_sample_matches_many_short_ones() {
    let (catalog, tuning) = (Catalog::standard(), Tuning::default());
    let env = Env { catalog: &catalog, tuning: &tuning };
    let state = producing(10, 0);

    let mut short = TickAccumulator::new();
    short.sample(&state, env, 0);
    for i in 1..=40 {
        short.sample(&state, env, i * 300);
    }
    let mut long = TickAccumulator::new();
    long.sample(&state, env, 0);
    long.sample(&state, env, 12_000);

    assert_eq!(long.pending().covered_ms, 12_000, "a stall is credited in full");
    assert!((long.pending().balance - 72.0).abs() < 1e-9, "12s at 6/s");
    assert!((long.pending().balance - short.pending().balance).abs() < 1e-9);

    long.sample(&state, env, 72_000);
    assert!((long.pending().balance - 432.0).abs() < 1e-9, "72s at 6/s");
}

/* ──────────────────────────────────────────────────────────────────────────
2) Secondary faucet: counter bound, monotone, never double-mints
────────────────────────────────────────────────────────────────────────── */

#[test]
fn minted_units_track_lifetime_and_never_decrease() {
    let (catalog, tuning) = (Catalog::standard(), Tuning::default());
    let env = Env { catalog: &catalog, tuning: &tuning };
    let mut state = producing(0, 10);

    let mut acc = TickAccumulator::new();
    acc.sample(&state, env, 0);
    let mut minted_prev = 0;
    let mut saw_mint = false;
    let mut now = 0;
    for _ in 0..400 {
        now += 300;
        let reason = acc.sample(&state, env, now);
        if reason == Some(CommitReason::Mint) {
            saw_mint = true;
        }
        if reason.is_some() {
            state = acc.flush(&state, env, now);
        }
        let minted = state.secondary.minted_units;
        assert!(minted >= minted_prev, "minted counter went backwards at {now}");
        assert!(minted <= mintable_units(state.lifetime, &tuning.faucet), "minted beyond what lifetime allows");
        minted_prev = minted;
    }
    assert!(saw_mint, "a crossed threshold should force a commit");
    assert_eq!(state.secondary.minted_units, mintable_units(state.lifetime, &tuning.faucet));
    let expected = state.secondary.minted_units as f64 * tuning.faucet.unit_amount;
    assert!((state.secondary.balance - expected).abs() < 1e-6);
}

#[test]
fn recommitting_the_same_lifetime_mints_nothing() {
    let (catalog, tuning) = (Catalog::standard(), Tuning::default());
    let env = Env { catalog: &catalog, tuning: &tuning };
    let mut s = GameState::fresh(0);
    s.lifetime = 59_999.0;

    let once = commit(&s, Pending::default(), env, 10);
    assert_eq!(once.secondary.minted_units, 2);
    let twice = commit(&once, Pending::default(), env, 20);
    assert_eq!(twice.secondary.minted_units, 2);
    assert_eq!(twice.secondary.balance, once.secondary.balance);
}

/* ──────────────────────────────────────────────────────────────────────────
3) Commit side effects
────────────────────────────────────────────────────────────────────────── */

#[test]
fn expiring_effect_forces_a_commit_that_clears_it() {
    let (catalog, tuning) = (Catalog::standard(), Tuning::default());
    let env = Env { catalog: &catalog, tuning: &tuning };
    let mut state = producing(10, 0);
    state.effects.production = Some(TemporaryEffect { multiplier: 2.0, expires_at: 1_000, label: "x".into() });

    let mut acc = TickAccumulator::new();
    acc.sample(&state, env, 0);
    acc.sample(&state, env, 300);
    acc.sample(&state, env, 600);
    acc.sample(&state, env, 900);
    assert_eq!(acc.sample(&state, env, 1_200), Some(CommitReason::EffectExpired));

    let next = acc.flush(&state, env, 1_200);
    assert!(next.effects.production.is_none(), "expired effect is dropped on commit");
    assert_eq!(rates(&next, env, 1_200).production, 6.0);
}

#[test]
fn commit_stamps_presence_and_credits_pending() {
    let (catalog, tuning) = (Catalog::standard(), Tuning::default());
    let env = Env { catalog: &catalog, tuning: &tuning };
    let s = GameState::fresh(0);
    let pending = Pending { balance: 12.5, lifetime: 12.5, covered_ms: 900 };

    let next = commit(&s, pending, env, 5_000);
    assert_eq!(next.balance, 12.5);
    assert_eq!(next.lifetime, 12.5);
    assert_eq!(next.offline.last_seen, 5_000);
    assert_eq!(next.offline.claimed_through, 5_000);
    assert_eq!(s.balance, 0.0, "input snapshot is untouched");
}
