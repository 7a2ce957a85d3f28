// tests/persist.rs
use idle_core::persist::{migrate, serialize, try_migrate, MigrationStatus};
use idle_core::state::{GameState, Objective, ObjectiveTarget, Progress, STATE_VERSION};
use idle_core::systems::sdk::Tone;
use idle_core::{Catalog, Game, SimError, Tuning};

/* ──────────────────────────────────────────────────────────────────────────
1) Current layout
────────────────────────────────────────────────────────────────────────── */

#[test]
fn current_layout_survives_a_round_trip() {
    let mut s = GameState::fresh(1_000);
    s.balance = 1_234.567;
    s.lifetime = 99_999.25;
    s.owned.insert("cursor".into(), 12);
    s.modifiers.insert("cursor_10".into());
    s.secondary.minted_units = 4;
    s.secondary.balance = 0.004;
    s.objectives.micro = Some(Objective {
        serial: 3,
        template_id: "click_burst".into(),
        target: ObjectiveTarget::ClickBurst { clicks: 50, clicks_at_start: 7, deadline: 31_000 },
        progress: Progress { current: 4.0, target: 50.0, time_left_ms: Some(2_000), ..Progress::default() },
        started_at: 1_000,
        completed: false,
        pending_reward: true,
    });
    s.objectives.next_serial = 4;
    s.golden.stacks = 1;
    s.golden.last_caught_at = Some(900);
    s.golden.visible_until = Some(4_000);
    s.missions.micro.cooldowns.insert("gain_balance_fraction".into(), 80_000);

    let blob = serialize(&s).unwrap();
    let (back, status) = try_migrate(&blob).unwrap();
    assert_eq!(status, MigrationStatus::Loaded);
    assert_eq!(back, s);
}

#[test]
fn older_versioned_blob_is_upgraded() {
    let (s, status) = try_migrate(br#"{"version": 1, "balance": 10.0, "clicks": 3}"#).unwrap();
    assert_eq!(status, MigrationStatus::Upgraded { from: 1 });
    assert_eq!(s.version, STATE_VERSION);
    assert_eq!(s.balance, 10.0);
    assert_eq!(s.clicks, 3);
}

/* ──────────────────────────────────────────────────────────────────────────
2) Legacy layout
────────────────────────────────────────────────────────────────────────── */

const LEGACY: &str = r#"{
    "cookies": 1500.5,
    "lifetime": 9000,
    "items": { "cursor": 12, "grandma": 0, "oven": 3 },
    "upgrades": { "cursor_10": true, "farmm_10": true, "click_1": false },
    "prestige": { "chips": 2 },
    "stats": { "clicks": 321, "goldenClicks": 4 },
    "crypto": { "balance": 0.004, "staked": 0.001, "mintedUnits": 5 },
    "createdAt": 1000,
    "lastTs": 50000,
    "flags": { "offlineCollected": true, "goldenLastTs": 48000, "goldenStacks": 2 },
    "unlocked": { "firstClick": true, "1kBank": true, "tenClicks": false }
}"#;

#[test]
fn legacy_blob_is_mapped_field_by_field() {
    let (s, status) = try_migrate(LEGACY.as_bytes()).unwrap();
    assert_eq!(status, MigrationStatus::Upgraded { from: 1 });
    assert_eq!(s.version, STATE_VERSION);
    assert_eq!(s.balance, 1_500.5);
    assert_eq!(s.lifetime, 9_000.0);
    assert_eq!(s.owned("cursor"), 12);
    assert_eq!(s.owned("oven"), 3);
    assert!(!s.owned.contains_key("grandma"), "zero counts are dropped");
    assert_eq!(
        s.modifiers.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["cursor_10", "farm_10"],
        "disabled entries dropped, renamed ids mapped"
    );
    assert_eq!(s.prestige_level, 2);
    assert_eq!(s.clicks, 321);
    assert_eq!(s.secondary.minted_units, 5);
    assert_eq!(s.secondary.staked, 0.001);
    assert_eq!(s.created_at, 1_000);
    assert_eq!(s.last_purchase_at, 50_000);
    assert_eq!(s.offline.last_seen, 50_000);
    assert!(s.offline.ever_collected);
    assert_eq!(s.golden.caught, 4);
    assert_eq!(s.golden.stacks, 2);
    assert_eq!(s.golden.last_caught_at, Some(48_000));
    assert_eq!(s.golden.visible_until, None);
    assert!(s.achievements.contains("first_click") && s.achievements.contains("bank_1k"));
    assert!(!s.achievements.contains("ten_clicks"));
    assert!(s.objectives.primary.is_none(), "objectives start over after an upgrade");
}

#[test]
fn legacy_lifetime_never_trails_the_balance() {
    let (s, _) = try_migrate(br#"{"cookies": 700}"#).unwrap();
    assert_eq!(s.lifetime, 700.0);
}

/* ──────────────────────────────────────────────────────────────────────────
3) Unusable blobs fall back to a fresh run
────────────────────────────────────────────────────────────────────────── */

#[test]
fn blank_blob_starts_fresh_without_complaint() {
    let m = migrate(b"  \n", 5_000);
    assert_eq!(m.status, MigrationStatus::Fresh);
    assert_eq!(m.state, GameState::fresh(5_000));
}

#[test]
fn unusable_blobs_reset_with_a_reason() {
    let cases: [&[u8]; 5] = [
        b"{not json",
        b"[1, 2, 3]",
        br#"{"version": 99}"#,
        br#"{"version": 2, "balance": -5.0}"#,
        br#"{"cookies": -1}"#,
    ];
    for blob in cases {
        let m = migrate(blob, 42);
        assert!(matches!(m.status, MigrationStatus::Reset { .. }), "{:?} should reset", String::from_utf8_lossy(blob));
        assert_eq!(m.state, GameState::fresh(42));
        assert!(matches!(try_migrate(blob), Err(SimError::CorruptedPersistedState(_))));
    }
}

/* ──────────────────────────────────────────────────────────────────────────
4) Through the orchestrator
────────────────────────────────────────────────────────────────────────── */

#[test]
fn game_save_and_load_keep_the_run() {
    let now = 10_000;
    let mut game = Game::new(Catalog::standard(), Tuning::default(), 1, now).unwrap();
    for _ in 0..30 {
        game.click(now);
    }
    game.buy("cursor", 1, now).unwrap();
    let blob = game.save(now).unwrap();

    let back = Game::load(Catalog::standard(), Tuning::default(), 2, &blob, now).unwrap();
    let (a, b) = (game.state(), back.state());
    assert_eq!(b.balance, a.balance);
    assert_eq!(b.lifetime, a.lifetime);
    assert_eq!(b.owned, a.owned);
    assert_eq!(b.clicks, 30);
    assert_eq!(b.achievements, a.achievements);
    assert_eq!(b.objectives.next_serial, a.objectives.next_serial);
}

#[test]
fn corrupt_save_loads_a_fresh_run_and_says_so() {
    let mut game = Game::load(Catalog::standard(), Tuning::default(), 1, b"\x00garbage", 3_000).unwrap();
    assert_eq!(game.state().balance, 0.0);
    assert_eq!(game.state().created_at, 3_000);
    let notices = game.drain_notices();
    assert!(notices.iter().any(|n| n.tone == Tone::Reset));
    assert!(game.state().objectives.primary.is_some(), "fresh run is seeded with objectives");
}
