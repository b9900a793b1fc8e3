//! End-to-end scenarios against the public API.

use std::sync::Arc;

use wither_clicker::clicker::cards::CardSource;
use wither_clicker::clicker::save::MemoryStore;
use wither_clicker::clicker::state::EconomyState;
use wither_clicker::{
    Action, Blocked, Catalog, Engine, Moment, Notification, PeriodicTask, ScriptedRandom, Session,
};

const CARDS: &str = r#"[
    { "id": 10, "name": "Ashling", "rarity": "common", "mana": 2 },
    { "id": 11, "name": "Soul Lantern", "rarity": "rare" },
    { "id": 12, "name": "Wither Knight", "rarity": "legendary", "mana": 7 }
]"#;

fn catalog() -> Arc<Catalog> {
    Arc::new(
        Catalog::default()
            .with_cards(CardSource::Game, CARDS)
            .unwrap(),
    )
}

fn quiet_engine() -> Engine<ScriptedRandom> {
    Engine::with_rng(catalog(), ScriptedRandom::constant(0.99))
}

/// Engine resumed from a fresh state adjusted by `setup`.
fn engine_with(rng: ScriptedRandom, setup: impl FnOnce(&mut EconomyState)) -> Engine<ScriptedRandom> {
    let catalog = catalog();
    let mut state = EconomyState::new(&catalog.tuning);
    setup(&mut state);
    Engine::from_state(catalog, state, rng)
}

#[test]
fn ten_plain_clicks() {
    let mut e = quiet_engine();
    for i in 0..10 {
        e.click(Moment::at(i * 100));
    }
    assert_eq!(e.state().currency, 10.0);
    assert_eq!(e.state().stats.clicks, 10);
    assert!(e.state().achievements.contains(&"first10".into()));
}

#[test]
fn automation_purchase_then_repeat_is_noop() {
    let mut e = engine_with(ScriptedRandom::constant(0.99), |s| s.currency = 500.0);
    let now = Moment::at(0);
    let ember = Action::BuyAutomation("ember".into());

    assert!(e.apply(&ember, now));
    assert_eq!(e.state().currency, 0.0);
    assert_eq!(e.state().automation_count(&"ember".into()), 1);

    let before = e.state().clone();
    assert!(!e.apply(&ember, now));
    assert_eq!(e.state(), &before);
    assert_eq!(
        e.check(&ember, now),
        Err(Blocked::InsufficientFunds {
            cost: 650.0,
            available: 0.0
        })
    );
}

#[test]
fn draw_below_pack_cost_is_noop() {
    let mut e = quiet_engine();
    for i in 0..50 {
        e.click(Moment::at(i * 100));
    }
    e.drain_notifications();
    let before = e.state().clone();
    assert!(e.pack_cost(Moment::at(5_000)) > e.state().currency);
    assert!(!e.draw_card(Moment::at(5_000)));
    assert_eq!(e.state(), &before);
    assert!(e.drain_notifications().is_empty());
}

#[test]
fn overheat_triggers_exactly_once() {
    let mut e = quiet_engine();
    // 50 clicks at +2 heat each reach the cap; no cooling runs in between.
    for i in 0..60 {
        e.click(Moment::at(i * 10));
    }
    assert_eq!(e.state().heat, 100.0);
    assert_eq!(e.state().stats.meltdowns, 1);
    let meltdowns = e
        .drain_notifications()
        .into_iter()
        .filter(|n| matches!(n, Notification::Meltdown { .. }))
        .count();
    assert_eq!(meltdowns, 1);
    assert!(e.state().achievements.contains(&"melt".into()));
    assert!(e.state().achievements.contains(&"burnhot".into()));
}

#[test]
fn overheat_halves_passive_income() {
    let mut e = engine_with(ScriptedRandom::constant(0.99), |s| {
        s.automations.insert("spark".into(), 4); // 2/s
    });
    let cool = e.passive_rate(Moment::at(0));
    for i in 0..50 {
        e.click(Moment::at(i));
    }
    // heat 100: penalty floor 0.5, overheat 0.5
    let hot = e.passive_rate(Moment::at(100));
    assert!((cool - 2.0).abs() < 1e-9);
    assert!((hot - 0.5).abs() < 1e-9);
}

#[test]
fn pack_reveal_sequence() {
    let mut e = engine_with(ScriptedRandom::new([0.0], 0.99), |s| s.currency = 1_000.0);

    assert!(e.draw_card(Moment::at(0)));
    let out = e.drain_notifications();
    assert!(matches!(out[..], [Notification::PackOpened { cost, reveal_at: 900 }] if cost == 75.0));
    assert_eq!(e.check(&Action::DrawCard, Moment::at(1_000)), Err(Blocked::DrawInProgress));

    e.advance(Moment::at(900));
    let out = e.drain_notifications();
    assert!(matches!(&out[0], Notification::CardRevealed { name, .. } if name == "Ashling"));
    assert_eq!(e.state().card_copies(), 1);

    e.advance(Moment::at(1_800));
    assert_eq!(e.drain_notifications(), vec![Notification::RevealCleared]);
    assert!(e.check(&Action::DrawCard, Moment::at(1_800)).is_ok());
}

#[test]
fn prestige_cycle_keeps_lifetime_progress() {
    let mut e = engine_with(ScriptedRandom::constant(0.99), |s| {
        s.currency = 6_000.0;
        s.stats.earned = 6_000.0;
    });
    let now = Moment::at(0);
    assert!(e.apply(&Action::BuyAutomation("spark".into()), now));
    assert!(e.can_prestige());
    assert!(e.prestige(now));

    let s = e.state();
    assert_eq!(s.prestige_level, 1);
    assert_eq!(s.currency, 0.0);
    assert!(s.automations.is_empty());
    assert_eq!(s.stats.automations, 1);
    assert!(s.achievements.contains(&"prestige1".into()));
    assert!(s.achievements.contains(&"first1k".into()));

    e.click(Moment::at(10));
    assert!((e.state().currency - 1.2).abs() < 1e-9);
    assert!(!e.can_prestige());
}

#[test]
fn frenzy_doubles_then_expires() {
    let mut e = quiet_engine();
    assert!(e.start_frenzy(Moment::at(0)));
    assert!(!e.start_frenzy(Moment::at(100)));
    e.click(Moment::at(200));
    assert_eq!(e.state().currency, 2.0);
    e.click(Moment::at(8_000));
    assert_eq!(e.state().currency, 3.0);
    assert_eq!(e.state().stats.frenzies, 1);
}

#[test]
fn golden_rose_through_tasks() {
    let mut e = Engine::with_rng(catalog(), ScriptedRandom::new([0.01, 0.0, 0.0], 0.99));
    e.run_task(PeriodicTask::GoldenRoll, Moment::at(3_000));
    assert!(e.state().transients.golden.is_some());
    assert!(e.claim_golden(Moment::at(4_000)));
    assert_eq!(e.state().currency, 250.0);
    assert!(e.state().achievements.contains(&"golden".into()));
}

#[test]
fn session_survives_reload() {
    let mut s = Session::open(
        catalog(),
        ScriptedRandom::constant(0.99),
        MemoryStore::new(),
        MemoryStore::with_limit(4096),
        Moment::at(0),
    );
    for i in 0..20 {
        s.act(Action::Click, Moment::at(i * 50));
    }
    assert!(s.act(Action::BuyUpgrade("coal".into()), Moment::at(1_000)).accepted);
    s.pump(Moment::at(5_000));
    let (primary, fallback) = s.close();
    assert!(fallback.contents().is_some());

    let s = Session::open(
        catalog(),
        ScriptedRandom::constant(0.99),
        primary,
        fallback,
        Moment::at(60_000),
    );
    let state = s.engine().state();
    assert_eq!(state.stats.clicks, 20);
    assert_eq!(state.upgrade_count(&"coal".into()), 1);
    assert_eq!(state.click_power, 2.0);
    assert_eq!(state.stats.play_secs, 5);
}

#[test]
fn corrupt_primary_falls_back_to_cookie() {
    let mut primary = MemoryStore::new();
    let mut fallback = MemoryStore::new();
    {
        use wither_clicker::clicker::save::SnapshotStore;
        primary.write("{ this is not json").unwrap();
        let mut e = quiet_engine();
        e.click(Moment::at(0));
        fallback.write(&e.snapshot().unwrap()).unwrap();
    }
    let s = Session::open(
        catalog(),
        ScriptedRandom::constant(0.99),
        primary,
        fallback,
        Moment::at(0),
    );
    assert_eq!(s.engine().state().stats.clicks, 1);
    let (primary, _) = s.close();
    assert!(primary.contents().is_some_and(|json| json.starts_with('{') && json.contains("\"version\":2")));
}

#[test]
fn reload_mid_reveal_still_delivers_the_card() {
    let mut primary = MemoryStore::new();
    {
        use wither_clicker::clicker::save::SnapshotStore;
        let e = engine_with(ScriptedRandom::constant(0.99), |s| s.currency = 1_000.0);
        primary.write(&e.snapshot().unwrap()).unwrap();
    }
    let mut s = Session::open(
        catalog(),
        ScriptedRandom::constant(0.0),
        primary,
        MemoryStore::new(),
        Moment::at(0),
    );
    assert!(s.act(Action::DrawCard, Moment::at(10)).accepted);
    assert_eq!(s.engine().state().currency, 925.0);
    let (primary, fallback) = s.close();

    let mut s = Session::open(
        catalog(),
        ScriptedRandom::constant(0.99),
        primary,
        fallback,
        Moment::at(500),
    );
    assert!(s.engine().state().transients.draw.is_some());
    assert_eq!(s.engine().check(&Action::DrawCard, Moment::at(500)), Err(Blocked::DrawInProgress));

    let out = s.pump(Moment::at(5_000));
    assert!(out.iter().any(|n| matches!(n, Notification::CardRevealed { name, .. } if name == "Ashling")));
    let state = s.engine().state();
    assert_eq!(state.card_copies(), 1);
    assert_eq!(state.stats.packs, 1);
    assert!(state.currency >= 925.0);
    assert!(state.transients.draw.is_none());
}

#[test]
fn blaze_tick_melts_down_once() {
    let mut e = engine_with(ScriptedRandom::constant(0.99), |s| {
        s.heat = 98.0;
        s.automations.insert("blaze_factory".into(), 10); // +1.5 per tick
    });
    e.run_task(PeriodicTask::BlazeHeat, Moment::at(1_500));
    assert!((e.state().heat - 99.5).abs() < 1e-9);
    assert_eq!(e.state().stats.meltdowns, 1);
    e.run_task(PeriodicTask::BlazeHeat, Moment::at(3_000));
    assert_eq!(e.state().heat, 100.0);
    assert_eq!(e.state().stats.meltdowns, 1);
    let meltdowns = e
        .drain_notifications()
        .into_iter()
        .filter(|n| matches!(n, Notification::Meltdown { .. }))
        .count();
    assert_eq!(meltdowns, 1);
}
