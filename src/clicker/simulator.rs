//! Balance simulator for Wither Clicker.
//! Run with: cargo test simulate_greedy -- --nocapture

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::clicker::actions::{Action, PeriodicTask};
    use crate::clicker::cards::CardSource;
    use crate::clicker::catalog::Catalog;
    use crate::clicker::notify::{format_number, Notification};
    use crate::clicker::rng::SimRng;
    use crate::clicker::Engine;
    use crate::time::{Moment, TaskClock};

    const CARDS: &str = r#"[
        { "id": 1, "name": "Ashling", "rarity": "common", "mana": 1 },
        { "id": 2, "name": "Rose Warden", "rarity": "uncommon", "mana": 2 },
        { "id": 3, "name": "Soul Lantern", "rarity": "rare", "mana": 3 },
        { "id": 4, "name": "Nether Drake", "rarity": "epic", "mana": 5 },
        { "id": 5, "name": "Wither Knight", "rarity": "legendary", "mana": 8 }
    ]"#;

    /// Cheapest payback in seconds among affordable purchases.
    fn find_best_purchase(engine: &Engine, clicks_per_second: u32) -> Option<Action> {
        let state = engine.state();
        let mut best: Option<(f64, Action)> = None;
        let mut consider = |payback: f64, action: Action| {
            if best.as_ref().map_or(true, |(b, _)| payback < *b) {
                best = Some((payback, action));
            }
        };

        for def in &engine.catalog().automations {
            let Some(cost) = engine.automation_cost(&def.id) else {
                continue;
            };
            if cost <= state.currency && def.rate > 0.0 {
                consider(cost / def.rate, Action::BuyAutomation(def.id.clone()));
            }
        }
        for def in &engine.catalog().upgrades {
            let Some(cost) = engine.upgrade_cost(&def.id) else {
                continue;
            };
            let gain = def.increment * clicks_per_second as f64;
            if cost <= state.currency && gain > 0.0 {
                consider(cost / gain, Action::BuyUpgrade(def.id.clone()));
            }
        }
        best.map(|(_, a)| a)
    }

    fn report(engine: &Engine, now: Moment, purchases: u32) {
        let s = engine.state();
        eprintln!("┌─ {}s ─────────────────────────────", s.stats.play_secs);
        eprintln!("│ roses: {}  earned: {}", format_number(s.currency), format_number(s.stats.earned));
        eprintln!(
            "│ click: {}  passive: {}/s  heat: {:.0}",
            format_number(s.click_power),
            format_number(engine.passive_rate(now)),
            s.heat
        );
        eprintln!(
            "│ purchases: {purchases}  cards: {}  meltdowns: {}  achievements: {}",
            s.card_copies(),
            s.stats.meltdowns,
            s.achievements.len()
        );
        eprintln!("└────────────────────────────────────");
    }

    /// Greedy play for `total_seconds`, checking invariants every second.
    fn simulate(total_seconds: u64, seed: u64) -> Engine {
        let catalog = Catalog::default()
            .with_cards(CardSource::Game, CARDS)
            .unwrap();
        let periods = catalog.tuning.periods.clone();
        let mut engine = Engine::with_rng(Arc::new(catalog), SimRng::from_seed_u64(seed));
        let mut clock = PeriodicTask::ALL
            .iter()
            .fold(TaskClock::new(10_000), |c, &t| c.every(t.period_ms(&periods), t));

        let clicks_per_second: u32 = 5;
        let mut purchases: u32 = 0;
        let mut achievements_seen = 0;
        let mut meltdown_toasts = 0;

        clock.update(0);
        for second in 1..=total_seconds {
            let base = (second - 1) * 1_000;
            for i in 0..clicks_per_second {
                engine.click(Moment::at(base + u64::from(i) * 200));
            }
            for firing in clock.update(second * 1_000) {
                engine.run_task(firing.task, Moment::at(firing.at));
            }
            let now = Moment::at(second * 1_000);
            engine.claim_golden(now);

            for _ in 0..20 {
                match find_best_purchase(&engine, clicks_per_second) {
                    Some(action) if engine.apply(&action, now) => purchases += 1,
                    _ => break,
                }
            }
            if second % 30 == 0 {
                engine.draw_card(now);
            }

            meltdown_toasts += engine
                .drain_notifications()
                .iter()
                .filter(|n| matches!(n, Notification::Meltdown { .. }))
                .count() as u32;

            let s = engine.state();
            assert!((0.0..=100.0).contains(&s.heat), "heat {} at {second}s", s.heat);
            assert!(s.currency >= 0.0 && s.currency.is_finite());
            assert!(s.achievements.len() >= achievements_seen, "achievement lost at {second}s");
            achievements_seen = s.achievements.len();

            if second % 300 == 0 {
                report(&engine, now, purchases);
            }
        }
        assert_eq!(engine.state().stats.meltdowns, meltdown_toasts);
        engine
    }

    #[test]
    fn simulate_greedy_30min() {
        let engine = simulate(1_800, 7);
        let s = engine.state();
        assert_eq!(s.stats.clicks, 9_000);
        assert_eq!(s.stats.play_secs, 1_800);
        assert!(s.stats.upgrades > 0);
        assert!(s.stats.automations > 0);
        assert!(s.stats.earned > 10_000.0);
        assert!(s.achievements.contains(&"click1k".into()));
    }

    #[test]
    fn simulate_is_reproducible_per_seed() {
        let a = simulate(300, 99);
        let b = simulate(300, 99);
        assert_eq!(a.state(), b.state());
    }
}
