//! Achievement progress and unlocking.
//!
//! Goals are measured against lifetime stats, so prestige never takes
//! progress away and an unlocked achievement stays unlocked.

use super::catalog::{AchievementDef, Catalog, Goal};
use super::notify::Notification;
use super::state::EconomyState;

fn ratio(current: f64, goal: f64) -> f64 {
    if goal <= 0.0 {
        1.0
    } else {
        (current / goal).clamp(0.0, 1.0)
    }
}

fn flag(done: bool) -> f64 {
    if done {
        1.0
    } else {
        0.0
    }
}

/// Progress toward `def` in `[0, 1]`; 1 means the goal is met.
pub fn progress(def: &AchievementDef, state: &EconomyState) -> f64 {
    let s = &state.stats;
    match &def.goal {
        Goal::Score(n) => ratio(s.earned, *n),
        Goal::Clicks(n) => ratio(s.clicks as f64, *n as f64),
        Goal::Passive(n) => ratio(s.passive, *n),
        Goal::HeatPeak(n) => ratio(s.heat_peak, *n),
        Goal::Cooled => flag(s.cooled),
        Goal::Legendary => flag(s.legendaries > 0),
        Goal::LegendaryCount(n) => ratio(s.legendaries as f64, *n as f64),
        Goal::Collection(n) => ratio(s.cards as f64, *n as f64),
        Goal::Automations(n) => ratio(s.automations as f64, *n as f64),
        Goal::Upgrades(n) => ratio(s.upgrades as f64, *n as f64),
        Goal::Prestige(n) => ratio(state.prestige_level as f64, *n as f64),
        Goal::Frenzies(n) => ratio(s.frenzies as f64, *n as f64),
        Goal::Golden(n) => ratio(s.golden as f64, *n as f64),
        Goal::Packs(n) => ratio(s.packs as f64, *n as f64),
        Goal::Meltdowns(n) => ratio(s.meltdowns as f64, *n as f64),
        Goal::PlayNight(n) => ratio(s.night_secs as f64, *n as f64),
        Goal::PlayTime(n) => ratio(s.play_secs as f64, *n as f64),
        Goal::Chill(n) => ratio(s.best_chill_secs as f64, *n as f64),
        Goal::OwnAutomation(id) => flag(s.automations_owned.contains(id)),
        Goal::ClickBurst(n) => ratio(s.best_click_burst as f64, *n as f64),
    }
}

/// Unlock every achievement whose goal is now met. Returns how many were
/// newly unlocked.
pub fn evaluate(state: &mut EconomyState, catalog: &Catalog, out: &mut Vec<Notification>) -> usize {
    let newly: Vec<&AchievementDef> = catalog
        .achievements
        .iter()
        .filter(|def| !state.achievements.contains(&def.id) && progress(def, state) >= 1.0)
        .collect();
    for def in &newly {
        state.achievements.insert(def.id.clone());
        log::info!("achievement unlocked: {}", def.id);
        out.push(Notification::AchievementUnlocked {
            id: def.id.clone(),
            name: def.name.clone(),
        });
    }
    newly.len()
}
