//! Wither Clicker: an incremental rose clicker economy.
//!
//! [`Engine`] owns the player state and is the only thing that mutates it.
//! Every entry point takes the current [`Moment`]; windows that ended before
//! it are closed first, then the event is applied, then achievements are
//! re-evaluated. Notifications pile up in an outbox until drained.

pub mod achievements;
pub mod actions;
pub mod cards;
pub mod catalog;
pub mod logic;
pub mod notify;
pub mod rng;
pub mod save;
pub mod state;

#[cfg(test)]
mod simulator;

use std::sync::Arc;

use crate::error::{Blocked, StoreError};
use crate::time::Moment;

use actions::{Action, Event, PeriodicTask};
use catalog::{AchievementId, AutomationId, Catalog, UpgradeId};
use logic::Ctx;
use notify::Notification;
use rng::{RandomSource, SimRng};
use state::EconomyState;

pub struct Engine<R: RandomSource = SimRng> {
    catalog: Arc<Catalog>,
    state: EconomyState,
    rng: R,
    outbox: Vec<Notification>,
}

impl Engine<SimRng> {
    /// Fresh game with the default seeded RNG.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_rng(catalog, SimRng::default())
    }
}

impl<R: RandomSource> Engine<R> {
    pub fn with_rng(catalog: Arc<Catalog>, rng: R) -> Self {
        let state = EconomyState::new(&catalog.tuning);
        Self::from_state(catalog, state, rng)
    }

    /// Resume from a loaded snapshot.
    pub fn from_state(catalog: Arc<Catalog>, mut state: EconomyState, rng: R) -> Self {
        state.sanitize(&catalog.tuning);
        Self {
            catalog,
            state,
            rng,
            outbox: Vec::new(),
        }
    }

    pub fn state(&self) -> &EconomyState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Serialized snapshot of the persistable state.
    pub fn snapshot(&self) -> Result<String, StoreError> {
        save::encode(&self.state)
    }

    /// Run `f` at `now`: expire first, achievements after.
    fn step<T>(&mut self, now: Moment, f: impl FnOnce(&mut EconomyState, &mut Ctx<'_>) -> T) -> T {
        let catalog = &*self.catalog;
        let mut ctx = Ctx {
            catalog,
            rng: &mut self.rng,
            now,
            out: &mut self.outbox,
        };
        logic::expire(&mut self.state, &mut ctx);
        let result = f(&mut self.state, &mut ctx);
        achievements::evaluate(&mut self.state, catalog, &mut self.outbox);
        result
    }

    // ── Actions ───────────────────────────────────────────

    pub fn click(&mut self, now: Moment) {
        self.step(now, logic::click);
    }

    pub fn buy_upgrade(&mut self, id: &UpgradeId, now: Moment) -> bool {
        self.step(now, |s, c| logic::buy_upgrade(s, c, id))
    }

    pub fn buy_automation(&mut self, id: &AutomationId, now: Moment) -> bool {
        self.step(now, |s, c| logic::buy_automation(s, c, id))
    }

    pub fn draw_card(&mut self, now: Moment) -> bool {
        self.step(now, logic::draw_card)
    }

    pub fn claim_golden(&mut self, now: Moment) -> bool {
        self.step(now, logic::claim_golden)
    }

    pub fn start_frenzy(&mut self, now: Moment) -> bool {
        self.step(now, logic::start_frenzy)
    }

    pub fn prestige(&mut self, now: Moment) -> bool {
        self.step(now, logic::prestige)
    }

    /// Apply any player action. Returns whether it was accepted.
    pub fn apply(&mut self, action: &Action, now: Moment) -> bool {
        self.step(now, |s, c| logic::apply(s, c, action))
    }

    // ── Time ──────────────────────────────────────────────

    pub fn run_task(&mut self, task: PeriodicTask, now: Moment) {
        log::trace!("task {task:?} at {}", now.epoch_ms);
        self.step(now, |s, c| logic::run_task(s, c, task));
    }

    /// Only let time pass.
    pub fn advance(&mut self, now: Moment) {
        self.step(now, |_, _| ());
    }

    /// Apply one event and return everything it (and any pending expiry)
    /// produced.
    pub fn handle(&mut self, event: Event, now: Moment) -> Vec<Notification> {
        match event {
            Event::Action(action) => {
                self.apply(&action, now);
            }
            Event::Task(task) => self.run_task(task, now),
            Event::Advance => self.advance(now),
        }
        self.drain_notifications()
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }

    // ── Queries ───────────────────────────────────────────

    /// Why `action` would do nothing at `now`.
    pub fn check(&self, action: &Action, now: Moment) -> Result<(), Blocked> {
        logic::check(&self.catalog, &self.state, action, now)
    }

    pub fn passive_rate(&self, now: Moment) -> f64 {
        logic::passive_rate(&self.catalog, &self.state, now)
    }

    pub fn pack_cost(&self, now: Moment) -> f64 {
        logic::pack_cost(&self.catalog, &self.state, now)
    }

    pub fn crit_chance(&self) -> f64 {
        logic::crit_chance(&self.catalog, &self.state)
    }

    pub fn upgrade_cost(&self, id: &UpgradeId) -> Option<f64> {
        self.catalog
            .upgrade(id)
            .map(|def| logic::upgrade_cost(&self.catalog, &self.state, def))
    }

    pub fn automation_cost(&self, id: &AutomationId) -> Option<f64> {
        self.catalog
            .automation(id)
            .map(|def| logic::automation_cost(&self.catalog, &self.state, def))
    }

    pub fn can_prestige(&self) -> bool {
        logic::can_prestige(&self.state, &self.catalog.tuning)
    }

    /// Progress toward an achievement in `[0, 1]`, or `None` for an unknown id.
    pub fn achievement_progress(&self, id: &AchievementId) -> Option<f64> {
        self.catalog
            .achievement(id)
            .map(|def| achievements::progress(def, &self.state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clicker::rng::ScriptedRandom;

    fn engine() -> Engine<ScriptedRandom> {
        Engine::with_rng(Arc::new(Catalog::default()), ScriptedRandom::constant(0.99))
    }

    #[test]
    fn actions_expire_windows_first() {
        let mut e = engine();
        assert!(e.start_frenzy(Moment::at(0)));
        e.drain_notifications();
        e.click(Moment::at(8_000));
        let out = e.drain_notifications();
        assert_eq!(out[0], Notification::FrenzyEnded);
        assert_eq!(e.state().currency, 1.0);
    }

    #[test]
    fn achievements_unlock_after_the_action() {
        let mut e = engine();
        let now = Moment::at(0);
        for _ in 0..10 {
            e.click(now);
        }
        assert!(e.state().achievements.contains(&"first10".into()));
        let unlocked = e
            .drain_notifications()
            .into_iter()
            .filter(|n| matches!(n, Notification::AchievementUnlocked { .. }))
            .count();
        assert_eq!(unlocked, 1);
    }

    #[test]
    fn handle_drains_outbox() {
        let mut e = engine();
        let out = e.handle(Event::Action(Action::Click), Moment::at(0));
        assert_eq!(out.len(), 1);
        assert!(e.drain_notifications().is_empty());
        let out = e.handle(PeriodicTask::Passive.into(), Moment::at(1_000));
        assert!(out.is_empty());
        assert_eq!(e.state().stats.play_secs, 1);
    }

    #[test]
    fn check_agrees_with_apply() {
        let mut e = engine();
        let now = Moment::at(0);
        let buy = Action::BuyAutomation("spark".into());
        assert!(e.check(&buy, now).is_err());
        assert!(!e.apply(&buy, now));
        assert!(e.check(&Action::StartFrenzy, now).is_ok());
        assert!(e.apply(&Action::StartFrenzy, now));
        assert_eq!(e.check(&Action::StartFrenzy, now), Err(Blocked::FrenzyActive));
    }

    #[test]
    fn queries_report_costs_and_progress() {
        let e = engine();
        assert_eq!(e.upgrade_cost(&"coal".into()), Some(10.0));
        assert_eq!(e.automation_cost(&"spark".into()), Some(100.0));
        assert_eq!(e.upgrade_cost(&"gold".into()), None);
        assert_eq!(e.pack_cost(Moment::at(0)), 75.0);
        assert_eq!(e.achievement_progress(&"first10".into()), Some(0.0));
        assert_eq!(e.achievement_progress(&"nope".into()), None);
        assert!(!e.can_prestige());
        assert!((e.crit_chance() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn from_state_repairs_snapshot() {
        let catalog = Arc::new(Catalog::default());
        let mut state = EconomyState::new(&catalog.tuning);
        state.heat = 500.0;
        let e = Engine::from_state(catalog, state, SimRng::default());
        assert_eq!(e.state().heat, 100.0);
    }

    #[test]
    fn snapshot_roundtrips_through_save() {
        let mut e = engine();
        e.click(Moment::at(0));
        let json = e.snapshot().unwrap();
        let restored = save::decode(&json, &e.catalog().tuning).unwrap();
        assert_eq!(restored.currency, e.state().currency);
        assert_eq!(restored.stats, e.state().stats);
    }
}
