//! Economy state definitions.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::cards::CardKey;
use super::catalog::{AchievementId, AutomationId, Tuning, UpgradeId};

/// Lifetime counters. Never reset by prestige; every numeric field only
/// grows.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub clicks: u64,
    /// Roses earned from every source, ignoring spending.
    pub earned: f64,
    pub passive: f64,
    pub heat_peak: f64,
    /// Set once heat has dropped to zero after peaking at the cooled-from mark.
    pub cooled: bool,
    pub upgrades: u32,
    pub automations: u32,
    pub packs: u32,
    /// Card copies ever revealed.
    pub cards: u32,
    pub legendaries: u32,
    pub meltdowns: u32,
    pub frenzies: u32,
    pub golden: u32,
    pub play_secs: u64,
    pub night_secs: u64,
    pub best_chill_secs: u64,
    pub best_click_burst: u32,
    /// Every automation kind ever hired.
    pub automations_owned: BTreeSet<AutomationId>,
}

/// A timed window that is either running until `until` or idle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Window {
    pub active: bool,
    pub until: u64,
}

impl Window {
    pub fn start(now_ms: u64, duration_ms: u64) -> Self {
        Self {
            active: true,
            until: now_ms.saturating_add(duration_ms),
        }
    }

    pub fn is_running(&self, now_ms: u64) -> bool {
        self.active && now_ms < self.until
    }
}

/// A golden rose waiting to be clicked. Position is in percent of the
/// play area.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GoldenRose {
    pub x: f64,
    pub y: f64,
    pub until: u64,
}

/// A paid-for pack whose card has not been fully revealed yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingDraw {
    pub card: CardKey,
    /// When the card flips and joins the collection.
    pub reveal_at: u64,
    /// When the reveal clears and another pack may be opened.
    pub clear_at: u64,
    pub revealed: bool,
}

/// Short-lived effects with wall-clock expiries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transients {
    /// Doubles all income while running.
    pub frenzy: Window,
    /// Halves passive income while running.
    pub overheat: Window,
    /// Automation offline until the given timestamp.
    pub maintenance: BTreeMap<AutomationId, u64>,
    pub golden: Option<GoldenRose>,
    pub draw: Option<PendingDraw>,
    /// Current run of seconds spent under the chill threshold.
    pub chill_secs: u64,
    /// Timestamps of clicks inside the current burst window.
    pub recent_clicks: VecDeque<u64>,
}

impl Transients {
    pub fn is_offline(&self, id: &AutomationId, now_ms: u64) -> bool {
        self.maintenance.get(id).is_some_and(|&until| until > now_ms)
    }
}

/// Full player state. Mutated only through the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct EconomyState {
    pub currency: f64,
    pub click_power: f64,
    pub upgrades: BTreeMap<UpgradeId, u32>,
    pub automations: BTreeMap<AutomationId, u32>,
    pub cards: BTreeMap<CardKey, u32>,
    pub heat: f64,
    pub prestige_level: u32,
    pub stats: Stats,
    pub achievements: BTreeSet<AchievementId>,
    pub transients: Transients,
}

impl EconomyState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            currency: 0.0,
            click_power: tuning.base_click_power,
            upgrades: BTreeMap::new(),
            automations: BTreeMap::new(),
            cards: BTreeMap::new(),
            heat: 0.0,
            prestige_level: 0,
            stats: Stats::default(),
            achievements: BTreeSet::new(),
            transients: Transients::default(),
        }
    }

    pub fn upgrade_count(&self, id: &UpgradeId) -> u32 {
        self.upgrades.get(id).copied().unwrap_or(0)
    }

    pub fn automation_count(&self, id: &AutomationId) -> u32 {
        self.automations.get(id).copied().unwrap_or(0)
    }

    /// Card copies owned in the current run.
    pub fn card_copies(&self) -> u32 {
        self.cards.values().sum()
    }

    pub fn prestige_multiplier(&self, tuning: &Tuning) -> f64 {
        tuning.prestige_multiplier(self.prestige_level)
    }

    pub fn draw_in_progress(&self) -> bool {
        self.transients.draw.is_some()
    }

    /// Repair anything a hand-edited or foreign snapshot could break:
    /// negative or non-finite numbers and heat out of range.
    pub fn sanitize(&mut self, tuning: &Tuning) {
        fn non_negative(v: f64) -> f64 {
            if v.is_finite() {
                v.max(0.0)
            } else {
                0.0
            }
        }
        self.currency = non_negative(self.currency);
        self.click_power = non_negative(self.click_power).max(tuning.base_click_power);
        self.heat = non_negative(self.heat).min(tuning.heat_max);
        self.stats.earned = non_negative(self.stats.earned);
        self.stats.passive = non_negative(self.stats.passive);
        self.stats.heat_peak = non_negative(self.stats.heat_peak).min(tuning.heat_max);
        self.upgrades.retain(|_, n| *n > 0);
        self.automations.retain(|_, n| *n > 0);
        self.cards.retain(|_, n| *n > 0);
    }
}
