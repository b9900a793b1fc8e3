//! Static game configuration: what can be bought, what it does, what can be
//! unlocked, and every tuning constant.
//!
//! A [`Catalog`] is built once before a session starts and shared read-only
//! (`Arc<Catalog>`) with the engine. Nothing in here changes at runtime.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::cards::{CardPool, CardSource, RarityTable};
use crate::error::CatalogError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Key of an [`UpgradeDef`], e.g. `coal`.
    UpgradeId
);
string_id!(
    /// Key of an [`AutomationDef`], e.g. `spark`.
    AutomationId
);
string_id!(
    /// Key of an [`AchievementDef`], e.g. `first10`.
    AchievementId
);

/// A side effect that scales linearly with owned units, up to a cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Perk {
    /// Added to click crit chance.
    CritChance,
    /// Added to the click multiplier (on top of 1).
    ClickMultiplier,
    /// Heat removed per cooling tick, on top of the base decay.
    Cooling,
    /// Heat added per heater tick.
    Heating,
    /// Roses granted per unit on each spike tick.
    Spike,
    /// Chance that a click pays out twice.
    Duplication,
    /// Heat a click no longer adds.
    HeatShield,
    /// Added to golden rose spawn chance.
    GoldenLure,
    /// Fraction knocked off the pack price.
    PackDiscount,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerkDef {
    pub perk: Perk,
    pub per_unit: f64,
    pub cap: Option<f64>,
}

impl PerkDef {
    const fn capped(perk: Perk, per_unit: f64, cap: f64) -> Self {
        Self {
            perk,
            per_unit,
            cap: Some(cap),
        }
    }

    const fn uncapped(perk: Perk, per_unit: f64) -> Self {
        Self {
            perk,
            per_unit,
            cap: None,
        }
    }

    pub fn value(&self, owned: u32) -> f64 {
        let raw = owned as f64 * self.per_unit;
        match self.cap {
            Some(cap) => raw.min(cap),
            None => raw,
        }
    }
}

/// Permanently raises click power.
#[derive(Clone, Debug, PartialEq)]
pub struct UpgradeDef {
    pub id: UpgradeId,
    pub name: String,
    pub base_cost: f64,
    /// Click power added per unit.
    pub increment: f64,
    pub perk: Option<PerkDef>,
}

/// Produces roses passively.
#[derive(Clone, Debug, PartialEq)]
pub struct AutomationDef {
    pub id: AutomationId,
    pub name: String,
    pub base_cost: f64,
    /// Roses per second per unit.
    pub rate: f64,
    pub perk: Option<PerkDef>,
}

/// What an achievement measures and the value that unlocks it.
#[derive(Clone, Debug, PartialEq)]
pub enum Goal {
    /// Lifetime roses earned.
    Score(f64),
    Clicks(u64),
    /// Lifetime passive income.
    Passive(f64),
    HeatPeak(f64),
    /// Brought heat back to zero after peaking high.
    Cooled,
    /// Drew at least one legendary.
    Legendary,
    LegendaryCount(u32),
    /// Card copies ever collected.
    Collection(u32),
    /// Automations ever hired.
    Automations(u32),
    Upgrades(u32),
    Prestige(u32),
    Frenzies(u32),
    Golden(u32),
    Packs(u32),
    Meltdowns(u32),
    /// Seconds played at night.
    PlayNight(u64),
    /// Seconds played.
    PlayTime(u64),
    /// Consecutive seconds with heat under the chill threshold.
    Chill(u64),
    OwnAutomation(AutomationId),
    /// Clicks inside one burst window.
    ClickBurst(u32),
}

#[derive(Clone, Debug, PartialEq)]
pub struct AchievementDef {
    pub id: AchievementId,
    pub name: String,
    pub description: String,
    pub goal: Goal,
}

/// Periods of the recurring tasks, in milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Periods {
    pub passive: u64,
    pub wither_spike: u64,
    pub blaze_heat: u64,
    pub cooling: u64,
    pub maintenance: u64,
    pub golden_roll: u64,
    pub save: u64,
}

impl Default for Periods {
    fn default() -> Self {
        Self {
            passive: 1_000,
            wither_spike: 7_000,
            blaze_heat: 1_500,
            cooling: 1_000,
            maintenance: 12_000,
            golden_roll: 3_000,
            save: 1_000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackTuning {
    /// Seconds of current passive income the price tracks.
    pub income_seconds: f64,
    pub click_weight: f64,
    pub prestige_step: f64,
    pub floor: f64,
    /// Price never exceeds this share of current roses (but never drops under `floor`).
    pub currency_fraction: f64,
    /// Gap between pack-opened and card-revealed, and again until the next draw.
    pub reveal_gap_ms: u64,
}

impl Default for PackTuning {
    fn default() -> Self {
        Self {
            income_seconds: 30.0,
            click_weight: 5.0,
            prestige_step: 0.1,
            floor: 75.0,
            currency_fraction: 0.05,
            reveal_gap_ms: 900,
        }
    }
}

/// Which automation breaks down, and which one it takes offline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceRule {
    pub source: AutomationId,
    pub target: AutomationId,
    pub chance: f64,
    pub outage_ms: u64,
}

impl Default for MaintenanceRule {
    fn default() -> Self {
        Self {
            source: "smelter".into(),
            target: "smelter".into(),
            chance: 0.1,
            outage_ms: 10_000,
        }
    }
}

/// Every numeric constant of the economy. Overridable from TOML; missing keys
/// keep their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub base_click_power: f64,
    pub upgrade_growth: f64,
    pub automation_growth: f64,

    pub prestige_step: f64,
    pub prestige_min_currency: f64,
    pub prestige_min_cards: u32,

    pub crit_base: f64,
    pub crit_heat_divisor: f64,
    pub crit_cap: f64,
    pub crit_multiplier: f64,
    pub click_heat: f64,

    pub night_multiplier: f64,
    pub night_start_hour: u8,
    pub night_end_hour: u8,

    pub heat_max: f64,
    pub heat_penalty_threshold: f64,
    pub heat_penalty_divisor: f64,
    pub heat_penalty_floor: f64,
    pub base_cooling: f64,

    pub overheat_threshold: f64,
    pub overheat_ms: u64,
    pub overheat_penalty: f64,

    pub frenzy_ms: u64,
    pub frenzy_multiplier: f64,

    pub golden_base_chance: f64,
    pub golden_lifetime_ms: u64,
    pub golden_reward: f64,

    pub burst_window_ms: u64,
    pub chill_below: f64,
    pub cooled_from: f64,

    pub pack: PackTuning,
    pub maintenance: MaintenanceRule,
    pub periods: Periods,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            base_click_power: 1.0,
            upgrade_growth: 1.25,
            automation_growth: 1.3,
            prestige_step: 0.2,
            prestige_min_currency: 5_000.0,
            prestige_min_cards: 50,
            crit_base: 0.05,
            crit_heat_divisor: 400.0,
            crit_cap: 0.35,
            crit_multiplier: 2.0,
            click_heat: 2.0,
            night_multiplier: 1.1,
            night_start_hour: 20,
            night_end_hour: 6,
            heat_max: 100.0,
            heat_penalty_threshold: 40.0,
            heat_penalty_divisor: 120.0,
            heat_penalty_floor: 0.5,
            base_cooling: 4.0,
            overheat_threshold: 99.0,
            overheat_ms: 8_000,
            overheat_penalty: 0.5,
            frenzy_ms: 8_000,
            frenzy_multiplier: 2.0,
            golden_base_chance: 0.08,
            golden_lifetime_ms: 2_500,
            golden_reward: 250.0,
            burst_window_ms: 5_000,
            chill_below: 10.0,
            cooled_from: 80.0,
            pack: PackTuning::default(),
            maintenance: MaintenanceRule::default(),
            periods: Periods::default(),
        }
    }
}

impl Tuning {
    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        Ok(toml::from_str(text)?)
    }

    /// Global multiplier granted by prestige levels.
    pub fn prestige_multiplier(&self, level: u32) -> f64 {
        1.0 + self.prestige_step * level as f64
    }

    /// Reject values that would break the economy's invariants: heat above
    /// 100, a meltdown threshold heat can never reach, chances outside
    /// [0, 1], shrinking costs, negative rewards, zero-length periods.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let chance = |v: f64| (0.0..=1.0).contains(&v);
        let heat = |v: f64| (0.0..=self.heat_max).contains(&v);
        let pack = &self.pack;
        let periods = &self.periods;
        let checks = [
            ("base_click_power", self.base_click_power, self.base_click_power >= 1.0),
            ("upgrade_growth", self.upgrade_growth, self.upgrade_growth >= 1.0),
            ("automation_growth", self.automation_growth, self.automation_growth >= 1.0),
            ("prestige_step", self.prestige_step, self.prestige_step >= 0.0),
            ("prestige_min_currency", self.prestige_min_currency, self.prestige_min_currency >= 0.0),
            ("crit_base", self.crit_base, chance(self.crit_base)),
            ("crit_heat_divisor", self.crit_heat_divisor, self.crit_heat_divisor > 0.0),
            ("crit_cap", self.crit_cap, chance(self.crit_cap)),
            ("crit_multiplier", self.crit_multiplier, self.crit_multiplier >= 1.0),
            ("click_heat", self.click_heat, self.click_heat >= 0.0),
            ("night_multiplier", self.night_multiplier, self.night_multiplier > 0.0),
            ("night_start_hour", f64::from(self.night_start_hour), self.night_start_hour < 24),
            ("night_end_hour", f64::from(self.night_end_hour), self.night_end_hour <= 24),
            ("heat_max", self.heat_max, self.heat_max > 0.0 && self.heat_max <= 100.0),
            ("heat_penalty_threshold", self.heat_penalty_threshold, heat(self.heat_penalty_threshold)),
            ("heat_penalty_divisor", self.heat_penalty_divisor, self.heat_penalty_divisor > 0.0),
            ("heat_penalty_floor", self.heat_penalty_floor, chance(self.heat_penalty_floor)),
            ("base_cooling", self.base_cooling, self.base_cooling >= 0.0),
            (
                "overheat_threshold",
                self.overheat_threshold,
                self.overheat_threshold > 0.0 && heat(self.overheat_threshold),
            ),
            ("overheat_penalty", self.overheat_penalty, chance(self.overheat_penalty)),
            ("frenzy_multiplier", self.frenzy_multiplier, self.frenzy_multiplier >= 1.0),
            ("golden_base_chance", self.golden_base_chance, chance(self.golden_base_chance)),
            ("golden_reward", self.golden_reward, self.golden_reward >= 0.0),
            ("chill_below", self.chill_below, heat(self.chill_below)),
            ("cooled_from", self.cooled_from, heat(self.cooled_from)),
            ("pack.income_seconds", pack.income_seconds, pack.income_seconds >= 0.0),
            ("pack.click_weight", pack.click_weight, pack.click_weight >= 0.0),
            ("pack.prestige_step", pack.prestige_step, pack.prestige_step >= 0.0),
            ("pack.floor", pack.floor, pack.floor >= 0.0),
            ("pack.currency_fraction", pack.currency_fraction, chance(pack.currency_fraction)),
            ("maintenance.chance", self.maintenance.chance, chance(self.maintenance.chance)),
            ("periods.passive", periods.passive as f64, periods.passive > 0),
            ("periods.wither_spike", periods.wither_spike as f64, periods.wither_spike > 0),
            ("periods.blaze_heat", periods.blaze_heat as f64, periods.blaze_heat > 0),
            ("periods.cooling", periods.cooling as f64, periods.cooling > 0),
            ("periods.maintenance", periods.maintenance as f64, periods.maintenance > 0),
            ("periods.golden_roll", periods.golden_roll as f64, periods.golden_roll > 0),
            ("periods.save", periods.save as f64, periods.save > 0),
        ];
        for (field, value, ok) in checks {
            if !(ok && value.is_finite()) {
                return Err(CatalogError::OutOfRange { field, value });
            }
        }
        Ok(())
    }

    pub fn is_night(&self, hour: u8) -> bool {
        if self.night_start_hour <= self.night_end_hour {
            hour >= self.night_start_hour && hour < self.night_end_hour
        } else {
            hour >= self.night_start_hour || hour < self.night_end_hour
        }
    }
}

/// Everything the engine needs to know that isn't player state.
#[derive(Clone, Debug)]
pub struct Catalog {
    pub upgrades: Vec<UpgradeDef>,
    pub automations: Vec<AutomationDef>,
    pub achievements: Vec<AchievementDef>,
    pub rarities: RarityTable,
    pub cards: CardPool,
    pub tuning: Tuning,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            upgrades: builtin_upgrades(),
            automations: builtin_automations(),
            achievements: builtin_achievements(),
            rarities: RarityTable::default(),
            cards: CardPool::default(),
            tuning: Tuning::default(),
        }
    }
}

impl Catalog {
    /// Add a card dataset (JSON array) to the pool.
    pub fn with_cards(mut self, source: CardSource, json: &str) -> Result<Self, CatalogError> {
        self.cards.extend_from_json(source, json, &self.rarities)?;
        Ok(self)
    }

    /// Replace the tuning block with one parsed from TOML.
    pub fn with_tuning_toml(mut self, text: &str) -> Result<Self, CatalogError> {
        self.tuning = Tuning::from_toml_str(text)?;
        self.validate()?;
        Ok(self)
    }

    /// Reject duplicate ids, dangling automation references and tuning
    /// values out of range.
    pub fn validate(&self) -> Result<(), CatalogError> {
        self.tuning.validate()?;
        check_unique(self.upgrades.iter().map(|u| u.id.as_str()))?;
        check_unique(self.automations.iter().map(|a| a.id.as_str()))?;
        check_unique(self.achievements.iter().map(|a| a.id.as_str()))?;

        let rule = &self.tuning.maintenance;
        for id in [&rule.source, &rule.target] {
            if self.automation(id).is_none() {
                return Err(CatalogError::UnknownAutomation(id.to_string()));
            }
        }
        for def in &self.achievements {
            if let Goal::OwnAutomation(id) = &def.goal {
                if self.automation(id).is_none() {
                    return Err(CatalogError::UnknownAutomation(id.to_string()));
                }
            }
        }
        Ok(())
    }

    pub fn upgrade(&self, id: &UpgradeId) -> Option<&UpgradeDef> {
        self.upgrades.iter().find(|u| &u.id == id)
    }

    pub fn automation(&self, id: &AutomationId) -> Option<&AutomationDef> {
        self.automations.iter().find(|a| &a.id == id)
    }

    pub fn achievement(&self, id: &AchievementId) -> Option<&AchievementDef> {
        self.achievements.iter().find(|a| &a.id == id)
    }

    /// `floor(base × growth^owned)`.
    pub fn upgrade_cost(&self, def: &UpgradeDef, owned: u32) -> f64 {
        scaled_cost(def.base_cost, self.tuning.upgrade_growth, owned)
    }

    pub fn automation_cost(&self, def: &AutomationDef, owned: u32) -> f64 {
        scaled_cost(def.base_cost, self.tuning.automation_growth, owned)
    }
}

fn scaled_cost(base: f64, growth: f64, owned: u32) -> f64 {
    (base * growth.powf(f64::from(owned))).floor()
}

fn check_unique<'a>(ids: impl Iterator<Item = &'a str>) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(CatalogError::DuplicateId(id.to_string()));
        }
    }
    Ok(())
}

fn upgrade(id: &str, name: &str, base_cost: f64, increment: f64) -> UpgradeDef {
    UpgradeDef {
        id: id.into(),
        name: name.into(),
        base_cost,
        increment,
        perk: None,
    }
}

fn automation(id: &str, name: &str, base_cost: f64, rate: f64, perk: Option<PerkDef>) -> AutomationDef {
    AutomationDef {
        id: id.into(),
        name: name.into(),
        base_cost,
        rate,
        perk,
    }
}

fn builtin_upgrades() -> Vec<UpgradeDef> {
    let mut diamond = upgrade("diamond", "Diamond", 6_000.0, 400.0);
    diamond.perk = Some(PerkDef::uncapped(Perk::CritChance, 0.002));
    vec![
        upgrade("coal", "Coal", 10.0, 1.0),
        upgrade("char", "Charcoal", 50.0, 5.0),
        upgrade("blaze", "Blaze Rod", 200.0, 20.0),
        upgrade("nether_quartz", "Nether Quartz", 800.0, 60.0),
        upgrade("redstone_block", "Redstone Block", 2_500.0, 180.0),
        diamond,
        upgrade("netherite", "Netherite Ingot", 20_000.0, 1_400.0),
    ]
}

fn builtin_automations() -> Vec<AutomationDef> {
    use Perk::*;
    vec![
        automation("spark", "Spark", 100.0, 0.5, Some(PerkDef::capped(CritChance, 0.002, 0.15))),
        automation("ember", "Ember", 500.0, 2.0, Some(PerkDef::capped(ClickMultiplier, 0.005, 0.5))),
        automation("furnace", "Auto-Furnace", 1_800.0, 6.0, Some(PerkDef::capped(Cooling, 0.5, 6.0))),
        automation("smelter", "Super Smelter", 6_000.0, 20.0, None),
        automation("wither_farm", "Wither Farm", 22_000.0, 70.0, Some(PerkDef::uncapped(Spike, 5.0))),
        automation("blaze_factory", "Blaze Factory", 80_000.0, 220.0, Some(PerkDef::capped(Heating, 0.15, 1.5))),
        automation("hopper", "Hopper Array", 140_000.0, 400.0, Some(PerkDef::capped(Duplication, 0.02, 0.35))),
        automation("beacon", "Beacon", 260_000.0, 700.0, Some(PerkDef::capped(HeatShield, 0.2, 1.5))),
        automation("ender_port", "Ender Port", 420_000.0, 1_100.0, Some(PerkDef::capped(GoldenLure, 0.01, 0.27))),
        automation("quantum", "Quantum Minecart", 780_000.0, 2_000.0, Some(PerkDef::capped(PackDiscount, 0.03, 0.5))),
    ]
}

fn achievement(id: &str, name: &str, description: &str, goal: Goal) -> AchievementDef {
    AchievementDef {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        goal,
    }
}

fn builtin_achievements() -> Vec<AchievementDef> {
    use Goal::*;
    vec![
        achievement("first10", "Sprout", "Collect 10 roses", Score(10.0)),
        achievement("first100", "Bloom", "Collect 100 roses", Score(100.0)),
        achievement("first1k", "Bloom II", "Collect 1,000 roses", Score(1_000.0)),
        achievement("first10k", "Bloom III", "Collect 10,000 roses", Score(10_000.0)),
        achievement("click100", "Tapper I", "Click 100 times", Clicks(100)),
        achievement("click1k", "Tapper II", "Click 1,000 times", Clicks(1_000)),
        achievement("passive100", "Idle I", "Earn 100 passively", Passive(100.0)),
        achievement("passive5k", "Idle II", "Earn 5,000 passively", Passive(5_000.0)),
        achievement("burnhot", "Running Hot", "Reach heat level 50+", HeatPeak(50.0)),
        achievement("cooloff", "Cool Off", "Reduce heat to 0 from 80+", Cooled),
        achievement("firstLegend", "Shiny!", "Draw a legendary card", Legendary),
        achievement("collector10", "Collector I", "Own 10 card copies", Collection(10)),
        achievement("collector50", "Collector II", "Own 50 card copies", Collection(50)),
        achievement("autos5", "Automation I", "Own 5 automations", Automations(5)),
        achievement("autos15", "Automation II", "Own 15 automations", Automations(15)),
        achievement("upgrade5", "Upgrade I", "Buy 5 upgrades", Upgrades(5)),
        achievement("upgrade15", "Upgrade II", "Buy 15 upgrades", Upgrades(15)),
        achievement("prestige1", "Reborn", "Prestige once", Prestige(1)),
        achievement("prestige3", "Phoenix", "Prestige three times", Prestige(3)),
        achievement("frenzy", "Frenzied", "Trigger a Frenzy", Frenzies(1)),
        achievement("golden", "Golden Touch", "Click a Golden Rose", Golden(1)),
        achievement("packs10", "Pack Opener I", "Open 10 packs", Packs(10)),
        achievement("packs50", "Pack Opener II", "Open 50 packs", Packs(50)),
        achievement("melt", "Melt Down", "Survive an overheat meltdown", Meltdowns(1)),
        achievement("score50k", "Garden I", "Total 50,000 roses", Score(50_000.0)),
        achievement("score250k", "Garden II", "Total 250,000 roses", Score(250_000.0)),
        achievement("score1m", "Garden III", "Total 1,000,000 roses", Score(1_000_000.0)),
        achievement("click10k", "Tapper III", "Click 10,000 times", Clicks(10_000)),
        achievement("passive50k", "Idle III", "Earn 50,000 passively", Passive(50_000.0)),
        achievement("autos25", "Automation III", "Own 25 automations", Automations(25)),
        achievement("upgrades30", "Upgrade III", "Buy 30 upgrades", Upgrades(30)),
        achievement("prestige5", "Phoenix II", "Prestige five times", Prestige(5)),
        achievement("packs100", "Pack Master", "Open 100 packs", Packs(100)),
        achievement("meltdown3", "Fire Walker", "Survive 3 meltdowns", Meltdowns(3)),
        achievement("legend3", "Shinier!", "Own 3 legendaries", LegendaryCount(3)),
        achievement("night5", "Night Owl", "Play at night 5 minutes", PlayNight(300)),
        achievement("play30", "Session I", "Play 30 minutes total", PlayTime(1_800)),
        achievement("frenzy5", "Hype Train", "Trigger 5 Frenzies", Frenzies(5)),
        achievement("golden5", "Alchemist", "Click 5 Golden Roses", Golden(5)),
        achievement("heat0", "Chill", "Keep heat under 10 for 60s", Chill(60)),
        achievement("beacon1", "Beacon Online", "Buy a Beacon", OwnAutomation("beacon".into())),
        achievement("quantum1", "Quantum Leap", "Buy a Quantum Minecart", OwnAutomation("quantum".into())),
        achievement("combo", "Combo!", "Click 20 times in 5s", ClickBurst(20)),
    ]
}
