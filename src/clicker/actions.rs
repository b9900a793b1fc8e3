//! Events the engine accepts: discrete player actions and named periodic
//! tasks.

use super::catalog::{AutomationId, Periods, UpgradeId};

/// Something the player did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Click,
    BuyUpgrade(UpgradeId),
    BuyAutomation(AutomationId),
    DrawCard,
    ClaimGolden,
    StartFrenzy,
    Prestige,
}

impl Action {
    /// Whether a successful action is worth an immediate save rather than
    /// waiting for the next save tick.
    pub fn is_significant(&self) -> bool {
        !matches!(self, Action::Click)
    }
}

/// A recurring job the host's timer drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PeriodicTask {
    /// Passive income accrual plus play-time bookkeeping.
    Passive,
    /// Lump-sum payout from spike automations.
    WitherSpike,
    /// Heat from heater automations.
    BlazeHeat,
    /// Heat decay plus coolant automations.
    Cooling,
    /// Chance of a maintenance outage.
    Maintenance,
    /// Chance of a golden rose.
    GoldenRoll,
    /// Persist a snapshot. Handled by the host; a no-op inside the engine.
    Save,
}

impl PeriodicTask {
    pub const ALL: [PeriodicTask; 7] = [
        PeriodicTask::Passive,
        PeriodicTask::WitherSpike,
        PeriodicTask::BlazeHeat,
        PeriodicTask::Cooling,
        PeriodicTask::Maintenance,
        PeriodicTask::GoldenRoll,
        PeriodicTask::Save,
    ];

    pub fn period_ms(self, periods: &Periods) -> u64 {
        match self {
            PeriodicTask::Passive => periods.passive,
            PeriodicTask::WitherSpike => periods.wither_spike,
            PeriodicTask::BlazeHeat => periods.blaze_heat,
            PeriodicTask::Cooling => periods.cooling,
            PeriodicTask::Maintenance => periods.maintenance,
            PeriodicTask::GoldenRoll => periods.golden_roll,
            PeriodicTask::Save => periods.save,
        }
    }
}

/// Anything that can be fed to `Engine::handle`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Action(Action),
    Task(PeriodicTask),
    /// Only let time pass: expire windows and resolve pending reveals.
    Advance,
}

impl From<Action> for Event {
    fn from(a: Action) -> Self {
        Event::Action(a)
    }
}

impl From<PeriodicTask> for Event {
    fn from(t: PeriodicTask) -> Self {
        Event::Task(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_periods() {
        let p = Periods::default();
        let got: Vec<u64> = PeriodicTask::ALL.iter().map(|t| t.period_ms(&p)).collect();
        assert_eq!(got, [1_000, 7_000, 1_500, 1_000, 12_000, 3_000, 1_000]);
    }

    #[test]
    fn clicks_are_not_significant() {
        assert!(!Action::Click.is_significant());
        assert!(Action::Prestige.is_significant());
        assert!(Action::BuyUpgrade("coal".into()).is_significant());
    }
}
