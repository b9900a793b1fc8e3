//! Notifications the engine emits for the view layer: toasts, click float
//! text and reveal stages. The engine never renders; `Display` gives the
//! player-facing text.

use std::fmt;

use super::cards::{CardKey, Rarity};
use super::catalog::{AchievementId, AutomationId, UpgradeId};

#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    /// Float text for a single click.
    Click {
        gain: f64,
        critical: bool,
        duplicated: bool,
    },
    Critical,
    Duplicated,
    UpgradeBought {
        id: UpgradeId,
        name: String,
        increment: f64,
    },
    AutomationHired {
        id: AutomationId,
        name: String,
        rate: f64,
    },
    WitherSpike {
        gain: f64,
    },
    MaintenanceStarted {
        id: AutomationId,
        name: String,
        until: u64,
        duration_ms: u64,
    },
    MaintenanceEnded {
        id: AutomationId,
    },
    Meltdown {
        until: u64,
        duration_ms: u64,
        penalty: f64,
    },
    OverheatEnded,
    FrenzyStarted {
        until: u64,
        duration_ms: u64,
        multiplier: f64,
    },
    FrenzyEnded,
    GoldenSpawned {
        x: f64,
        y: f64,
        until: u64,
    },
    GoldenExpired,
    GoldenClaimed {
        gain: f64,
    },
    /// First reveal stage: the pack is paid for and shaking.
    PackOpened {
        cost: f64,
        reveal_at: u64,
    },
    /// Second reveal stage: the card flips and joins the collection.
    CardRevealed {
        key: CardKey,
        name: String,
        rarity: Rarity,
        cps: f64,
    },
    /// The reveal is gone; another pack may be opened.
    RevealCleared,
    AchievementUnlocked {
        id: AchievementId,
        name: String,
    },
    Prestiged {
        level: u32,
        bonus: f64,
    },
}

impl Notification {
    /// Whether the host shows this as a toast (float texts are not).
    pub fn is_toast(&self) -> bool {
        matches!(
            self,
            Notification::Critical
                | Notification::Duplicated
                | Notification::UpgradeBought { .. }
                | Notification::AutomationHired { .. }
                | Notification::WitherSpike { .. }
                | Notification::MaintenanceStarted { .. }
                | Notification::Meltdown { .. }
                | Notification::FrenzyStarted { .. }
                | Notification::GoldenClaimed { .. }
                | Notification::CardRevealed { .. }
                | Notification::AchievementUnlocked { .. }
                | Notification::Prestiged { .. }
        )
    }
}

fn secs(ms: u64) -> u64 {
    ms / 1000
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Click {
                gain,
                critical,
                duplicated,
            } => {
                let total = if *duplicated { gain * 2.0 } else { *gain };
                write!(f, "+{}", format_number(total.floor()))?;
                if *critical {
                    f.write_str("!!")?;
                }
                if *duplicated {
                    f.write_str(" (H)")?;
                }
                Ok(())
            }
            Notification::Critical => f.write_str("Critical!"),
            Notification::Duplicated => f.write_str("Hopper duplicated your click!"),
            Notification::UpgradeBought {
                name, increment, ..
            } => write!(f, "Bought {name} (+{}/click)", format_number(*increment)),
            Notification::AutomationHired { name, rate, .. } => {
                write!(f, "Hired {name} (+{}/s)", format_number(*rate))
            }
            Notification::WitherSpike { gain } => {
                write!(f, "Wither spike +{}", format_number(*gain))
            }
            Notification::MaintenanceStarted {
                name, duration_ms, ..
            } => write!(f, "{name} maintenance: output halted for {}s", secs(*duration_ms)),
            Notification::MaintenanceEnded { id } => write!(f, "{id} back online"),
            Notification::Meltdown {
                duration_ms,
                penalty,
                ..
            } => write!(
                f,
                "Overheat meltdown! Passive -{:.0}% for {}s",
                (1.0 - penalty) * 100.0,
                secs(*duration_ms)
            ),
            Notification::OverheatEnded => f.write_str("Overheat cleared"),
            Notification::FrenzyStarted {
                duration_ms,
                multiplier,
                ..
            } => write!(f, "Frenzy! x{} for {}s", format_number(*multiplier), secs(*duration_ms)),
            Notification::FrenzyEnded => f.write_str("Frenzy over"),
            Notification::GoldenSpawned { .. } => f.write_str("A golden rose appeared"),
            Notification::GoldenExpired => f.write_str("The golden rose wilted"),
            Notification::GoldenClaimed { gain } => {
                write!(f, "Golden Rose! +{}", format_number(*gain))
            }
            Notification::PackOpened { cost, .. } => {
                write!(f, "Opening pack (-{})", format_number(*cost))
            }
            Notification::CardRevealed {
                name, rarity, cps, ..
            } => write!(f, "Card: {name} [{rarity}] (+{cps:.2}/s)"),
            Notification::RevealCleared => f.write_str("Ready for another pack"),
            Notification::AchievementUnlocked { name, .. } => write!(f, "Achievement: {name}"),
            Notification::Prestiged { bonus, .. } => {
                write!(f, "Prestiged! +{:.0}% global multiplier", bonus * 100.0)
            }
        }
    }
}

/// Group thousands with commas and keep one decimal when it matters
/// (`1234567.0` → `"1,234,567"`, `12.5` → `"12.5"`).
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "∞" } else { "-∞" }.to_string();
    }
    if n < 0.0 {
        return format!("-{}", format_number(-n));
    }
    let whole = n.trunc();
    let digits = (whole as u64).to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    let tenths = ((n - whole) * 10.0).round() as u8;
    if (1..10).contains(&tenths) {
        out.push('.');
        out.push(char::from(b'0' + tenths));
    }
    out
}
