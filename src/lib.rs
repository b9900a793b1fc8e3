//! Wither Clicker economy engine.
//!
//! A deterministic, render-free simulation of the Wither Clicker rose game:
//! clicks, upgrades, automations, heat, frenzies, golden roses, card packs,
//! prestige and achievements. Hosts drive it through [`session::Session`]
//! or directly through [`clicker::Engine`].

pub mod clicker;
pub mod error;
pub mod session;
pub mod time;

pub use clicker::actions::{Action, Event, PeriodicTask};
pub use clicker::catalog::Catalog;
pub use clicker::notify::Notification;
pub use clicker::rng::{RandomSource, ScriptedRandom, SimRng};
pub use clicker::Engine;
pub use error::{Blocked, CatalogError, StoreError};
pub use session::Session;
pub use time::Moment;
