//! Host-side driver: owns the engine, the periodic task clock and the two
//! snapshot stores.
//!
//! A host creates one [`Session`] when the game view opens, calls
//! [`Session::pump`] from its timer, forwards player input to
//! [`Session::act`], and calls [`Session::close`] when the view goes away.
//! Closing consumes the session, so nothing can tick after it.

use std::sync::Arc;

use crate::clicker::actions::{Action, PeriodicTask};
use crate::clicker::catalog::Catalog;
use crate::clicker::notify::Notification;
use crate::clicker::rng::RandomSource;
use crate::clicker::save::{self, SnapshotStore};
use crate::clicker::Engine;
use crate::time::{Moment, TaskClock};

/// Largest gap between two pumps that is replayed as task firings.
pub const MAX_CATCH_UP_MS: u64 = 10_000;

/// What an action did.
#[derive(Debug, Default, PartialEq)]
pub struct Outcome {
    pub accepted: bool,
    pub notifications: Vec<Notification>,
}

pub struct Session<R: RandomSource, P: SnapshotStore, F: SnapshotStore> {
    engine: Engine<R>,
    clock: TaskClock<PeriodicTask>,
    primary: P,
    fallback: F,
}

impl<R: RandomSource, P: SnapshotStore, F: SnapshotStore> Session<R, P, F> {
    /// Load the newest usable snapshot (primary store first) or start fresh,
    /// and start the task clock at `now`.
    pub fn open(catalog: Arc<Catalog>, rng: R, mut primary: P, mut fallback: F, now: Moment) -> Self {
        let loaded = save::load_snapshot(&mut [&mut primary, &mut fallback], &catalog.tuning);
        let engine = match loaded {
            Some(state) => {
                log::info!(
                    "session resumed: prestige {}, {} achievements",
                    state.prestige_level,
                    state.achievements.len()
                );
                Engine::from_state(catalog, state, rng)
            }
            None => {
                log::info!("session started fresh");
                Engine::with_rng(catalog, rng)
            }
        };
        let periods = engine.catalog().tuning.periods.clone();
        let mut clock = PeriodicTask::ALL
            .iter()
            .fold(TaskClock::new(MAX_CATCH_UP_MS), |clock, &task| {
                clock.every(task.period_ms(&periods), task)
            });
        clock.update(now.epoch_ms);

        let mut session = Self {
            engine,
            clock,
            primary,
            fallback,
        };
        session.engine.advance(now);
        session
    }

    pub fn engine(&self) -> &Engine<R> {
        &self.engine
    }

    /// Run every periodic task that came due since the last pump, each at
    /// its own due time, then settle at `now`.
    pub fn pump(&mut self, now: Moment) -> Vec<Notification> {
        for firing in self.clock.update(now.epoch_ms) {
            let at = Moment::new(firing.at, now.local_hour);
            match firing.task {
                PeriodicTask::Save => {
                    self.engine.advance(at);
                    self.save();
                }
                task => self.engine.run_task(task, at),
            }
        }
        self.engine.advance(now);
        self.engine.drain_notifications()
    }

    /// Forward a player action. Accepted purchases, draws, prestiges and
    /// claims are saved right away.
    pub fn act(&mut self, action: Action, now: Moment) -> Outcome {
        let accepted = self.engine.apply(&action, now);
        if accepted && action.is_significant() {
            self.save();
        }
        Outcome {
            accepted,
            notifications: self.engine.drain_notifications(),
        }
    }

    /// Write a snapshot to both stores. Returns whether either took it.
    pub fn save(&mut self) -> bool {
        save::save_snapshot(self.engine.state(), &mut [&mut self.primary, &mut self.fallback])
    }

    /// Final save; hands the stores back.
    pub fn close(mut self) -> (P, F) {
        if !self.save() {
            log::warn!("final snapshot could not be saved");
        }
        log::debug!("session closed after {}ms", self.clock.total_elapsed_ms);
        (self.primary, self.fallback)
    }
}
