//! Wall-clock time and a fixed-period task clock.
//!
//! The host calls [`TaskClock::update`] with a timestamp whenever it gets
//! control (animation frame, interval callback, test loop). The clock
//! accumulates elapsed milliseconds per task and returns every firing that
//! came due, ordered by when it was due, so the engine sees the same
//! sequence regardless of how irregularly the host polls.

/// A point in time as the engine sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Moment {
    /// Milliseconds since the Unix epoch (or any fixed origin in tests).
    pub epoch_ms: u64,
    /// Local wall-clock hour, 0..=23. Drives the night bonus.
    pub local_hour: u8,
}

impl Moment {
    pub fn new(epoch_ms: u64, local_hour: u8) -> Self {
        Self {
            epoch_ms,
            local_hour: local_hour % 24,
        }
    }

    /// Midday at the given timestamp: no night bonus. Handy for tests.
    pub fn at(epoch_ms: u64) -> Self {
        Self::new(epoch_ms, 12)
    }

    pub fn later(self, ms: u64) -> Self {
        Self {
            epoch_ms: self.epoch_ms.saturating_add(ms),
            ..self
        }
    }

    /// Current time from the browser clock.
    #[cfg(target_arch = "wasm32")]
    pub fn now() -> Self {
        let date = js_sys::Date::new_0();
        Self::new(date.get_time() as u64, date.get_hours() as u8)
    }

    /// Current time from the system clock. The hour is UTC.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn now() -> Self {
        let ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self::new(ms, ((ms / 3_600_000) % 24) as u8)
    }
}

/// One due occurrence of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Firing<T> {
    pub task: T,
    /// Timestamp at which the task came due.
    pub at: u64,
}

struct Slot<T> {
    task: T,
    period_ms: u64,
    accumulator: u64,
}

pub struct TaskClock<T> {
    slots: Vec<Slot<T>>,
    /// Largest gap between two updates that is replayed; anything beyond is
    /// dropped so a long-suspended tab doesn't flood the engine.
    max_catch_up_ms: u64,
    last_timestamp: Option<u64>,
    pub total_elapsed_ms: u64,
}

impl<T: Copy> TaskClock<T> {
    pub fn new(max_catch_up_ms: u64) -> Self {
        Self {
            slots: Vec::new(),
            max_catch_up_ms,
            last_timestamp: None,
            total_elapsed_ms: 0,
        }
    }

    /// Register a task. A zero period is treated as one millisecond.
    pub fn every(mut self, period_ms: u64, task: T) -> Self {
        self.slots.push(Slot {
            task,
            period_ms: period_ms.max(1),
            accumulator: 0,
        });
        self
    }

    /// Feed a wall-clock timestamp; returns the firings that came due since
    /// the previous call, earliest first. Ties keep registration order.
    pub fn update(&mut self, now_ms: u64) -> Vec<Firing<T>> {
        let delta = match self.last_timestamp {
            // Clocks can step backwards (NTP, tab restore): treat as no time passed.
            Some(prev) => now_ms.saturating_sub(prev).min(self.max_catch_up_ms),
            None => 0,
        };
        self.last_timestamp = Some(now_ms);
        self.total_elapsed_ms += delta;

        let mut due = Vec::new();
        for slot in &mut self.slots {
            slot.accumulator += delta;
            while slot.accumulator >= slot.period_ms {
                let at = now_ms.saturating_sub(slot.accumulator - slot.period_ms);
                due.push(Firing { task: slot.task, at });
                slot.accumulator -= slot.period_ms;
            }
        }
        due.sort_by_key(|f| f.at);
        due
    }

    /// Forget accumulated time, e.g. after a snapshot was reloaded.
    pub fn reset(&mut self) {
        self.last_timestamp = None;
        for slot in &mut self.slots {
            slot.accumulator = 0;
        }
    }

    #[cfg(test)]
    pub fn task_count(&self) -> usize {
        self.slots.len()
    }
}
