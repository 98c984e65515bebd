//! Single tick source with independent due-times.
//!
//! The host feeds elapsed time through [`Scheduler::next_due`] and
//! [`Scheduler::fire`]; timers come due in chronological order and ties are
//! broken by [`TimerId::ALL`] order.
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerId {
    /// One-second session clock.
    Clock,
    /// Motion and collision tick.
    Motion,
    CollectibleSpawn,
    ObstacleSpawn,
}

impl TimerId {
    pub const ALL: [Self; 4] = [
        Self::Clock,
        Self::Motion,
        Self::CollectibleSpawn,
        Self::ObstacleSpawn,
    ];

    const fn slot(self) -> usize {
        match self {
            Self::Clock => 0,
            Self::Motion => 1,
            Self::CollectibleSpawn => 2,
            Self::ObstacleSpawn => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scheduler {
    now: Duration,
    due: [Duration; 4],
    armed: bool,
}

impl Scheduler {
    /// Reset the clock to zero and schedule each timer one period out.
    pub fn arm(&mut self, periods: [(TimerId, Duration); 4]) {
        self.now = Duration::ZERO;
        for (id, period) in periods {
            self.due[id.slot()] = Self::step(Duration::ZERO, period);
        }
        self.armed = true;
    }

    /// Stop every timer; the clock keeps advancing through [`Self::settle`].
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.armed
    }

    /// Time elapsed on the simulation clock since the last arm.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    #[must_use]
    pub const fn due_at(&self, id: TimerId) -> Duration {
        self.due[id.slot()]
    }

    /// Earliest timer due at or before `until`, if any.
    #[must_use]
    pub fn next_due(&self, until: Duration) -> Option<TimerId> {
        if !self.armed {
            return None;
        }
        TimerId::ALL
            .into_iter()
            .filter(|id| self.due_at(*id) <= until)
            .min_by_key(|id| (self.due_at(*id), id.slot()))
    }

    /// Move the clock to the timer's due time and schedule its next firing.
    pub fn fire(&mut self, id: TimerId, next_period: Duration) -> Duration {
        let at = self.due_at(id);
        self.now = self.now.max(at);
        self.due[id.slot()] = Self::step(at, next_period);
        at
    }

    /// Advance the clock to `until` once every due timer has fired.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    fn step(from: Duration, period: Duration) -> Duration {
        from.saturating_add(period.max(Duration::from_millis(1)))
    }
}
