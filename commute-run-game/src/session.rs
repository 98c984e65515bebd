use std::time::Duration;

use crate::config::RunConfig;
use crate::scoring::RunExport;
use crate::state::{Input, Phase, RunState, TickReport};

/// Host-facing owner of the current [`RunState`] snapshot.
#[derive(Debug, Clone, Default)]
pub struct RunSimulator {
    state: RunState,
}

impl RunSimulator {
    /// Construct an idle simulator for `seed`.
    #[must_use]
    pub fn new(seed: u64, config: RunConfig) -> Self {
        Self {
            state: RunState::new(seed, config),
        }
    }

    /// Wrap an existing snapshot, e.g. one restored from serde.
    #[must_use]
    pub const fn from_state(state: RunState) -> Self {
        Self { state }
    }

    /// Start or restart a run. No-op while a run is active.
    pub fn start(&mut self, started_at_ms: u64) -> bool {
        self.state.start(started_at_ms)
    }

    pub fn apply_input(&mut self, input: Input) -> bool {
        self.state.apply_input(input)
    }

    /// Feed elapsed host time into the scheduler.
    pub fn advance(&mut self, delta: Duration) -> TickReport {
        self.state.advance(delta)
    }

    /// Advance by whole milliseconds, the unit most host frame timers report.
    pub fn advance_ms(&mut self, delta_ms: u64) -> TickReport {
        self.advance(Duration::from_millis(delta_ms))
    }

    pub fn mark_explored(&mut self) -> bool {
        self.state.mark_explored()
    }

    /// End the run early. Idempotent once finished.
    pub fn finish(&mut self) -> bool {
        self.state.finish()
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.state.phase()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state.phase() == Phase::Finished
    }

    #[must_use]
    pub fn export(&self) -> Option<RunExport> {
        self.state.export()
    }

    /// Borrow the current snapshot.
    #[must_use]
    pub const fn state(&self) -> &RunState {
        &self.state
    }

    /// Apply a closure to the mutable snapshot.
    pub fn with_state_mut<R>(&mut self, f: impl FnOnce(&mut RunState) -> R) -> R {
        f(&mut self.state)
    }

    /// Deterministically reseed the spawn streams. Takes effect for the
    /// current run and every restart after it.
    pub fn reseed(&mut self, seed: u64) {
        self.state.reseed(seed);
    }

    /// Consume the simulator, returning the snapshot.
    #[must_use]
    pub fn into_state(self) -> RunState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulator_runs_to_completion() {
        let mut sim = RunSimulator::new(4242, RunConfig::default());
        assert!(sim.start(1_000));
        let mut finished = 0;
        for _ in 0..130 {
            if sim.advance_ms(1_000).finished {
                finished += 1;
            }
        }
        assert_eq!(finished, 1);
        assert!(sim.is_finished());

        let export = sim.export().expect("finished runs export");
        assert_eq!(export.seed, 4242);
        assert_eq!(export.total_play_time_secs, 120);
        assert_eq!(export.started_at_ms, 1_000);
        assert_eq!(export.ended_at_ms, 121_000);
    }

    #[test]
    fn reseed_changes_the_spawn_pattern() {
        let mut a = RunSimulator::new(1, RunConfig::default());
        let mut b = RunSimulator::new(1, RunConfig::default());
        b.reseed(2);
        a.start(0);
        b.start(0);
        a.advance_ms(30_000);
        b.advance_ms(30_000);
        assert_eq!(b.state().seed(), 2);
        let ids_a: Vec<_> = a.state().entities().iter().map(|e| (e.kind, e.lane)).collect();
        let ids_b: Vec<_> = b.state().entities().iter().map(|e| (e.kind, e.lane)).collect();
        assert_ne!(ids_a, ids_b);
    }

    #[test]
    fn with_state_mut_reaches_the_snapshot() {
        let mut sim = RunSimulator::default();
        sim.start(0);
        let moved = sim.with_state_mut(|state| state.apply_input(Input::MoveRight));
        assert!(moved);
        let state = sim.into_state();
        assert_eq!(state.player_lane().index(), 2);
    }
}
