use std::time::Duration;

use commute_run_game::{AnalyticsRecord, Phase, RunConfig, RunSimulator, RunState, TickReport};

use crate::logic::policy::PlayerPolicy;

/// Violations beyond this count are tallied but not stored.
const MAX_RECORDED_VIOLATIONS: usize = 8;

/// Configuration for a simulation session.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub seed: u64,
    pub started_at_ms: u64,
    pub frame: Duration,
    pub max_frames: u32,
    pub run: RunConfig,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(seed: u64, started_at_ms: u64, run: RunConfig) -> Self {
        Self {
            seed,
            started_at_ms,
            frame: Duration::from_millis(50),
            max_frames: 10_000,
            run,
        }
    }

    #[must_use]
    pub fn with_frame_ms(mut self, frame_ms: u64) -> Self {
        self.frame = Duration::from_millis(frame_ms.max(1));
        self
    }

    #[must_use]
    pub fn with_max_frames(mut self, max_frames: u32) -> Self {
        self.max_frames = max_frames;
        self
    }
}

/// Result of advancing the simulation by one host frame.
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    pub frame: u32,
    pub moved: bool,
    pub report: TickReport,
}

/// Running totals gathered across every frame of one session.
#[derive(Debug, Clone, Default)]
pub struct FrameTotals {
    pub frames: u32,
    pub lane_changes: u32,
    pub motion_ticks: u32,
    pub collisions: usize,
    pub collectibles_spawned: usize,
    pub obstacles_spawned: usize,
    pub finished_reports: u32,
    pub violation_count: usize,
    pub violations: Vec<String>,
}

impl FrameTotals {
    fn record_violation(&mut self, frame: u32, message: String) {
        self.violation_count += 1;
        if self.violations.len() < MAX_RECORDED_VIOLATIONS {
            self.violations.push(format!("frame {frame}: {message}"));
        }
    }
}

/// Deterministic frame loop driving a [`RunSimulator`] with a policy.
pub struct SimulationSession {
    sim: RunSimulator,
    config: SimulationConfig,
    totals: FrameTotals,
    sealed_record: Option<AnalyticsRecord>,
    last_record: AnalyticsRecord,
}

impl SimulationSession {
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        let mut sim = RunSimulator::new(config.seed, config.run.clone());
        sim.start(config.started_at_ms);
        let last_record = sim.state().analytics().clone();
        Self {
            sim,
            config,
            totals: FrameTotals::default(),
            sealed_record: None,
            last_record,
        }
    }

    #[must_use]
    pub fn state(&self) -> &RunState {
        self.sim.state()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.sim.is_finished()
    }

    /// Consult the policy, feed one frame of time and check invariants.
    pub fn advance(&mut self, policy: &mut dyn PlayerPolicy) -> FrameOutcome {
        let frame = self.totals.frames;
        let moved = match policy.decide(self.sim.state()) {
            Some(input) => self.sim.apply_input(input),
            None => false,
        };
        if moved {
            self.totals.lane_changes += 1;
        }

        let report = self.sim.advance(self.config.frame);
        self.tally(&report);
        self.check_invariants(frame, &report);
        self.totals.frames += 1;

        FrameOutcome {
            frame,
            moved,
            report,
        }
    }

    /// Run frames until the session finishes or the frame budget runs out.
    pub fn run_to_end(&mut self, policy: &mut dyn PlayerPolicy) {
        while !self.is_finished() && self.totals.frames < self.config.max_frames {
            let outcome = self.advance(policy);
            for collision in &outcome.report.collisions {
                log::debug!(
                    "frame {}: {} in lane {}",
                    outcome.frame,
                    collision.kind,
                    collision.lane.index()
                );
            }
            if outcome.moved {
                log::trace!(
                    "frame {} [{}]: lane now {}",
                    outcome.frame,
                    policy.name(),
                    self.state().player_lane().index()
                );
            }
        }
    }

    /// Restart the finished run and return the fresh snapshot.
    pub fn restart(&mut self) -> RunState {
        self.sim.start(self.config.started_at_ms);
        self.sealed_record = None;
        self.last_record = self.sim.state().analytics().clone();
        self.sim.state().clone()
    }

    pub fn mark_explored(&mut self) -> bool {
        let marked = self.sim.mark_explored();
        if let Some(sealed) = self.sealed_record.as_mut() {
            sealed.explore_clicked |= marked;
        }
        marked
    }

    #[must_use]
    pub fn into_parts(self) -> (RunSimulator, FrameTotals) {
        (self.sim, self.totals)
    }

    fn tally(&mut self, report: &TickReport) {
        self.totals.motion_ticks += report.motion_ticks;
        self.totals.collisions += report.collisions.len();
        for spawn in &report.spawned {
            if spawn.kind.is_obstacle() {
                self.totals.obstacles_spawned += 1;
            } else {
                self.totals.collectibles_spawned += 1;
            }
        }
        if report.finished {
            self.totals.finished_reports += 1;
        }
    }

    fn check_invariants(&mut self, frame: u32, report: &TickReport) {
        let state = self.sim.state();
        let mut problems = Vec::new();

        if state.player_lane().index() > 2 {
            problems.push(format!(
                "player lane {} out of range",
                state.player_lane().index()
            ));
        }
        if state.eco() > 100 {
            problems.push(format!("eco {} above 100", state.eco()));
        }
        let duration = state.config().session.duration_secs;
        if state.elapsed_secs() > duration {
            problems.push(format!("elapsed {}s past {duration}s", state.elapsed_secs()));
        }
        let exit = state.config().track.exit_position;
        if let Some(entity) = state.entities().iter().find(|entity| entity.position >= exit) {
            problems.push(format!(
                "entity {} kept past the exit at {:.1}",
                entity.id.0, entity.position
            ));
        }
        let ordered = state.entities().windows(2).all(|pair| pair[0].id < pair[1].id);
        if !ordered {
            problems.push("entity ids not strictly increasing".to_string());
        }
        let now = state.now();
        if state
            .pulses()
            .active()
            .iter()
            .any(|pulse| pulse.expires_at <= now)
        {
            problems.push("expired pulse still active".to_string());
        }
        if self.totals.finished_reports > 1 {
            problems.push("finish reported more than once".to_string());
        }

        let record = state.analytics();
        let counters = |r: &AnalyticsRecord| {
            [r.solar_pickups, r.battery_pickups, r.leaf_pickups, r.obstacle_hits]
        };
        let regressed = counters(record)
            .iter()
            .zip(counters(&self.last_record).iter())
            .any(|(now, before)| now < before);
        if regressed {
            problems.push("analytics counter decreased".to_string());
        }
        let hits = report.collisions.len();
        let counted = counters(record)
            .iter()
            .sum::<u32>()
            .saturating_sub(counters(&self.last_record).iter().sum::<u32>());
        if usize::try_from(counted).unwrap_or(usize::MAX) != hits {
            problems.push(format!("{hits} collisions but {counted} counter increments"));
        }

        if let Some(sealed) = &self.sealed_record {
            if sealed != record {
                problems.push("sealed analytics record changed".to_string());
            }
        } else if state.phase() == Phase::Finished {
            self.sealed_record = Some(record.clone());
        }
        self.last_record = record.clone();

        for problem in problems {
            self.totals.record_violation(frame, problem);
        }
    }
}
