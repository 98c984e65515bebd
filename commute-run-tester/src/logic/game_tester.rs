use anyhow::{Result, ensure};
use chrono::Utc;
use std::sync::Arc;

use commute_run_game::{RunConfig, RunExport, RunState};

use crate::logic::policy::AutopilotStrategy;
use crate::logic::simulation::{FrameTotals, SimulationConfig, SimulationSession};

pub const DEFAULT_FRAME_MS: u64 = 50;
pub const DEFAULT_MAX_FRAMES: u32 = 20_000;

/// Policy RNG streams are kept apart from the spawn streams of the same seed.
const POLICY_SEED_SALT: u64 = 0x5EED_C0DE;

/// Scripted run: which autopilot plays, at what frame rate, and what to check.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: AutopilotStrategy,
    pub frame_ms: u64,
    pub max_frames: Option<u32>,
    pub setup: Option<fn(&mut RunConfig)>,
    /// Extra runs with identical inputs, kept for determinism checks.
    pub replays: u32,
    pub explore_after_finish: bool,
    pub restart_after_finish: bool,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(strategy: AutopilotStrategy) -> Self {
        Self {
            strategy,
            frame_ms: DEFAULT_FRAME_MS,
            max_frames: None,
            setup: None,
            replays: 0,
            explore_after_finish: false,
            restart_after_finish: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_frame_ms(mut self, frame_ms: u64) -> Self {
        self.frame_ms = frame_ms;
        self
    }

    #[must_use]
    pub const fn with_max_frames(mut self, max_frames: u32) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    #[must_use]
    pub fn with_setup(mut self, setup: fn(&mut RunConfig)) -> Self {
        self.setup = Some(setup);
        self
    }

    #[must_use]
    pub const fn with_replays(mut self, replays: u32) -> Self {
        self.replays = replays;
        self
    }

    #[must_use]
    pub const fn with_explore(mut self) -> Self {
        self.explore_after_finish = true;
        self
    }

    #[must_use]
    pub const fn with_restart(mut self) -> Self {
        self.restart_after_finish = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: AutopilotStrategy,
    pub export: Option<RunExport>,
    pub final_state: RunState,
    pub totals: FrameTotals,
    pub replay_exports: Vec<Option<RunExport>>,
    /// Snapshot taken right after restarting the finished run.
    pub restarted: Option<RunState>,
}

impl SimulationSummary {
    #[must_use]
    pub fn finished(&self) -> bool {
        self.export.is_some()
    }

    /// Short status line used in failure messages.
    #[must_use]
    pub fn status_line(&self) -> String {
        let state = &self.final_state;
        format!(
            "strategy {} seed {} | {}s | score {} eco {} | frames {} ticks {} moves {} \
             collisions {} violations {}",
            self.strategy,
            self.seed,
            state.elapsed_secs(),
            state.score(),
            state.eco(),
            self.totals.frames,
            self.totals.motion_ticks,
            self.totals.lane_changes,
            self.totals.collisions,
            self.totals.violation_count
        )
    }
}

/// Headless deterministic runner for the simulation core.
#[derive(Debug, Clone)]
pub struct GameTester {
    config: Arc<RunConfig>,
    started_at_ms: u64,
    verbose: bool,
}

impl GameTester {
    /// Build a tester whose runs all report the same wall-clock start.
    #[must_use]
    pub fn new(config: RunConfig, verbose: bool) -> Self {
        let started_at_ms = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        Self {
            config: Arc::new(config),
            started_at_ms,
            verbose,
        }
    }

    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    #[must_use]
    pub const fn started_at_ms(&self) -> u64 {
        self.started_at_ms
    }

    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let sim_config = self.simulation_config(plan, seed);

        let mut session = self.play(plan, sim_config.clone());
        let export = session.state().export();
        let final_state = session.state().clone();
        let restarted = plan.restart_after_finish.then(|| session.restart());
        let (_, totals) = session.into_parts();

        let replay_exports = (0..plan.replays)
            .map(|_| self.play(plan, sim_config.clone()).state().export())
            .collect();

        if self.verbose {
            log::debug!(
                "{} seed {seed}: score {} after {} frames",
                plan.strategy,
                final_state.score(),
                totals.frames
            );
        }

        SimulationSummary {
            seed,
            strategy: plan.strategy,
            export,
            final_state,
            totals,
            replay_exports,
            restarted,
        }
    }

    fn simulation_config(&self, plan: &SimulationPlan, seed: u64) -> SimulationConfig {
        let mut run = (*self.config).clone();
        if let Some(setup) = plan.setup {
            setup(&mut run);
        }
        SimulationConfig::new(seed, self.started_at_ms, run)
            .with_frame_ms(plan.frame_ms)
            .with_max_frames(plan.max_frames.unwrap_or(DEFAULT_MAX_FRAMES))
    }

    fn play(&self, plan: &SimulationPlan, config: SimulationConfig) -> SimulationSession {
        let mut policy = plan.strategy.create_policy(config.seed ^ POLICY_SEED_SALT);
        let mut session = SimulationSession::new(config);
        session.run_to_end(policy.as_mut());
        if plan.explore_after_finish {
            session.mark_explored();
        }
        session
    }
}

/// The run reached the end of the session and produced an export.
pub fn expect_finished(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.finished(),
        "run did not finish: {}",
        summary.status_line()
    );
    let duration = summary.final_state.config().session.duration_secs;
    if let Some(export) = &summary.export {
        ensure!(
            export.total_play_time_secs == duration,
            "play time {} != session length {duration}",
            export.total_play_time_secs
        );
        ensure!(
            export.final_score == summary.final_state.score(),
            "frozen score {} differs from final score {}",
            export.final_score,
            summary.final_state.score()
        );
    }
    Ok(())
}

/// No per-frame invariant was violated.
pub fn expect_clean(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.totals.violation_count == 0,
        "{} invariant violations: {}",
        summary.totals.violation_count,
        summary.totals.violations.join("; ")
    );
    ensure!(
        summary.totals.finished_reports <= 1,
        "finish reported {} times",
        summary.totals.finished_reports
    );
    Ok(())
}
