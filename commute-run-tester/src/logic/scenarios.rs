use anyhow::{Result, ensure};
use commute_run_game::RunConfig;

use crate::logic::game_tester::{
    SimulationPlan, SimulationSummary, expect_clean, expect_finished,
};
use crate::logic::policy::AutopilotStrategy;

/// Scenario keys expanded by `all`, in run order.
pub const ALL_SCENARIOS: [&str; 6] = [
    "smoke",
    "invariants",
    "deterministic",
    "collector",
    "dodger",
    "restart",
];

// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: String,
    pub description: &'static str,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(
        key: &'static str,
        name: impl Into<String>,
        description: &'static str,
        plan: SimulationPlan,
    ) -> Self {
        Self {
            key,
            name: name.into(),
            description,
            plan,
        }
    }
}

#[must_use]
pub fn catalog() -> Vec<TestScenario> {
    vec![
        TestScenario::simulation(
            "smoke",
            "Smoke",
            "Idle player survives a full session and the record seals",
            SimulationPlan::new(AutopilotStrategy::Idle)
                .with_expectation(expect_finished)
                .with_expectation(expect_clean),
        ),
        TestScenario::simulation(
            "invariants",
            "Frame Invariants",
            "Random lane changes over uneven frames never break an invariant",
            SimulationPlan::new(AutopilotStrategy::Random)
                .with_frame_ms(37)
                .with_max_frames(4_000)
                .with_expectation(expect_finished)
                .with_expectation(expect_clean)
                .with_expectation(collisions_happened),
        ),
        TestScenario::simulation(
            "deterministic",
            "Deterministic Replay",
            "Same seed and inputs reproduce the exported record",
            SimulationPlan::new(AutopilotStrategy::Random)
                .with_replays(1)
                .with_expectation(expect_finished)
                .with_expectation(replays_match),
        ),
        TestScenario::simulation(
            "collector",
            "Collector Autopilot",
            "Steering toward collectibles earns score and eco",
            SimulationPlan::new(AutopilotStrategy::Collector)
                .with_expectation(expect_finished)
                .with_expectation(expect_clean)
                .with_expectation(collector_scores),
        ),
        TestScenario::simulation(
            "dodger",
            "Dodger Autopilot",
            "Leaving threatened lanes avoids most obstacles",
            SimulationPlan::new(AutopilotStrategy::Dodger)
                .with_expectation(expect_finished)
                .with_expectation(expect_clean)
                .with_expectation(dodger_avoids_obstacles),
        ),
        TestScenario::simulation(
            "restart",
            "Restart After Finish",
            "Explore flag survives the seal and a restart resets the run",
            SimulationPlan::new(AutopilotStrategy::Collector)
                .with_setup(short_session)
                .with_explore()
                .with_restart()
                .with_expectation(expect_finished)
                .with_expectation(explore_recorded)
                .with_expectation(restart_resets),
        ),
    ]
}

#[must_use]
pub fn get_scenario(key: &str) -> Option<TestScenario> {
    catalog().into_iter().find(|scenario| scenario.key == key)
}

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog()
        .into_iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

fn short_session(cfg: &mut RunConfig) {
    cfg.session.duration_secs = 30;
}

fn collisions_happened(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.totals.collisions > 0,
        "a full random run should hit something"
    );
    Ok(())
}

fn replays_match(summary: &SimulationSummary) -> Result<()> {
    ensure!(!summary.replay_exports.is_empty(), "no replay recorded");
    for (index, replay) in summary.replay_exports.iter().enumerate() {
        ensure!(
            replay == &summary.export,
            "replay {} diverged: {:?} vs {:?}",
            index + 1,
            replay,
            summary.export
        );
    }
    Ok(())
}

fn collector_scores(summary: &SimulationSummary) -> Result<()> {
    let record = summary.final_state.analytics();
    ensure!(
        record.pickups() >= 10,
        "collector picked up only {} items",
        record.pickups()
    );
    ensure!(summary.final_state.score() > 0, "collector finished with no score");
    Ok(())
}

fn dodger_avoids_obstacles(summary: &SimulationSummary) -> Result<()> {
    let hits = summary.final_state.analytics().obstacle_hits;
    let spawned = summary.totals.obstacles_spawned;
    ensure!(
        usize::try_from(hits).unwrap_or(usize::MAX).saturating_mul(4) <= spawned,
        "dodger hit {hits} of {spawned} obstacles"
    );
    Ok(())
}

fn explore_recorded(summary: &SimulationSummary) -> Result<()> {
    let export = summary
        .export
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("no export after finish"))?;
    ensure!(export.explore_clicked, "explore flag missing from export");
    ensure!(
        export.final_score == summary.final_state.analytics().final_score,
        "explore changed the frozen score"
    );
    Ok(())
}

fn restart_resets(summary: &SimulationSummary) -> Result<()> {
    let Some(fresh) = &summary.restarted else {
        anyhow::bail!("run was not restarted");
    };
    ensure!(fresh.score() == 0 && fresh.eco() == 0, "score/eco not reset");
    ensure!(fresh.elapsed_secs() == 0, "clock not reset");
    ensure!(fresh.entities().is_empty(), "entities survived the restart");
    ensure!(fresh.pulses().is_empty(), "pulses survived the restart");
    ensure!(fresh.player_lane().index() == 1, "lane not back in the middle");
    ensure!(
        fresh.analytics().ended_at_ms.is_none() && !fresh.analytics().explore_clicked,
        "analytics record not reset"
    );
    Ok(())
}
