//! The run aggregate: phase machine, scheduler-driven tick loop and snapshot.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::time::Duration;

use crate::catalog::EntityKind;
use crate::config::RunConfig;
use crate::constants::{LOG_TARGET_COLLISION, LOG_TARGET_SESSION};
use crate::effects::{PulseId, PulseSet};
use crate::entity::{Entity, EntityId, Lane};
use crate::motion::{self, Impact};
use crate::numbers::duration_to_millis;
use crate::rng::SpawnRng;
use crate::scheduler::{Scheduler, TimerId};
use crate::scoring::{AnalyticsRecord, DerivedMetrics, RunExport, Scoreboard};
use crate::spawner::{SpawnClass, roll_spawn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Finished,
}

/// Lane change request from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Input {
    MoveLeft,
    MoveRight,
}

impl Input {
    /// Map a keyboard key name (`ArrowLeft` / `ArrowRight`) to an input.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" => Some(Self::MoveLeft),
            "ArrowRight" => Some(Self::MoveRight),
            _ => None,
        }
    }

    /// Map a tap at horizontal offset `x` on a surface `width` wide: the left
    /// half steers left, the right half steers right.
    #[must_use]
    pub fn from_tap(x: f32, width: f32) -> Option<Self> {
        if !width.is_finite() || width <= 0.0 || !x.is_finite() {
            return None;
        }
        if x < width / 2.0 {
            Some(Self::MoveLeft)
        } else {
            Some(Self::MoveRight)
        }
    }
}

/// A resolved collision, as reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub entity: EntityId,
    pub kind: EntityKind,
    pub lane: Lane,
    pub pulse: PulseId,
    /// Simulation time of the motion tick that resolved the collision.
    pub at: Duration,
}

/// An entity introduced by a spawn timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnEvent {
    pub entity: EntityId,
    pub kind: EntityKind,
    pub lane: Lane,
}

/// What happened during one call to [`RunState::advance`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub collisions: SmallVec<[CollisionEvent; 4]>,
    pub spawned: SmallVec<[SpawnEvent; 4]>,
    pub motion_ticks: u32,
    pub exited: usize,
    pub expired_pulses: usize,
    /// Set when this advance moved the run into [`Phase::Finished`].
    pub finished: bool,
}

/// Complete, serializable state of one simulator, spawn stream positions
/// included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    seed: u64,
    config: RunConfig,
    phase: Phase,
    elapsed_secs: u32,
    player_lane: Lane,
    speed: f32,
    slow_until: Option<Duration>,
    entities: Vec<Entity>,
    next_entity_id: u64,
    pulses: PulseSet,
    scoreboard: Scoreboard,
    analytics: AnalyticsRecord,
    scheduler: Scheduler,
    rng: SpawnRng,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new(0, RunConfig::default())
    }
}

impl RunState {
    /// Idle state for `seed`; nothing moves until [`Self::start`].
    #[must_use]
    pub fn new(seed: u64, config: RunConfig) -> Self {
        let speed = config.motion.base_speed;
        Self {
            seed,
            config,
            phase: Phase::Idle,
            elapsed_secs: 0,
            player_lane: Lane::default(),
            speed,
            slow_until: None,
            entities: Vec::new(),
            next_entity_id: 0,
            pulses: PulseSet::default(),
            scoreboard: Scoreboard::default(),
            analytics: AnalyticsRecord::default(),
            scheduler: Scheduler::default(),
            rng: SpawnRng::from_user_seed(seed),
        }
    }

    /// Begin a session from Idle or Finished, resetting everything.
    ///
    /// Returns `false` and leaves the state untouched while a session is
    /// already running.
    pub fn start(&mut self, started_at_ms: u64) -> bool {
        if self.phase == Phase::Running {
            return false;
        }

        self.phase = Phase::Running;
        self.elapsed_secs = 0;
        self.player_lane = Lane::default();
        self.speed = self.config.motion.base_speed;
        self.slow_until = None;
        self.entities.clear();
        self.next_entity_id = 0;
        self.pulses.clear();
        self.scoreboard = Scoreboard::default();
        self.analytics = AnalyticsRecord::started(started_at_ms);
        self.rng = SpawnRng::from_user_seed(self.seed);
        self.scheduler.arm([
            (TimerId::Clock, self.config.clock_period()),
            (TimerId::Motion, self.config.motion_period()),
            (TimerId::CollectibleSpawn, self.config.collectible_period()),
            (TimerId::ObstacleSpawn, self.config.obstacle_period(0)),
        ]);

        log::info!(
            target: LOG_TARGET_SESSION,
            "run started (seed {}, started_at_ms {started_at_ms})",
            self.seed
        );
        true
    }

    /// Move the player one lane. Ignored outside a running session; returns
    /// whether the lane changed.
    pub fn apply_input(&mut self, input: Input) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        let before = self.player_lane;
        self.player_lane = match input {
            Input::MoveLeft => before.left(),
            Input::MoveRight => before.right(),
        };
        self.player_lane != before
    }

    /// Fire every timer that comes due within `delta`, in chronological order.
    pub fn advance(&mut self, delta: Duration) -> TickReport {
        let mut report = TickReport::default();
        if self.phase == Phase::Idle {
            return report;
        }

        let target = self.scheduler.now().saturating_add(delta);
        while let Some(timer) = self.scheduler.next_due(target) {
            let next_period = self.period_after(timer);
            let at = self.scheduler.fire(timer, next_period);
            report.expired_pulses += self.pulses.expire(at);
            match timer {
                TimerId::Clock => self.on_clock(&mut report),
                TimerId::Motion => self.on_motion(at, &mut report),
                TimerId::CollectibleSpawn => self.on_spawn(SpawnClass::Collectible, &mut report),
                TimerId::ObstacleSpawn => self.on_spawn(SpawnClass::Obstacle, &mut report),
            }
        }
        self.scheduler.settle(target);
        report.expired_pulses += self.pulses.expire(target);
        report
    }

    /// Pure form of [`Self::advance`]: the snapshot is left untouched and the
    /// evolved copy is returned alongside the report.
    #[must_use]
    pub fn advanced(&self, delta: Duration) -> (Self, TickReport) {
        let mut next = self.clone();
        let report = next.advance(delta);
        (next, report)
    }

    /// End the running session and seal the analytics record.
    ///
    /// Returns `true` only for the call that sealed the record.
    pub fn finish(&mut self) -> bool {
        if self.phase == Phase::Idle {
            return false;
        }
        self.phase = Phase::Finished;
        self.scheduler.disarm();

        let ended_at_ms = self
            .analytics
            .started_at_ms
            .saturating_add(duration_to_millis(self.scheduler.now()));
        let sealed = self
            .analytics
            .finalize(self.elapsed_secs, self.scoreboard.score, ended_at_ms);
        if sealed {
            log::info!(
                target: LOG_TARGET_SESSION,
                "run finished after {}s with score {} (eco {})",
                self.elapsed_secs,
                self.scoreboard.score,
                self.scoreboard.eco
            );
        }
        sealed
    }

    /// Record that the player followed the post-run call to action.
    /// Only honoured once the run has finished.
    pub fn mark_explored(&mut self) -> bool {
        if self.phase != Phase::Finished {
            return false;
        }
        self.analytics.explore_clicked = true;
        true
    }

    /// Place an entity on the track directly, bypassing the spawn timers.
    ///
    /// Used for scripted sequences; ignored outside a running session.
    pub fn place_entity(
        &mut self,
        kind: EntityKind,
        lane: Lane,
        position: f32,
    ) -> Option<EntityId> {
        if self.phase != Phase::Running {
            return None;
        }
        let id = EntityId(self.next_entity_id);
        self.next_entity_id = self.next_entity_id.saturating_add(1);
        self.entities.push(Entity::new(id, kind, lane, position));
        Some(id)
    }

    #[must_use]
    pub fn derived_metrics(&self) -> DerivedMetrics {
        DerivedMetrics::compute(
            self.scoreboard.score,
            self.scoreboard.eco,
            self.elapsed_secs,
        )
    }

    /// Export record; `None` until the run has finished.
    #[must_use]
    pub fn export(&self) -> Option<RunExport> {
        RunExport::from_record(
            self.seed,
            &self.analytics,
            self.derived_metrics(),
            self.scoreboard.eco,
        )
    }

    pub(crate) fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = SpawnRng::from_user_seed(seed);
    }

    fn period_after(&self, timer: TimerId) -> Duration {
        match timer {
            TimerId::Clock => self.config.clock_period(),
            TimerId::Motion => self.config.motion_period(),
            TimerId::CollectibleSpawn => self.config.collectible_period(),
            TimerId::ObstacleSpawn => self.config.obstacle_period(self.elapsed_secs),
        }
    }

    fn on_clock(&mut self, report: &mut TickReport) {
        self.elapsed_secs = self.elapsed_secs.saturating_add(1);
        if self.elapsed_secs >= self.config.session.duration_secs {
            report.finished = self.finish();
        }
    }

    fn on_motion(&mut self, now: Duration, report: &mut TickReport) {
        if self.slow_until.is_some_and(|until| now >= until) {
            self.slow_until = None;
        }
        let speed = motion::effective_speed(&self.config.motion, self.speed, self.slow_until, now);
        motion::advance_entities(&mut self.entities, speed);

        let impacts =
            motion::collect_impacts(&mut self.entities, self.player_lane, &self.config.track);
        for impact in impacts {
            let event = self.resolve_impact(impact, now);
            report.collisions.push(event);
        }

        report.exited += motion::sweep_exited(&mut self.entities, &self.config.track);
        report.motion_ticks = report.motion_ticks.saturating_add(1);
        self.speed = motion::nominal_speed(&self.config.motion, self.elapsed_secs);
    }

    fn resolve_impact(&mut self, impact: Impact, now: Duration) -> CollisionEvent {
        let payload = impact.kind.payload();
        self.scoreboard.apply(payload);
        if payload.slows {
            self.slow_until = Some(now.saturating_add(self.config.slow_duration()));
        }
        self.analytics.record_collision(impact.kind);
        let pulse = self.pulses.emit(
            impact.kind.pulse(),
            impact.kind.color(),
            now,
            self.config.pulse_ttl(),
        );

        log::debug!(
            target: LOG_TARGET_COLLISION,
            "{} hit in lane {} at {:.1} (score {}, eco {})",
            impact.kind,
            impact.lane.index(),
            impact.position,
            self.scoreboard.score,
            self.scoreboard.eco
        );

        CollisionEvent {
            entity: impact.entity,
            kind: impact.kind,
            lane: impact.lane,
            pulse,
            at: now,
        }
    }

    fn on_spawn(&mut self, class: SpawnClass, report: &mut TickReport) {
        let rng = match class {
            SpawnClass::Collectible => self.rng.collectible(),
            SpawnClass::Obstacle => self.rng.obstacle(),
        };
        if let Some(entity) = roll_spawn(class, &self.config, rng, &mut self.next_entity_id) {
            report.spawned.push(SpawnEvent {
                entity: entity.id,
                kind: entity.kind,
                lane: entity.lane,
            });
            self.entities.push(entity);
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub const fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    #[must_use]
    pub const fn player_lane(&self) -> Lane {
        self.player_lane
    }

    /// Nominal speed for the next motion tick, before any slow window.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Speed the next motion tick would apply at the current clock.
    #[must_use]
    pub fn effective_speed(&self) -> f32 {
        motion::effective_speed(
            &self.config.motion,
            self.speed,
            self.slow_until,
            self.scheduler.now(),
        )
    }

    #[must_use]
    pub const fn slow_until(&self) -> Option<Duration> {
        self.slow_until
    }

    #[must_use]
    pub fn is_slowed(&self) -> bool {
        self.slow_until.is_some_and(|until| self.scheduler.now() < until)
    }

    /// Simulation time since the current session started.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.scheduler.now()
    }

    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    #[must_use]
    pub const fn pulses(&self) -> &PulseSet {
        &self.pulses
    }

    #[must_use]
    pub const fn score(&self) -> u32 {
        self.scoreboard.score
    }

    #[must_use]
    pub const fn eco(&self) -> u32 {
        self.scoreboard.eco
    }

    #[must_use]
    pub const fn analytics(&self) -> &AnalyticsRecord {
        &self.analytics
    }

    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CollectibleKind, ObstacleKind};

    fn quiet_config() -> RunConfig {
        let mut cfg = RunConfig::default();
        cfg.spawn.collectible_chance = 0.0;
        cfg.spawn.obstacle_chance = 0.0;
        cfg
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn idle_state_ignores_everything_but_start() {
        let mut state = RunState::new(1, quiet_config());
        assert!(!state.apply_input(Input::MoveLeft));
        assert_eq!(state.advance(ms(5_000)), TickReport::default());
        assert!(!state.mark_explored());
        assert!(!state.finish());
        assert!(state.export().is_none());
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn input_mapping_covers_keys_and_taps() {
        assert_eq!(Input::from_key("ArrowLeft"), Some(Input::MoveLeft));
        assert_eq!(Input::from_key("ArrowRight"), Some(Input::MoveRight));
        assert_eq!(Input::from_key("Space"), None);
        assert_eq!(Input::from_tap(10.0, 400.0), Some(Input::MoveLeft));
        assert_eq!(Input::from_tap(200.0, 400.0), Some(Input::MoveRight));
        assert_eq!(Input::from_tap(10.0, 0.0), None);
    }

    #[test]
    fn lane_changes_clamp_at_the_edges() {
        let mut state = RunState::new(1, quiet_config());
        state.start(0);
        assert!(state.apply_input(Input::MoveLeft));
        assert!(!state.apply_input(Input::MoveLeft));
        assert_eq!(state.player_lane(), Lane::LEFT);
        state.apply_input(Input::MoveRight);
        state.apply_input(Input::MoveRight);
        assert!(!state.apply_input(Input::MoveRight));
        assert_eq!(state.player_lane(), Lane::RIGHT);
    }

    #[test]
    fn starting_twice_keeps_the_running_session() {
        let mut state = RunState::new(1, quiet_config());
        assert!(state.start(10));
        state.advance(ms(3_000));
        assert!(!state.start(99));
        assert_eq!(state.elapsed_secs(), 3);
        assert_eq!(state.analytics().started_at_ms, 10);
    }

    #[test]
    fn motion_ticks_every_fifty_millis() {
        let mut state = RunState::new(1, quiet_config());
        state.start(0);
        assert_eq!(state.advance(ms(49)).motion_ticks, 0);
        assert_eq!(state.advance(ms(1)).motion_ticks, 1);
        assert_eq!(state.advance(ms(1_000)).motion_ticks, 20);
        assert_eq!(state.elapsed_secs(), 1);
    }

    #[test]
    fn collision_emits_pulse_that_expires_after_ttl() {
        let mut state = RunState::new(1, quiet_config());
        state.start(0);
        let battery = EntityKind::Collectible(CollectibleKind::Battery);
        state.place_entity(battery, Lane::MIDDLE, 63.0);

        let report = state.advance(ms(50));
        assert_eq!(report.collisions.len(), 1);
        assert_eq!(report.collisions[0].at, ms(50));
        assert_eq!((state.score(), state.eco()), (7, 3));
        assert_eq!(state.pulses().len(), 1);

        state.advance(ms(499));
        assert_eq!(state.pulses().len(), 1);
        let report = state.advance(ms(1));
        assert_eq!(report.expired_pulses, 1);
        assert!(state.pulses().is_empty());
    }

    #[test]
    fn traffic_is_cosmetic_but_counts_as_a_hit() {
        let mut state = RunState::new(1, quiet_config());
        state.start(0);
        state.place_entity(EntityKind::Collectible(CollectibleKind::Solar), Lane::MIDDLE, 63.0);
        state.advance(ms(50));
        state.place_entity(EntityKind::Obstacle(ObstacleKind::Traffic), Lane::MIDDLE, 63.0);
        state.advance(ms(50));

        assert_eq!((state.score(), state.eco()), (10, 5));
        assert_eq!(state.analytics().obstacle_hits, 1);
        assert!(state.pulses().contains(crate::effects::PulseKind::Shake));
        assert!(!state.is_slowed());
    }

    #[test]
    fn obstacle_period_shrinks_as_the_session_ages() {
        let mut state = RunState::new(1, quiet_config());
        state.start(0);
        state.advance(ms(50_000));
        let due = state.scheduler().due_at(TimerId::ObstacleSpawn);
        let remaining = due.saturating_sub(state.now());
        assert!(remaining <= ms(1_520), "remaining {remaining:?}");
    }

    #[test]
    fn advanced_leaves_the_snapshot_untouched() {
        let mut state = RunState::new(7, RunConfig::default());
        state.start(0);
        state.advance(ms(10_000));
        let before = serde_json::to_string(&state).unwrap();

        let (next, report) = state.advanced(ms(5_000));
        assert_eq!(serde_json::to_string(&state).unwrap(), before);
        assert_eq!(next.elapsed_secs(), 15);
        assert_eq!(report.motion_ticks, 100);

        let (again, again_report) = state.advanced(ms(5_000));
        assert_eq!(
            serde_json::to_string(&again).unwrap(),
            serde_json::to_string(&next).unwrap()
        );
        assert_eq!(again_report, report);
    }

    #[test]
    fn snapshots_with_eco_out_of_range_are_rejected() {
        let mut state = RunState::new(3, quiet_config());
        state.start(0);
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains(r#""scoreboard":{"score":0,"eco":0}"#));
        assert!(serde_json::from_str::<RunState>(&json).is_ok());

        let tampered = json.replace(
            r#""scoreboard":{"score":0,"eco":0}"#,
            r#""scoreboard":{"score":0,"eco":250}"#,
        );
        assert!(serde_json::from_str::<RunState>(&tampered).is_err());
    }
}
