//! Run tuning configuration.
//!
//! Every field defaults to the values in [`crate::constants`], so a partial
//! JSON document only needs to name the values it overrides.
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::constants::{
    BASE_SPEED, COLLECTIBLE_CHANCE, COLLECTIBLE_PERIOD_MS, COLLISION_BAND_MAX, COLLISION_BAND_MIN,
    COLLISION_LIMIT, EXIT_POSITION, LOG_TARGET_CONFIG, MOTION_TICK_MS, OBSTACLE_CHANCE,
    OBSTACLE_PERIOD_FLOOR_MS, OBSTACLE_PERIOD_MS, OBSTACLE_RAMP_MS_PER_SEC, PULSE_TTL_MS,
    SESSION_CLOCK_PERIOD_MS, SESSION_DURATION_SECS, SLOW_DURATION_MS, SLOW_FACTOR,
    SPAWN_POSITION, SPEED_CAP, SPEED_RAMP_SECS_PER_UNIT,
};

/// Errors raised when run configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum RunConfigError {
    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f32,
        max: f32,
        value: f32,
    },
    #[error("speed cap {cap:.2} is below base speed {base:.2}")]
    SpeedCapBelowBase { base: f32, cap: f32 },
    #[error("obstacle period floor {floor}ms exceeds base period {base}ms")]
    ObstacleFloorAboveBase { floor: u64, base: u64 },
    #[error(
        "track geometry invalid: spawn {spawn:.1}, band {band_min:.1}..{band_max:.1}, limit {limit:.1}, exit {exit:.1}"
    )]
    TrackGeometry {
        spawn: f32,
        band_min: f32,
        band_max: f32,
        limit: f32,
        exit: f32,
    },
    #[error("failed to parse run config: {0}")]
    Parse(String),
}

/// Session length and clock cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCfg {
    #[serde(default = "SessionCfg::default_duration_secs")]
    pub duration_secs: u32,
    #[serde(default = "SessionCfg::default_clock_period_ms")]
    pub clock_period_ms: u64,
}

impl SessionCfg {
    const fn default_duration_secs() -> u32 {
        SESSION_DURATION_SECS
    }

    const fn default_clock_period_ms() -> u64 {
        SESSION_CLOCK_PERIOD_MS
    }
}

impl Default for SessionCfg {
    fn default() -> Self {
        Self {
            duration_secs: Self::default_duration_secs(),
            clock_period_ms: Self::default_clock_period_ms(),
        }
    }
}

/// Motion tick cadence, speed ramp and slow-down tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionCfg {
    #[serde(default = "MotionCfg::default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "MotionCfg::default_base_speed")]
    pub base_speed: f32,
    #[serde(default = "MotionCfg::default_speed_cap")]
    pub speed_cap: f32,
    /// Elapsed seconds needed to gain one unit of speed.
    #[serde(default = "MotionCfg::default_ramp_secs_per_unit")]
    pub ramp_secs_per_unit: f32,
    #[serde(default = "MotionCfg::default_slow_factor")]
    pub slow_factor: f32,
    #[serde(default = "MotionCfg::default_slow_duration_ms")]
    pub slow_duration_ms: u64,
}

impl MotionCfg {
    const fn default_tick_ms() -> u64 {
        MOTION_TICK_MS
    }

    const fn default_base_speed() -> f32 {
        BASE_SPEED
    }

    const fn default_speed_cap() -> f32 {
        SPEED_CAP
    }

    const fn default_ramp_secs_per_unit() -> f32 {
        SPEED_RAMP_SECS_PER_UNIT
    }

    const fn default_slow_factor() -> f32 {
        SLOW_FACTOR
    }

    const fn default_slow_duration_ms() -> u64 {
        SLOW_DURATION_MS
    }
}

impl Default for MotionCfg {
    fn default() -> Self {
        Self {
            tick_ms: Self::default_tick_ms(),
            base_speed: Self::default_base_speed(),
            speed_cap: Self::default_speed_cap(),
            ramp_secs_per_unit: Self::default_ramp_secs_per_unit(),
            slow_factor: Self::default_slow_factor(),
            slow_duration_ms: Self::default_slow_duration_ms(),
        }
    }
}

/// Vertical track geometry, in percent of the visible track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackCfg {
    #[serde(default = "TrackCfg::default_spawn_position")]
    pub spawn_position: f32,
    #[serde(default = "TrackCfg::default_band_min")]
    pub band_min: f32,
    #[serde(default = "TrackCfg::default_band_max")]
    pub band_max: f32,
    /// Entities at or beyond this position never collide.
    #[serde(default = "TrackCfg::default_collision_limit")]
    pub collision_limit: f32,
    #[serde(default = "TrackCfg::default_exit_position")]
    pub exit_position: f32,
}

impl TrackCfg {
    const fn default_spawn_position() -> f32 {
        SPAWN_POSITION
    }

    const fn default_band_min() -> f32 {
        COLLISION_BAND_MIN
    }

    const fn default_band_max() -> f32 {
        COLLISION_BAND_MAX
    }

    const fn default_collision_limit() -> f32 {
        COLLISION_LIMIT
    }

    const fn default_exit_position() -> f32 {
        EXIT_POSITION
    }

    /// Whether a vertical position sits inside the collision band.
    #[must_use]
    pub fn in_band(&self, position: f32) -> bool {
        position > self.band_min && position < self.band_max && position < self.collision_limit
    }
}

impl Default for TrackCfg {
    fn default() -> Self {
        Self {
            spawn_position: Self::default_spawn_position(),
            band_min: Self::default_band_min(),
            band_max: Self::default_band_max(),
            collision_limit: Self::default_collision_limit(),
            exit_position: Self::default_exit_position(),
        }
    }
}

/// Spawn cadence and probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnCfg {
    #[serde(default = "SpawnCfg::default_collectible_period_ms")]
    pub collectible_period_ms: u64,
    #[serde(default = "SpawnCfg::default_collectible_chance")]
    pub collectible_chance: f32,
    #[serde(default = "SpawnCfg::default_obstacle_period_ms")]
    pub obstacle_period_ms: u64,
    #[serde(default = "SpawnCfg::default_obstacle_period_floor_ms")]
    pub obstacle_period_floor_ms: u64,
    /// Milliseconds shaved off the obstacle period per elapsed second.
    #[serde(default = "SpawnCfg::default_obstacle_ramp_ms_per_sec")]
    pub obstacle_ramp_ms_per_sec: u64,
    #[serde(default = "SpawnCfg::default_obstacle_chance")]
    pub obstacle_chance: f32,
}

impl SpawnCfg {
    const fn default_collectible_period_ms() -> u64 {
        COLLECTIBLE_PERIOD_MS
    }

    const fn default_collectible_chance() -> f32 {
        COLLECTIBLE_CHANCE
    }

    const fn default_obstacle_period_ms() -> u64 {
        OBSTACLE_PERIOD_MS
    }

    const fn default_obstacle_period_floor_ms() -> u64 {
        OBSTACLE_PERIOD_FLOOR_MS
    }

    const fn default_obstacle_ramp_ms_per_sec() -> u64 {
        OBSTACLE_RAMP_MS_PER_SEC
    }

    const fn default_obstacle_chance() -> f32 {
        OBSTACLE_CHANCE
    }
}

impl Default for SpawnCfg {
    fn default() -> Self {
        Self {
            collectible_period_ms: Self::default_collectible_period_ms(),
            collectible_chance: Self::default_collectible_chance(),
            obstacle_period_ms: Self::default_obstacle_period_ms(),
            obstacle_period_floor_ms: Self::default_obstacle_period_floor_ms(),
            obstacle_ramp_ms_per_sec: Self::default_obstacle_ramp_ms_per_sec(),
            obstacle_chance: Self::default_obstacle_chance(),
        }
    }
}

/// Effect pulse lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectsCfg {
    #[serde(default = "EffectsCfg::default_pulse_ttl_ms")]
    pub pulse_ttl_ms: u64,
}

impl EffectsCfg {
    const fn default_pulse_ttl_ms() -> u64 {
        PULSE_TTL_MS
    }
}

impl Default for EffectsCfg {
    fn default() -> Self {
        Self {
            pulse_ttl_ms: Self::default_pulse_ttl_ms(),
        }
    }
}

/// Complete tuning for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunConfig {
    #[serde(default)]
    pub session: SessionCfg,
    #[serde(default)]
    pub motion: MotionCfg,
    #[serde(default)]
    pub track: TrackCfg,
    #[serde(default)]
    pub spawn: SpawnCfg,
    #[serde(default)]
    pub effects: EffectsCfg,
}

impl RunConfig {
    /// Parse and validate a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`RunConfigError::Parse`] for malformed JSON and any validation
    /// error reported by [`RunConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, RunConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| RunConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        log::debug!(target: LOG_TARGET_CONFIG, "loaded run config: {cfg:?}");
        Ok(cfg)
    }

    /// Check the configuration invariants the simulation relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), RunConfigError> {
        let periods = [
            ("session.duration_secs", u64::from(self.session.duration_secs)),
            ("session.clock_period_ms", self.session.clock_period_ms),
            ("motion.tick_ms", self.motion.tick_ms),
            ("spawn.collectible_period_ms", self.spawn.collectible_period_ms),
            ("spawn.obstacle_period_floor_ms", self.spawn.obstacle_period_floor_ms),
            ("effects.pulse_ttl_ms", self.effects.pulse_ttl_ms),
        ];
        if let Some((field, _)) = periods.iter().find(|(_, value)| *value == 0) {
            return Err(RunConfigError::ZeroValue { field: *field });
        }

        if self.motion.base_speed <= 0.0 {
            return Err(RunConfigError::ZeroValue {
                field: "motion.base_speed",
            });
        }
        if self.motion.ramp_secs_per_unit <= 0.0 {
            return Err(RunConfigError::ZeroValue {
                field: "motion.ramp_secs_per_unit",
            });
        }
        if self.motion.speed_cap < self.motion.base_speed {
            return Err(RunConfigError::SpeedCapBelowBase {
                base: self.motion.base_speed,
                cap: self.motion.speed_cap,
            });
        }
        ensure_range("motion.slow_factor", self.motion.slow_factor, 0.0, 1.0)?;
        ensure_range(
            "spawn.collectible_chance",
            self.spawn.collectible_chance,
            0.0,
            1.0,
        )?;
        ensure_range(
            "spawn.obstacle_chance",
            self.spawn.obstacle_chance,
            0.0,
            1.0,
        )?;

        if self.spawn.obstacle_period_floor_ms > self.spawn.obstacle_period_ms {
            return Err(RunConfigError::ObstacleFloorAboveBase {
                floor: self.spawn.obstacle_period_floor_ms,
                base: self.spawn.obstacle_period_ms,
            });
        }

        let track = &self.track;
        let ordered = track.spawn_position < track.band_min
            && track.band_min < track.band_max
            && track.band_min < track.collision_limit
            && track.collision_limit <= track.exit_position
            && track.band_max <= track.exit_position;
        if !ordered {
            return Err(RunConfigError::TrackGeometry {
                spawn: track.spawn_position,
                band_min: track.band_min,
                band_max: track.band_max,
                limit: track.collision_limit,
                exit: track.exit_position,
            });
        }

        Ok(())
    }

    #[must_use]
    pub const fn clock_period(&self) -> Duration {
        Duration::from_millis(self.session.clock_period_ms)
    }

    #[must_use]
    pub const fn motion_period(&self) -> Duration {
        Duration::from_millis(self.motion.tick_ms)
    }

    #[must_use]
    pub const fn collectible_period(&self) -> Duration {
        Duration::from_millis(self.spawn.collectible_period_ms)
    }

    /// Obstacle spawn period for the given elapsed session time.
    #[must_use]
    pub fn obstacle_period(&self, elapsed_secs: u32) -> Duration {
        let spawn = &self.spawn;
        let shave = u64::from(elapsed_secs).saturating_mul(spawn.obstacle_ramp_ms_per_sec);
        let period = spawn
            .obstacle_period_ms
            .saturating_sub(shave)
            .max(spawn.obstacle_period_floor_ms);
        Duration::from_millis(period)
    }

    #[must_use]
    pub const fn slow_duration(&self) -> Duration {
        Duration::from_millis(self.motion.slow_duration_ms)
    }

    #[must_use]
    pub const fn pulse_ttl(&self) -> Duration {
        Duration::from_millis(self.effects.pulse_ttl_ms)
    }
}

fn ensure_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), RunConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(RunConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(RunConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = RunConfig::from_json(r#"{ "session": { "duration_secs": 30 } }"#).unwrap();
        assert_eq!(cfg.session.duration_secs, 30);
        assert_eq!(cfg.session.clock_period_ms, 1_000);
        assert_eq!(cfg.motion, MotionCfg::default());
    }

    #[test]
    fn obstacle_period_shrinks_then_floors() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.obstacle_period(0), Duration::from_millis(2_000));
        assert_eq!(cfg.obstacle_period(40), Duration::from_millis(1_600));
        assert_eq!(cfg.obstacle_period(100), Duration::from_millis(1_000));
        assert_eq!(cfg.obstacle_period(119), Duration::from_millis(1_000));
    }

    #[test]
    fn band_bounds_are_exclusive() {
        let track = TrackCfg::default();
        assert!(!track.in_band(65.0));
        assert!(track.in_band(65.5));
        assert!(track.in_band(84.9));
        assert!(!track.in_band(85.0));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut cfg = RunConfig::default();
        cfg.motion.tick_ms = 0;
        assert_eq!(
            cfg.validate(),
            Err(RunConfigError::ZeroValue {
                field: "motion.tick_ms"
            })
        );

        let mut cfg = RunConfig::default();
        cfg.spawn.obstacle_chance = 1.5;
        assert!(matches!(
            cfg.validate(),
            Err(RunConfigError::RangeViolation {
                field: "spawn.obstacle_chance",
                ..
            })
        ));

        let mut cfg = RunConfig::default();
        cfg.motion.speed_cap = 1.0;
        assert!(matches!(
            cfg.validate(),
            Err(RunConfigError::SpeedCapBelowBase { .. })
        ));

        let mut cfg = RunConfig::default();
        cfg.track.band_min = 90.0;
        assert!(matches!(
            cfg.validate(),
            Err(RunConfigError::TrackGeometry { .. })
        ));

        let mut cfg = RunConfig::default();
        cfg.spawn.obstacle_period_floor_ms = 5_000;
        assert!(matches!(
            cfg.validate(),
            Err(RunConfigError::ObstacleFloorAboveBase { .. })
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            RunConfig::from_json("{ not json"),
            Err(RunConfigError::Parse(_))
        ));
    }
}
