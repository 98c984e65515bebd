//! Centralized balance and tuning constants for Commute Run.
//!
//! These values are the defaults behind [`crate::config::RunConfig`]. Hosts
//! may override them through configuration, but the catalog payloads below
//! are fixed and only change through reviewed code.

// Logging targets -----------------------------------------------------------
pub(crate) const LOG_TARGET_SESSION: &str = "commute_run::session";
pub(crate) const LOG_TARGET_COLLISION: &str = "commute_run::collision";
pub(crate) const LOG_TARGET_CONFIG: &str = "commute_run::config";

// Session clock -------------------------------------------------------------
pub(crate) const SESSION_DURATION_SECS: u32 = 120;
pub(crate) const SESSION_CLOCK_PERIOD_MS: u64 = 1_000;

// Motion --------------------------------------------------------------------
pub(crate) const MOTION_TICK_MS: u64 = 50;
pub(crate) const BASE_SPEED: f32 = 3.0;
pub(crate) const SPEED_CAP: f32 = 8.0;
pub(crate) const SPEED_RAMP_SECS_PER_UNIT: f32 = 30.0;
pub(crate) const SLOW_FACTOR: f32 = 0.5;
pub(crate) const SLOW_DURATION_MS: u64 = 2_000;

// Track geometry (percent of the visible track height) ----------------------
pub(crate) const SPAWN_POSITION: f32 = -50.0;
pub(crate) const COLLISION_BAND_MIN: f32 = 65.0;
pub(crate) const COLLISION_BAND_MAX: f32 = 85.0;
pub(crate) const COLLISION_LIMIT: f32 = 90.0;
pub(crate) const EXIT_POSITION: f32 = 110.0;
pub(crate) const REMOVED_POSITION: f32 = 1_000.0;

// Spawning ------------------------------------------------------------------
pub(crate) const COLLECTIBLE_PERIOD_MS: u64 = 1_500;
pub(crate) const COLLECTIBLE_CHANCE: f32 = 0.7;
pub(crate) const OBSTACLE_PERIOD_MS: u64 = 2_000;
pub(crate) const OBSTACLE_PERIOD_FLOOR_MS: u64 = 1_000;
pub(crate) const OBSTACLE_RAMP_MS_PER_SEC: u64 = 10;
pub(crate) const OBSTACLE_CHANCE: f32 = 0.5;

// Effects -------------------------------------------------------------------
pub(crate) const PULSE_TTL_MS: u64 = 500;

// Scoring -------------------------------------------------------------------
pub(crate) const ECO_MIN: u32 = 0;
pub(crate) const ECO_MAX: u32 = 100;
pub(crate) const MONEY_PER_POINT: f64 = 0.5;
pub(crate) const POLLUTION_PER_ECO: f64 = 2.0;
pub(crate) const DISTANCE_PER_SECOND: f64 = 0.5;

// Catalog payloads ----------------------------------------------------------
pub(crate) const SOLAR_SCORE: i32 = 10;
pub(crate) const SOLAR_ECO: i32 = 5;
pub(crate) const BATTERY_SCORE: i32 = 7;
pub(crate) const BATTERY_ECO: i32 = 3;
pub(crate) const LEAF_SCORE: i32 = 5;
pub(crate) const LEAF_ECO: i32 = 2;
pub(crate) const FUEL_SCORE: i32 = -10;
pub(crate) const FUEL_ECO: i32 = -3;

// Player --------------------------------------------------------------------
pub(crate) const LANE_COUNT: u8 = 3;
pub(crate) const START_LANE: u8 = 1;
