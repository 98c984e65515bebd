//! Commute Run Game Engine
//!
//! Platform-agnostic simulation core for Commute Run, a three-lane eco runner.
//! This crate owns the session clock, spawning, motion, collisions and scoring
//! without any rendering, wall clock or I/O; hosts feed it elapsed time and
//! lane input and read back serializable snapshots.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod effects;
pub mod entity;
pub mod motion;
pub mod numbers;
pub mod rng;
pub mod scheduler;
pub mod scoring;
pub mod session;
pub mod spawner;
pub mod state;

// Re-export commonly used types
pub use catalog::{CollectibleKind, EntityKind, ObstacleKind, Payload, Rgb};
pub use config::{EffectsCfg, MotionCfg, RunConfig, RunConfigError, SessionCfg, SpawnCfg, TrackCfg};
pub use effects::{EffectPulse, PulseId, PulseKind, PulseSet};
pub use entity::{Entity, EntityId, Lane};
pub use rng::{SpawnRng, derive_stream_seed};
pub use scheduler::{Scheduler, TimerId};
pub use scoring::{AnalyticsRecord, DerivedMetrics, RunExport, Scoreboard};
pub use session::RunSimulator;
pub use state::{CollisionEvent, Input, Phase, RunState, SpawnEvent, TickReport};
