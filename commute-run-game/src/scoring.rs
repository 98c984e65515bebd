//! Score, eco gauge, analytics counters and end-of-run metrics.
use serde::{Deserialize, Serialize};

use crate::catalog::{CollectibleKind, EntityKind, Payload};
use crate::constants::{DISTANCE_PER_SECOND, ECO_MAX, ECO_MIN, MONEY_PER_POINT, POLLUTION_PER_ECO};
use crate::numbers::round_f64_to_u32;

/// Running score (floored at zero) and eco gauge (clamped to 0..=100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "ScoreboardFields")]
pub struct Scoreboard {
    pub score: u32,
    pub eco: u32,
}

#[derive(Deserialize)]
struct ScoreboardFields {
    score: u32,
    eco: u32,
}

impl TryFrom<ScoreboardFields> for Scoreboard {
    type Error = String;

    fn try_from(value: ScoreboardFields) -> Result<Self, Self::Error> {
        if (ECO_MIN..=ECO_MAX).contains(&value.eco) {
            Ok(Self {
                score: value.score,
                eco: value.eco,
            })
        } else {
            Err(format!("eco {} out of range {ECO_MIN}..={ECO_MAX}", value.eco))
        }
    }
}

impl Scoreboard {
    pub fn apply(&mut self, payload: Payload) {
        self.score = self.score.saturating_add_signed(payload.score);
        self.eco = self
            .eco
            .saturating_add_signed(payload.eco)
            .clamp(ECO_MIN, ECO_MAX);
    }
}

/// Cumulative counters for one session, sealed once the session finishes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    pub total_play_time_secs: u32,
    pub final_score: u32,
    pub solar_pickups: u32,
    pub battery_pickups: u32,
    pub leaf_pickups: u32,
    pub obstacle_hits: u32,
    pub explore_clicked: bool,
    pub started_at_ms: u64,
    pub ended_at_ms: Option<u64>,
}

impl AnalyticsRecord {
    #[must_use]
    pub fn started(started_at_ms: u64) -> Self {
        Self {
            started_at_ms,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        self.ended_at_ms.is_some()
    }

    /// Count a collision. Ignored once the record is sealed.
    pub fn record_collision(&mut self, kind: EntityKind) {
        if self.is_finalized() {
            return;
        }
        let counter = match kind {
            EntityKind::Collectible(CollectibleKind::Solar) => &mut self.solar_pickups,
            EntityKind::Collectible(CollectibleKind::Battery) => &mut self.battery_pickups,
            EntityKind::Collectible(CollectibleKind::Leaf) => &mut self.leaf_pickups,
            EntityKind::Obstacle(_) => &mut self.obstacle_hits,
        };
        *counter = counter.saturating_add(1);
    }

    /// Seal the record. Returns `false` without touching anything when the
    /// record was already sealed.
    pub fn finalize(&mut self, play_time_secs: u32, final_score: u32, ended_at_ms: u64) -> bool {
        if self.is_finalized() {
            return false;
        }
        self.total_play_time_secs = play_time_secs;
        self.final_score = final_score;
        self.ended_at_ms = Some(ended_at_ms);
        true
    }

    #[must_use]
    pub const fn pickups(&self) -> u32 {
        self.solar_pickups
            .saturating_add(self.battery_pickups)
            .saturating_add(self.leaf_pickups)
    }
}

/// Metrics shown on the summary screen, derived from the final state only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub money_saved: u32,
    pub pollution_avoided: u32,
    pub distance_covered: u32,
}

impl DerivedMetrics {
    #[must_use]
    pub fn compute(score: u32, eco: u32, elapsed_secs: u32) -> Self {
        Self {
            money_saved: round_f64_to_u32(f64::from(score) * MONEY_PER_POINT),
            pollution_avoided: round_f64_to_u32(f64::from(eco) * POLLUTION_PER_ECO),
            distance_covered: round_f64_to_u32(f64::from(elapsed_secs) * DISTANCE_PER_SECOND),
        }
    }
}

/// Flat record handed to export collaborators once a run finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunExport {
    pub seed: u64,
    pub total_play_time_secs: u32,
    pub final_score: u32,
    pub final_eco: u32,
    pub solar_pickups: u32,
    pub battery_pickups: u32,
    pub leaf_pickups: u32,
    pub obstacle_hits: u32,
    pub explore_clicked: bool,
    pub money_saved: u32,
    pub pollution_avoided: u32,
    pub distance_covered: u32,
    pub started_at_ms: u64,
    pub ended_at_ms: u64,
}

impl RunExport {
    /// Build the export from a sealed record; `None` while the run is open.
    #[must_use]
    pub fn from_record(
        seed: u64,
        record: &AnalyticsRecord,
        metrics: DerivedMetrics,
        eco: u32,
    ) -> Option<Self> {
        let ended_at_ms = record.ended_at_ms?;
        Some(Self {
            seed,
            total_play_time_secs: record.total_play_time_secs,
            final_score: record.final_score,
            final_eco: eco,
            solar_pickups: record.solar_pickups,
            battery_pickups: record.battery_pickups,
            leaf_pickups: record.leaf_pickups,
            obstacle_hits: record.obstacle_hits,
            explore_clicked: record.explore_clicked,
            money_saved: metrics.money_saved,
            pollution_avoided: metrics.pollution_avoided,
            distance_covered: metrics.distance_covered,
            started_at_ms: record.started_at_ms,
            ended_at_ms,
        })
    }
}
