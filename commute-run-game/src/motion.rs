//! Entity motion, speed ramp and collision detection against the player lane.
use smallvec::SmallVec;
use std::time::Duration;

use crate::catalog::EntityKind;
use crate::config::{MotionCfg, TrackCfg};
use crate::entity::{Entity, EntityId, Lane};
use crate::numbers::u32_to_f32;

/// Entity that entered the collision band in the player's lane this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    pub entity: EntityId,
    pub kind: EntityKind,
    pub lane: Lane,
    /// Position at the moment of impact, before the entity was consumed.
    pub position: f32,
}

pub type Impacts = SmallVec<[Impact; 4]>;

/// Speed the track settles on after a motion tick at `elapsed_secs`.
#[must_use]
pub fn nominal_speed(cfg: &MotionCfg, elapsed_secs: u32) -> f32 {
    let ramp = u32_to_f32(elapsed_secs) / cfg.ramp_secs_per_unit;
    (cfg.base_speed + ramp).min(cfg.speed_cap)
}

/// Speed applied to entities at `now`, halved (by default) inside a slow window.
#[must_use]
pub fn effective_speed(
    cfg: &MotionCfg,
    nominal: f32,
    slow_until: Option<Duration>,
    now: Duration,
) -> f32 {
    if slow_until.is_some_and(|until| now < until) {
        nominal * cfg.slow_factor
    } else {
        nominal
    }
}

pub fn advance_entities(entities: &mut [Entity], speed: f32) {
    for entity in entities {
        entity.position += speed;
    }
}

/// Consume every entity inside the collision band of `player_lane`.
///
/// Consumed entities are moved to the removed position, so a second call in
/// the same tick finds nothing.
pub fn collect_impacts(entities: &mut [Entity], player_lane: Lane, track: &TrackCfg) -> Impacts {
    let mut impacts = Impacts::new();
    for entity in entities
        .iter_mut()
        .filter(|entity| entity.lane == player_lane && track.in_band(entity.position))
    {
        impacts.push(Impact {
            entity: entity.id,
            kind: entity.kind,
            lane: entity.lane,
            position: entity.position,
        });
        entity.consume();
    }
    impacts
}

/// Drop entities that left the visible track or were consumed.
pub fn sweep_exited(entities: &mut Vec<Entity>, track: &TrackCfg) -> usize {
    let before = entities.len();
    entities.retain(|entity| entity.position < track.exit_position);
    before - entities.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CollectibleKind, ObstacleKind};

    fn entity(id: u64, kind: EntityKind, lane: Lane, position: f32) -> Entity {
        Entity::new(EntityId(id), kind, lane, position)
    }

    #[test]
    fn speed_ramps_and_caps() {
        let cfg = MotionCfg::default();
        assert!((nominal_speed(&cfg, 0) - 3.0).abs() < f32::EPSILON);
        assert!((nominal_speed(&cfg, 60) - 5.0).abs() < 1e-5);
        assert!((nominal_speed(&cfg, 150) - 8.0).abs() < f32::EPSILON);
        assert!((nominal_speed(&cfg, 600) - 8.0).abs() < f32::EPSILON);
    }

    #[test]
    fn slow_window_is_half_open() {
        let cfg = MotionCfg::default();
        let until = Some(Duration::from_millis(2_050));
        let slowed = effective_speed(&cfg, 4.0, until, Duration::from_millis(2_000));
        let restored = effective_speed(&cfg, 4.0, until, Duration::from_millis(2_050));
        assert!((slowed - 2.0).abs() < f32::EPSILON);
        assert!((restored - 4.0).abs() < f32::EPSILON);
        assert!((effective_speed(&cfg, 4.0, None, Duration::ZERO) - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn impacts_respect_band_edges_and_lane() {
        let track = TrackCfg::default();
        let solar = EntityKind::Collectible(CollectibleKind::Solar);
        let fuel = EntityKind::Obstacle(ObstacleKind::Fuel);
        let mut entities = vec![
            entity(0, solar, Lane::MIDDLE, 65.0),
            entity(1, solar, Lane::MIDDLE, 65.5),
            entity(2, fuel, Lane::MIDDLE, 84.9),
            entity(3, fuel, Lane::MIDDLE, 85.0),
            entity(4, solar, Lane::LEFT, 70.0),
        ];

        let impacts = collect_impacts(&mut entities, Lane::MIDDLE, &track);
        let ids: Vec<EntityId> = impacts.iter().map(|impact| impact.entity).collect();
        assert_eq!(ids, vec![EntityId(1), EntityId(2)]);
        assert!(collect_impacts(&mut entities, Lane::MIDDLE, &track).is_empty());

        assert_eq!(sweep_exited(&mut entities, &track), 2);
        assert_eq!(entities.len(), 3);
    }

    #[test]
    fn entities_leave_once_past_the_exit() {
        let track = TrackCfg::default();
        let leaf = EntityKind::Collectible(CollectibleKind::Leaf);
        let mut entities = vec![entity(0, leaf, Lane::LEFT, 107.0), entity(1, leaf, Lane::LEFT, 100.0)];
        advance_entities(&mut entities, 3.0);
        assert_eq!(sweep_exited(&mut entities, &track), 1);
        assert_eq!(entities[0].id, EntityId(1));
    }
}
