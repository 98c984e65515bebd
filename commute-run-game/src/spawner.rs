//! Periodic spawning of collectibles and obstacles.
use rand::Rng;
use rand::seq::SliceRandom;

use crate::catalog::{CollectibleKind, EntityKind, ObstacleKind};
use crate::config::RunConfig;
use crate::entity::{Entity, EntityId, Lane};

/// Which spawn timer is firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnClass {
    Collectible,
    Obstacle,
}

/// Roll the spawn chance and, on success, pick a kind and lane uniformly.
///
/// The id is only claimed from `next_id` when an entity is produced.
pub fn roll_spawn<R: Rng>(
    class: SpawnClass,
    cfg: &RunConfig,
    rng: &mut R,
    next_id: &mut u64,
) -> Option<Entity> {
    let chance = match class {
        SpawnClass::Collectible => cfg.spawn.collectible_chance,
        SpawnClass::Obstacle => cfg.spawn.obstacle_chance,
    };
    if rng.r#gen::<f32>() >= chance {
        return None;
    }

    let kind = match class {
        SpawnClass::Collectible => {
            EntityKind::Collectible(*CollectibleKind::ALL.choose(rng)?)
        }
        SpawnClass::Obstacle => EntityKind::Obstacle(*ObstacleKind::ALL.choose(rng)?),
    };
    let lane = *Lane::ALL.choose(rng)?;

    let id = EntityId(*next_id);
    *next_id = next_id.saturating_add(1);
    Some(Entity::new(id, kind, lane, cfg.track.spawn_position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::collections::HashSet;

    #[test]
    fn certain_spawns_always_produce_entities_above_the_track() {
        let mut cfg = RunConfig::default();
        cfg.spawn.collectible_chance = 1.0;
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let mut next_id = 0;

        let mut ids = HashSet::new();
        for _ in 0..50 {
            let entity = roll_spawn(SpawnClass::Collectible, &cfg, &mut rng, &mut next_id)
                .expect("chance 1.0 always spawns");
            assert!(!entity.kind.is_obstacle());
            assert!((entity.position - cfg.track.spawn_position).abs() < f32::EPSILON);
            assert!(ids.insert(entity.id));
        }
        assert_eq!(next_id, 50);
    }

    #[test]
    fn zero_chance_never_spawns_or_claims_ids() {
        let mut cfg = RunConfig::default();
        cfg.spawn.obstacle_chance = 0.0;
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let mut next_id = 7;
        for _ in 0..50 {
            assert!(roll_spawn(SpawnClass::Obstacle, &cfg, &mut rng, &mut next_id).is_none());
        }
        assert_eq!(next_id, 7);
    }

    #[test]
    fn every_kind_and_lane_eventually_appears() {
        let mut cfg = RunConfig::default();
        cfg.spawn.obstacle_chance = 1.0;
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let mut next_id = 0;
        let mut kinds = HashSet::new();
        let mut lanes = HashSet::new();
        for _ in 0..200 {
            if let Some(entity) = roll_spawn(SpawnClass::Obstacle, &cfg, &mut rng, &mut next_id) {
                kinds.insert(entity.kind);
                lanes.insert(entity.lane);
            }
        }
        assert_eq!(kinds.len(), ObstacleKind::ALL.len());
        assert_eq!(lanes.len(), Lane::ALL.len());
    }

    #[test]
    fn observed_rate_tracks_configured_chance() {
        let cfg = RunConfig::default();
        let mut rng = ChaCha20Rng::seed_from_u64(21);
        let mut next_id = 0;
        let spawned = (0..2_000)
            .filter_map(|_| roll_spawn(SpawnClass::Collectible, &cfg, &mut rng, &mut next_id))
            .count();
        // 70% of 2000 with a generous tolerance.
        assert!((1_250..=1_550).contains(&spawned), "spawned {spawned}");
    }
}
