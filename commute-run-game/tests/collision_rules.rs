use commute_run_game::{
    CollectibleKind, EntityKind, Lane, ObstacleKind, PulseKind, RunConfig, RunSimulator,
};
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(50);

fn quiet_simulator() -> RunSimulator {
    let mut cfg = RunConfig::from_json(include_str!("../../data/run-config.json")).unwrap();
    cfg.spawn.collectible_chance = 0.0;
    cfg.spawn.obstacle_chance = 0.0;
    let mut sim = RunSimulator::new(99, cfg);
    assert!(sim.start(0));
    sim
}

fn place(sim: &mut RunSimulator, kind: EntityKind, lane: Lane, position: f32) {
    sim.with_state_mut(|state| state.place_entity(kind, lane, position))
        .expect("placement while running");
}

#[test]
fn solar_pickup_scores_glows_and_disappears() {
    let mut sim = quiet_simulator();
    place(
        &mut sim,
        EntityKind::Collectible(CollectibleKind::Solar),
        Lane::MIDDLE,
        63.0,
    );

    let report = sim.advance(FRAME);
    let state = sim.state();
    assert_eq!(report.collisions.len(), 1);
    assert_eq!(state.score(), 10);
    assert_eq!(state.eco(), 5);
    assert_eq!(state.pulses().len(), 1);
    assert_eq!(state.pulses().active()[0].kind, PulseKind::Glow);
    assert_eq!(state.pulses().active()[0].color.to_string(), "#fbbf24");
    assert!(state.entities().is_empty());
    assert_eq!(state.analytics().solar_pickups, 1);
}

#[test]
fn fuel_at_zero_score_stays_at_zero() {
    let mut sim = quiet_simulator();
    place(
        &mut sim,
        EntityKind::Obstacle(ObstacleKind::Fuel),
        Lane::MIDDLE,
        63.0,
    );

    sim.advance(FRAME);
    let state = sim.state();
    assert_eq!(state.score(), 0);
    assert_eq!(state.eco(), 0);
    assert!(state.pulses().contains(PulseKind::Hit));
    assert_eq!(state.analytics().obstacle_hits, 1);
}

#[test]
fn smoke_halves_speed_for_exactly_two_seconds() {
    let mut sim = quiet_simulator();
    place(
        &mut sim,
        EntityKind::Obstacle(ObstacleKind::Smoke),
        Lane::MIDDLE,
        63.0,
    );
    sim.advance(FRAME);
    assert_eq!(sim.state().slow_until(), Some(Duration::from_millis(2_050)));
    assert!(sim.state().pulses().contains(PulseKind::Slow));
    assert_eq!(sim.state().score(), 0);

    place(
        &mut sim,
        EntityKind::Collectible(CollectibleKind::Leaf),
        Lane::LEFT,
        -40.0,
    );
    let position = |sim: &RunSimulator| sim.state().entities()[0].position;

    let before = position(&sim);
    let nominal = sim.state().speed();
    sim.advance(FRAME);
    assert!((position(&sim) - before - nominal * 0.5).abs() < 1e-4);

    sim.advance(Duration::from_millis(1_900));
    assert_eq!(sim.state().now(), Duration::from_millis(2_000));
    assert!(sim.state().is_slowed());

    let before = position(&sim);
    let nominal = sim.state().speed();
    sim.advance(FRAME);
    assert!(!sim.state().is_slowed());
    assert!(sim.state().slow_until().is_none());
    assert!((position(&sim) - before - nominal).abs() < 1e-4);
}

#[test]
fn band_edges_are_exclusive() {
    let mut sim = quiet_simulator();
    // 62 + 3 lands exactly on the lower edge.
    place(
        &mut sim,
        EntityKind::Collectible(CollectibleKind::Leaf),
        Lane::MIDDLE,
        62.0,
    );
    assert!(sim.advance(FRAME).collisions.is_empty());
    assert_eq!(sim.advance(FRAME).collisions.len(), 1);
    assert_eq!(sim.state().score(), 5);
}

#[test]
fn other_lanes_pass_untouched() {
    let mut sim = quiet_simulator();
    place(
        &mut sim,
        EntityKind::Collectible(CollectibleKind::Solar),
        Lane::LEFT,
        63.0,
    );
    place(
        &mut sim,
        EntityKind::Obstacle(ObstacleKind::Fuel),
        Lane::RIGHT,
        63.0,
    );
    for _ in 0..20 {
        assert!(sim.advance(FRAME).collisions.is_empty());
    }
    assert_eq!(sim.state().score(), 0);
    // Both have scrolled past the exit by now.
    assert!(sim.state().entities().is_empty());
}

#[test]
fn each_entity_pays_out_once() {
    let mut sim = quiet_simulator();
    let battery = EntityKind::Collectible(CollectibleKind::Battery);
    place(&mut sim, battery, Lane::MIDDLE, 63.0);
    place(&mut sim, battery, Lane::MIDDLE, 70.0);

    let report = sim.advance(FRAME);
    assert_eq!(report.collisions.len(), 2);
    let mut later = 0;
    for _ in 0..10 {
        later += sim.advance(FRAME).collisions.len();
    }
    assert_eq!(later, 0);
    assert_eq!(sim.state().score(), 14);
    assert_eq!(sim.state().eco(), 6);
    assert_eq!(sim.state().analytics().battery_pickups, 2);
    // Overlapping pulses are kept side by side.
    assert_eq!(report.collisions[0].pulse.0 + 1, report.collisions[1].pulse.0);
}

#[test]
fn eco_gauge_never_exceeds_one_hundred() {
    let mut sim = quiet_simulator();
    for _ in 0..25 {
        place(
            &mut sim,
            EntityKind::Collectible(CollectibleKind::Solar),
            Lane::MIDDLE,
            63.0,
        );
        sim.advance(FRAME);
    }
    assert_eq!(sim.state().eco(), 100);
    assert_eq!(sim.state().score(), 250);
}
