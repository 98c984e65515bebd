use std::fmt;

use commute_run_game::{Entity, Input, Lane, RunState};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// How far above the collision band a policy starts reacting to an entity.
const LOOKAHEAD: f32 = 45.0;

/// Policy interface for automated play.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pick a lane change for the next host frame, if any.
    fn decide(&mut self, state: &RunState) -> Option<Input>;
}

/// Built-in autopilot strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AutopilotStrategy {
    Idle,
    Collector,
    Dodger,
    Random,
}

impl AutopilotStrategy {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            AutopilotStrategy::Idle => "Idle",
            AutopilotStrategy::Collector => "Collector",
            AutopilotStrategy::Dodger => "Dodger",
            AutopilotStrategy::Random => "Random",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            AutopilotStrategy::Idle => Box::new(IdlePolicy),
            AutopilotStrategy::Collector => Box::new(CollectorPolicy),
            AutopilotStrategy::Dodger => Box::new(DodgerPolicy),
            AutopilotStrategy::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for AutopilotStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct IdlePolicy;
struct CollectorPolicy;
struct DodgerPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
    move_chance: f64,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            move_chance: 0.1,
        }
    }
}

impl PlayerPolicy for IdlePolicy {
    fn name(&self) -> &'static str {
        "Idle"
    }

    fn decide(&mut self, _state: &RunState) -> Option<Input> {
        None
    }
}

impl PlayerPolicy for CollectorPolicy {
    fn name(&self) -> &'static str {
        "Collector"
    }

    fn decide(&mut self, state: &RunState) -> Option<Input> {
        // The collectible closest to the band wins.
        let target = approaching(state)
            .filter(|entity| !entity.kind.is_obstacle())
            .max_by(|a, b| a.position.total_cmp(&b.position))?;
        steer_toward(state.player_lane(), target.lane)
    }
}

impl PlayerPolicy for DodgerPolicy {
    fn name(&self) -> &'static str {
        "Dodger"
    }

    fn decide(&mut self, state: &RunState) -> Option<Input> {
        let current = state.player_lane();
        let threatened = |lane: Lane| {
            approaching(state).any(|entity| entity.kind.is_obstacle() && entity.lane == lane)
        };
        if !threatened(current) {
            return None;
        }

        // Prefer the escape that keeps the most options open.
        let escape = Lane::ALL
            .into_iter()
            .filter(|lane| current.distance(*lane) == 1 && !threatened(*lane))
            .min_by_key(|lane| lane.distance(Lane::MIDDLE))?;
        steer_toward(current, escape)
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn decide(&mut self, _state: &RunState) -> Option<Input> {
        if !self.rng.gen_bool(self.move_chance) {
            return None;
        }
        if self.rng.gen_bool(0.5) {
            Some(Input::MoveLeft)
        } else {
            Some(Input::MoveRight)
        }
    }
}

/// Entities that will reach the collision band soon and have not been consumed.
fn approaching(state: &RunState) -> impl Iterator<Item = &Entity> {
    let track = &state.config().track;
    let lower = track.band_min - LOOKAHEAD;
    let upper = track.band_max;
    state
        .entities()
        .iter()
        .filter(move |entity| entity.position >= lower && entity.position < upper)
}

fn steer_toward(current: Lane, target: Lane) -> Option<Input> {
    match target.cmp(&current) {
        std::cmp::Ordering::Less => Some(Input::MoveLeft),
        std::cmp::Ordering::Greater => Some(Input::MoveRight),
        std::cmp::Ordering::Equal => None,
    }
}
