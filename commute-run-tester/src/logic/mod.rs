pub mod game_tester;
pub mod policy;
pub mod reports;
pub mod scenarios;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use game_tester::GameTester;
pub use scenarios::{ALL_SCENARIOS, get_scenario, list_scenarios};
pub use seeds::resolve_seed_inputs;
pub use tester::*;
