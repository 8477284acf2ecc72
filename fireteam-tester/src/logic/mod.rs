pub mod playability;
pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;

pub use playability::{
    PlayabilityAggregate, aggregate_playability, run_playability_analysis,
    validate_playability_targets,
};
pub use policy::GameplayStrategy;
pub use seeds::resolve_seed_inputs;
pub use simulation::RunRecord;
