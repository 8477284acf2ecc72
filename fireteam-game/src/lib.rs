//! Fireteam Game Engine
//!
//! Platform-agnostic core for a turn-based military survival game: role
//! selection, a mission loop of probabilistic encounters, loot, and a final
//! extraction roll. This crate holds every game rule and no I/O.

pub mod combat;
pub mod config;
pub mod constants;
pub mod dice;
pub mod error;
pub mod extraction;
pub mod inventory;
pub mod items;
pub mod missions;
pub mod result;
pub mod rng;
pub mod roles;
pub mod runner;
pub mod seed;
pub mod state;

// Re-export commonly used types
pub use combat::{
    Aim, CombatResolver, CombatTurn, Encounter, EncounterOutcome, EncounterReport, EnemyFire,
    Opening, PlayerAction, Tactic,
};
pub use config::{RunConfig, RunConfigError};
pub use dice::{Dice, ScriptedDice};
pub use error::GameError;
pub use extraction::{Ending, ExtractionEngine};
pub use inventory::{InventoryLedger, ItemEffect, LootGrant};
pub use items::ItemId;
pub use missions::{LootEntry, Mission, MissionCatalog, MissionId, MissionKind};
pub use result::{RunStatus, RunSummary};
pub use rng::{CountingRng, RngBundle, RollSource, Stream};
pub use roles::{Ability, Role, RoleCatalog, RoleId};
pub use runner::{
    Decision, EncounterResolution, PhaseSignal, RunEvent, RunHandle, RunPhase, advance,
    current_state, start_run, start_run_with,
};
pub use seed::{decode_callsign, encode_callsign, parse_seed};
pub use state::{AbilityCharges, DamageTier, EncounterBoosts, Inventory, PlayerState};
