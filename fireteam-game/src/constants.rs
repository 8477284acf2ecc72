//! Centralized balance and tuning constants for Fireteam game logic.
//!
//! These values define the deterministic math for the core simulation.
//! Keeping them together ensures that gameplay can only be adjusted via
//! code changes reviewed in version control.

// Player -------------------------------------------------------------------
pub const MAX_HP: u8 = 3;

// Mission loop -------------------------------------------------------------
pub const DEFAULT_MISSION_QUOTA: u32 = 3;
pub const MIN_MISSION_QUOTA: u32 = 1;
pub const MAX_MISSION_QUOTA: u32 = 10;
pub(crate) const MEDIC_REST_HEAL_PCT: i32 = 30;

// Combat -------------------------------------------------------------------
/// Fixed instant-death probability, rolled once at the start of every encounter.
pub const HEADSHOT_PCT: i32 = 10;
pub const MAX_COMBAT_TURNS: u32 = 12;
pub(crate) const BASE_HIT_PCT: i32 = 50;
pub(crate) const HIT_PCT_PER_DIFFICULTY: i32 = 5;
pub(crate) const MIN_ROLL_PCT: i32 = 5;
pub(crate) const MAX_ROLL_PCT: i32 = 95;
pub(crate) const AIM_LEFT_MOD: i32 = -5;
pub(crate) const AIM_CENTER_MOD: i32 = 5;
pub(crate) const AIM_RIGHT_MOD: i32 = -2;
pub(crate) const COVER_RETURN_FIRE_PENALTY: i32 = 20;
pub(crate) const COVER_ENEMY_PENALTY: i32 = 25;
pub(crate) const UPGRADED_DOUBLE_TAP_PCT: i32 = 40;
pub(crate) const ENEMY_BASE_ACCURACY: i32 = 40;
pub(crate) const ENEMY_ACCURACY_PER_DIFFICULTY: i32 = 15;
pub(crate) const RETREAT_BASE_PCT: i32 = 30;
pub(crate) const RETREAT_PCT_PER_DIFFICULTY: i32 = 5;
pub(crate) const RETREAT_CRIT_BASE_PCT: i32 = 10;
pub(crate) const RETREAT_CRIT_PER_DIFFICULTY: i32 = 10;

// Role abilities -----------------------------------------------------------
pub(crate) const STEADY_DODGE_PCT: i32 = 20;
pub(crate) const MARKSMAN_ENEMY_PENALTY: i32 = 10;
pub(crate) const FIELD_MEDIC_TURN_HEAL_PCT: i32 = 25;
pub(crate) const DISARM_PCT: i32 = 70;
pub(crate) const FORESIGHT_DIFFICULTY_RELIEF: u8 = 1;
pub(crate) const FORESIGHT_RETREAT_BONUS: i32 = 25;

// Item boosts --------------------------------------------------------------
pub(crate) const AMMO_HIT_BONUS: i32 = 10;
pub(crate) const CAMOUFLAGE_ENEMY_PENALTY: i32 = 15;

// Extraction ---------------------------------------------------------------
pub(crate) const EXTRACTION_BASE_PCT: i32 = 35;
pub(crate) const EXTRACTION_PER_HP: i32 = 10;
pub(crate) const EXTRACTION_PER_MISSION: i32 = 5;
pub(crate) const EXTRACTION_MIN_PCT: i32 = 10;
pub(crate) const EXTRACTION_MAX_PCT: i32 = 90;
