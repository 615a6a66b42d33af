//! Centralized balance and tuning constants for the pilot progression engine.
//!
//! Every tunable in [`crate::config::ProgressionConfig`] defaults to a value
//! from this file.

// Storage ------------------------------------------------------------------
/// Key under which the profile JSON document is persisted.
pub const PROFILE_STORAGE_KEY: &str = "astro_pilot_profile";
/// Name of the change notification broadcast after a persist.
pub const PROFILE_UPDATE_EVENT: &str = "astro:profile-update";
/// Prefix of exported profile file names.
pub const EXPORT_FILE_PREFIX: &str = "astro_pilot_profile_";

// Leveling -----------------------------------------------------------------
pub const LEVEL_DIVISOR: u64 = 25;

/// Ascending `(minimum level, title)` rank table.
pub const RANK_TITLES: [(u32, &str); 9] = [
    (1, "Cadet"),
    (5, "Navigator"),
    (10, "Explorer"),
    (15, "Pathfinder"),
    (20, "Commander"),
    (30, "Ace Pilot"),
    (50, "Fleet Captain"),
    (75, "Admiral"),
    (100, "Legendary"),
];
pub const DEFAULT_RANK: &str = "Cadet";

// Fuel ---------------------------------------------------------------------
pub const FUEL_MAX: u32 = 100;
pub const FUEL_REGEN_RATE: u32 = 1;
pub const FUEL_REGEN_INTERVAL_MS: i64 = 60 * 1000;
pub const FUEL_BREAK_COOLDOWN_MS: i64 = 10 * 60 * 1000;
pub const FUEL_BREAK_GAIN: u32 = 25;
pub const DAILY_REFUEL_TARGET: u32 = 100;
pub const REFUEL_COST: u64 = 25;
pub const REFUEL_GAIN: u32 = 25;
pub const SIMULATION_FUEL_COST: u32 = 5;
pub const SUB_MISSION_FUEL_REFILL: u32 = 5;

// Streaks ------------------------------------------------------------------
pub const STREAK_DAY_MS: i64 = 24 * 60 * 60 * 1000;
pub const STREAK_BASE_REWARD: u64 = 10;
/// Exact-streak milestone rewards.
pub const STREAK_MILESTONE_REWARDS: [(u32, u64); 4] = [(30, 250), (14, 100), (7, 50), (3, 25)];
/// Minimum-streak multiplier tiers, highest first.
pub const STREAK_MULTIPLIERS: [(u32, f64); 4] = [(30, 2.0), (14, 1.5), (7, 1.25), (3, 1.1)];

// Registration & rewards ---------------------------------------------------
pub const INITIAL_STARDUST: u64 = 50;
pub const INITIAL_BADGE: &str = "identity-verified";
pub const SIMULATION_STARDUST_REWARD: u64 = 5;
pub const ORIENTATION_MISSION_ID: &str = "mission-00";
pub const ORIENTATION_STARDUST_REWARD: u64 = 5;
pub const MISSION_COMPLETION_REWARD: u64 = 50;
pub const DEFAULT_THEME: &str = "default";
pub const DEFAULT_PREFIX: &str = "PILOT";
pub const DEFAULT_CALLSIGN: &str = "PILOT";
pub const GUEST_CALLSIGN: &str = "GUEST";

/// Stardust thresholds that unlock milestone badges.
pub const MILESTONE_BADGES: [(u64, &str); 6] = [
    (100, "rising-star"),
    (500, "cosmic-navigator"),
    (1_000, "query-master"),
    (2_500, "stellar-analyst"),
    (5_000, "legend-of-nebula"),
    (10_000, "astro-elite"),
];

// Migration ----------------------------------------------------------------
pub const LEGACY_DEFAULT_FUEL: u32 = 85;
pub const LEGACY_DEFAULT_STARDUST: u64 = 0;
