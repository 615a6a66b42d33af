//! Tunable progression configuration.
//!
//! Every field falls back to the matching value in [`crate::constants`], so a
//! partial JSON document only overrides what it names.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DAILY_REFUEL_TARGET, FUEL_BREAK_COOLDOWN_MS, FUEL_BREAK_GAIN, FUEL_MAX, FUEL_REGEN_INTERVAL_MS,
    FUEL_REGEN_RATE, INITIAL_STARDUST, LEVEL_DIVISOR, MILESTONE_BADGES, MISSION_COMPLETION_REWARD,
    ORIENTATION_MISSION_ID, ORIENTATION_STARDUST_REWARD, REFUEL_COST, REFUEL_GAIN, SIMULATION_FUEL_COST,
    SIMULATION_STARDUST_REWARD, STREAK_BASE_REWARD, STREAK_DAY_MS, STREAK_MILESTONE_REWARDS,
    STREAK_MULTIPLIERS, SUB_MISSION_FUEL_REFILL,
};

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: i64 },
    #[error("{field} must be at most {max} (got {value})")]
    AboveMax {
        field: &'static str,
        max: u32,
        value: u32,
    },
    #[error("streak multiplier for {min_streak}+ days must be finite and at least 1.0 (got {value})")]
    Multiplier { min_streak: u32, value: f64 },
    #[error("streak milestone {streak} is listed more than once")]
    DuplicateMilestone { streak: u32 },
}

/// Root configuration handed to every engine operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProgressionConfig {
    #[serde(default)]
    pub level: LevelConfig,
    #[serde(default)]
    pub fuel: FuelConfig,
    #[serde(default)]
    pub streak: StreakConfig,
    #[serde(default)]
    pub rewards: RewardConfig,
}

impl ProgressionConfig {
    /// Parse a (possibly partial) JSON document and validate the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the invariants the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.level.divisor == 0 {
            return Err(ConfigError::Zero {
                field: "level.divisor",
            });
        }
        self.fuel.validate()?;
        self.streak.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    #[serde(default = "LevelConfig::default_divisor")]
    pub divisor: u64,
}

impl LevelConfig {
    const fn default_divisor() -> u64 {
        LEVEL_DIVISOR
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            divisor: Self::default_divisor(),
        }
    }
}

/// Fuel regeneration, break and economy tunables. The tank cap itself is
/// fixed at [`FUEL_MAX`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelConfig {
    #[serde(default = "FuelConfig::default_regen_rate")]
    pub regen_rate: u32,
    #[serde(default = "FuelConfig::default_regen_interval_ms")]
    pub regen_interval_ms: i64,
    #[serde(default = "FuelConfig::default_break_cooldown_ms")]
    pub break_cooldown_ms: i64,
    #[serde(default = "FuelConfig::default_break_gain")]
    pub break_gain: u32,
    #[serde(default = "FuelConfig::default_daily_refuel_target")]
    pub daily_refuel_target: u32,
    #[serde(default = "FuelConfig::default_refuel_cost")]
    pub refuel_cost: u64,
    #[serde(default = "FuelConfig::default_refuel_gain")]
    pub refuel_gain: u32,
    #[serde(default = "FuelConfig::default_simulation_cost")]
    pub simulation_cost: u32,
    #[serde(default = "FuelConfig::default_sub_mission_refill")]
    pub sub_mission_refill: u32,
}

impl FuelConfig {
    const fn default_regen_rate() -> u32 {
        FUEL_REGEN_RATE
    }

    const fn default_regen_interval_ms() -> i64 {
        FUEL_REGEN_INTERVAL_MS
    }

    const fn default_break_cooldown_ms() -> i64 {
        FUEL_BREAK_COOLDOWN_MS
    }

    const fn default_break_gain() -> u32 {
        FUEL_BREAK_GAIN
    }

    const fn default_daily_refuel_target() -> u32 {
        DAILY_REFUEL_TARGET
    }

    const fn default_refuel_cost() -> u64 {
        REFUEL_COST
    }

    const fn default_refuel_gain() -> u32 {
        REFUEL_GAIN
    }

    const fn default_simulation_cost() -> u32 {
        SIMULATION_FUEL_COST
    }

    const fn default_sub_mission_refill() -> u32 {
        SUB_MISSION_FUEL_REFILL
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.regen_interval_ms <= 0 {
            return Err(ConfigError::Zero {
                field: "fuel.regen_interval_ms",
            });
        }
        if self.break_cooldown_ms < 0 {
            return Err(ConfigError::Negative {
                field: "fuel.break_cooldown_ms",
                value: self.break_cooldown_ms,
            });
        }
        for (field, value) in [
            ("fuel.daily_refuel_target", self.daily_refuel_target),
            ("fuel.simulation_cost", self.simulation_cost),
        ] {
            if value > FUEL_MAX {
                return Err(ConfigError::AboveMax {
                    field,
                    max: FUEL_MAX,
                    value,
                });
            }
        }
        Ok(())
    }
}

impl Default for FuelConfig {
    fn default() -> Self {
        Self {
            regen_rate: Self::default_regen_rate(),
            regen_interval_ms: Self::default_regen_interval_ms(),
            break_cooldown_ms: Self::default_break_cooldown_ms(),
            break_gain: Self::default_break_gain(),
            daily_refuel_target: Self::default_daily_refuel_target(),
            refuel_cost: Self::default_refuel_cost(),
            refuel_gain: Self::default_refuel_gain(),
            simulation_cost: Self::default_simulation_cost(),
            sub_mission_refill: Self::default_sub_mission_refill(),
        }
    }
}

/// Exact-streak reward row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakMilestone {
    pub streak: u32,
    pub reward: u64,
}

/// Minimum-streak multiplier row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiplierTier {
    pub min_streak: u32,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakConfig {
    #[serde(default = "StreakConfig::default_day_ms")]
    pub day_ms: i64,
    #[serde(default = "StreakConfig::default_base_reward")]
    pub base_reward: u64,
    #[serde(default = "StreakConfig::default_milestones")]
    pub milestones: Vec<StreakMilestone>,
    #[serde(default = "StreakConfig::default_multipliers")]
    pub multipliers: Vec<MultiplierTier>,
}

impl StreakConfig {
    const fn default_day_ms() -> i64 {
        STREAK_DAY_MS
    }

    const fn default_base_reward() -> u64 {
        STREAK_BASE_REWARD
    }

    fn default_milestones() -> Vec<StreakMilestone> {
        STREAK_MILESTONE_REWARDS
            .iter()
            .map(|&(streak, reward)| StreakMilestone { streak, reward })
            .collect()
    }

    fn default_multipliers() -> Vec<MultiplierTier> {
        STREAK_MULTIPLIERS
            .iter()
            .map(|&(min_streak, multiplier)| MultiplierTier {
                min_streak,
                multiplier,
            })
            .collect()
    }

    /// Reward for reaching exactly `streak` consecutive days.
    #[must_use]
    pub fn reward_for(&self, streak: u32) -> u64 {
        self.milestones
            .iter()
            .find(|row| row.streak == streak)
            .map_or(self.base_reward, |row| row.reward)
    }

    /// Multiplier of the highest tier whose minimum is met.
    #[must_use]
    pub fn multiplier_for(&self, streak: u32) -> f64 {
        self.multipliers
            .iter()
            .filter(|tier| streak >= tier.min_streak)
            .max_by_key(|tier| tier.min_streak)
            .map_or(1.0, |tier| tier.multiplier)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.day_ms <= 0 {
            return Err(ConfigError::Zero {
                field: "streak.day_ms",
            });
        }
        for (idx, row) in self.milestones.iter().enumerate() {
            if self.milestones[..idx]
                .iter()
                .any(|prev| prev.streak == row.streak)
            {
                return Err(ConfigError::DuplicateMilestone { streak: row.streak });
            }
        }
        for tier in &self.multipliers {
            if !tier.multiplier.is_finite() || tier.multiplier < 1.0 {
                return Err(ConfigError::Multiplier {
                    min_streak: tier.min_streak,
                    value: tier.multiplier,
                });
            }
        }
        Ok(())
    }
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            day_ms: Self::default_day_ms(),
            base_reward: Self::default_base_reward(),
            milestones: Self::default_milestones(),
            multipliers: Self::default_multipliers(),
        }
    }
}

/// Stardust threshold that unlocks a badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneBadge {
    pub stardust: u64,
    pub badge: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardConfig {
    #[serde(default = "RewardConfig::default_initial_stardust")]
    pub initial_stardust: u64,
    #[serde(default = "RewardConfig::default_simulation_reward")]
    pub simulation_reward: u64,
    #[serde(default = "RewardConfig::default_orientation_mission")]
    pub orientation_mission: String,
    #[serde(default = "RewardConfig::default_orientation_reward")]
    pub orientation_reward: u64,
    #[serde(default = "RewardConfig::default_mission_reward")]
    pub mission_reward: u64,
    #[serde(default = "RewardConfig::default_milestone_badges")]
    pub milestone_badges: Vec<MilestoneBadge>,
}

impl RewardConfig {
    const fn default_initial_stardust() -> u64 {
        INITIAL_STARDUST
    }

    const fn default_simulation_reward() -> u64 {
        SIMULATION_STARDUST_REWARD
    }

    fn default_orientation_mission() -> String {
        ORIENTATION_MISSION_ID.to_string()
    }

    const fn default_orientation_reward() -> u64 {
        ORIENTATION_STARDUST_REWARD
    }

    const fn default_mission_reward() -> u64 {
        MISSION_COMPLETION_REWARD
    }

    fn default_milestone_badges() -> Vec<MilestoneBadge> {
        MILESTONE_BADGES
            .iter()
            .map(|&(stardust, badge)| MilestoneBadge {
                stardust,
                badge: badge.to_string(),
            })
            .collect()
    }
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            initial_stardust: Self::default_initial_stardust(),
            simulation_reward: Self::default_simulation_reward(),
            orientation_mission: Self::default_orientation_mission(),
            orientation_reward: Self::default_orientation_reward(),
            mission_reward: Self::default_mission_reward(),
            milestone_badges: Self::default_milestone_badges(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        ProgressionConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let cfg = ProgressionConfig::from_json(r#"{"fuel": {"break_gain": 40}}"#).unwrap();
        assert_eq!(cfg.fuel.break_gain, 40);
        assert_eq!(cfg.fuel.regen_interval_ms, FUEL_REGEN_INTERVAL_MS);
        assert_eq!(cfg.level.divisor, LEVEL_DIVISOR);
        assert_eq!(cfg.streak.milestones.len(), STREAK_MILESTONE_REWARDS.len());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = ProgressionConfig::from_json(r#"{"level": {"divisor": 0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Zero { field: "level.divisor" }));

        let err =
            ProgressionConfig::from_json(r#"{"fuel": {"daily_refuel_target": 120}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::AboveMax { value: 120, .. }));

        let err = ProgressionConfig::from_json(
            r#"{"streak": {"multipliers": [{"min_streak": 3, "multiplier": 0.5}]}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("3+ days"));

        let err = ProgressionConfig::from_json(
            r#"{"streak": {"milestones": [{"streak": 7, "reward": 1}, {"streak": 7, "reward": 2}]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateMilestone { streak: 7 }));

        assert!(matches!(
            ProgressionConfig::from_json("{").unwrap_err(),
            ConfigError::Json(_)
        ));
    }

    #[test]
    fn streak_tables_pick_expected_rows() {
        let streak = StreakConfig::default();
        assert_eq!(streak.reward_for(30), 250);
        assert_eq!(streak.reward_for(31), 10);
        assert!((streak.multiplier_for(13) - 1.25).abs() < f64::EPSILON);
        assert!((streak.multiplier_for(2) - 1.0).abs() < f64::EPSILON);
    }
}
