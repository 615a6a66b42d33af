//! Daily login streaks.
//!
//! A "day" is 24 hours of elapsed wall-clock time since the last recorded
//! login, not a calendar boundary: 23:00 followed by 01:00 is the same day.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{ProgressionConfig, StreakConfig};
use crate::profile::{PilotProfile, Timestamp};

/// Classification of a login relative to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreakCheck {
    /// Less than one day has elapsed.
    SameDay,
    /// Between one and two days have elapsed.
    NextDay,
    /// Two or more days elapsed, or the previous login is unreadable.
    Broken,
}

impl StreakCheck {
    #[must_use]
    pub const fn is_new_day(self) -> bool {
        !matches!(self, Self::SameDay)
    }
}

/// Result of [`check_and_update_daily_login`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub reward: u64,
    pub is_new_streak: bool,
    pub streak: u32,
    /// Whether the profile must be persisted.
    pub changed: bool,
}

#[must_use]
pub fn calculate_daily_streak(
    last_login: &Timestamp,
    now: DateTime<Utc>,
    cfg: &StreakConfig,
) -> StreakCheck {
    let Some(last) = last_login.parse() else {
        log::warn!("unreadable lastLoginDate {last_login:?}; treating streak as broken");
        return StreakCheck::Broken;
    };
    let elapsed_ms = (now - last).num_milliseconds();
    if elapsed_ms < 0 {
        // Clock moved backwards; never reward it.
        return StreakCheck::SameDay;
    }
    match elapsed_ms / cfg.day_ms.max(1) {
        0 => StreakCheck::SameDay,
        1 => StreakCheck::NextDay,
        _ => StreakCheck::Broken,
    }
}

/// Apply a login at `now`: advance or reset the streak, credit the reward,
/// refill the tank on a new day and log today's activity.
pub fn check_and_update_daily_login(
    profile: &mut PilotProfile,
    now: DateTime<Utc>,
    cfg: &ProgressionConfig,
) -> LoginOutcome {
    let logged_today = profile.log_activity(now);
    let check = calculate_daily_streak(&profile.last_login_date, now, &cfg.streak);

    let reward = match check {
        StreakCheck::SameDay => {
            return LoginOutcome {
                reward: 0,
                is_new_streak: false,
                streak: profile.daily_streak,
                changed: logged_today,
            };
        }
        StreakCheck::NextDay => {
            profile.daily_streak = profile.daily_streak.saturating_add(1);
            cfg.streak.reward_for(profile.daily_streak)
        }
        StreakCheck::Broken => {
            profile.daily_streak = 1;
            cfg.streak.base_reward
        }
    };

    profile.longest_streak = profile.longest_streak.max(profile.daily_streak);
    profile.last_login_date = now.into();
    profile.credit_stardust(reward, &cfg.level);
    profile.set_fuel(cfg.fuel.daily_refuel_target);

    log::info!(
        "daily login: streak {} ({check:?}), +{reward} stardust",
        profile.daily_streak
    );

    LoginOutcome {
        reward,
        is_new_streak: true,
        streak: profile.daily_streak,
        changed: true,
    }
}

/// Reward multiplier for a streak length under the default tiers.
#[must_use]
pub fn streak_multiplier(streak: u32) -> f64 {
    StreakConfig::default().multiplier_for(streak)
}

/// Login reward for reaching `streak` days under the default milestones.
#[must_use]
pub fn streak_reward(streak: u32) -> u64 {
    StreakConfig::default().reward_for(streak)
}
