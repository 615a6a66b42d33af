//! The persisted pilot profile record and its value types.
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::config::{LevelConfig, ProgressionConfig};
use crate::constants::{DEFAULT_THEME, FUEL_MAX, INITIAL_BADGE};
use crate::level::rank_title;

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Timestamp exactly as stored in the record.
///
/// Stored values are untrusted: [`Timestamp::parse`] returns `None` for
/// anything that is not an RFC 3339 instant or a bare `YYYY-MM-DD` date, and
/// callers decide how to heal it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    /// Wrap a raw stored value without validating it.
    #[must_use]
    pub fn raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn parse(&self) -> Option<DateTime<Utc>> {
        let value = self.0.trim();
        if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
            return Some(instant.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(value, DATE_KEY_FORMAT)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// UTC calendar key (`YYYY-MM-DD`) used by the activity log.
#[must_use]
pub fn date_key(now: DateTime<Utc>) -> String {
    now.format(DATE_KEY_FORMAT).to_string()
}

#[must_use]
pub fn is_date_key(value: &str) -> bool {
    value.len() == 10 && NaiveDate::parse_from_str(value, DATE_KEY_FORMAT).is_ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Query,
    Mission,
    Streak,
    Special,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AchievementRarity {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
}

/// Entry of the append-only achievement log. `id` doubles as the reward guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub earned_at: Timestamp,
    pub category: AchievementCategory,
    pub rarity: AchievementRarity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PersonalBests {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longest_streak: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub most_stardust_in_day: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fastest_mission_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub most_queries_in_session: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highest_complexity_query: Option<f64>,
}

/// The single persisted progression aggregate.
///
/// `level`, `rank` and `experience_points` mirror `stardust`; mutate stardust
/// through [`PilotProfile::credit_stardust`] / [`PilotProfile::debit_stardust`]
/// so they stay in sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PilotProfile {
    // Identity
    pub callsign: String,
    pub prefix: String,
    pub rank: String,

    // Resources
    pub fuel: u32,
    pub stardust: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_break_ready_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_last_regen_at: Option<Timestamp>,

    // Progression
    pub level: u32,
    pub experience_points: u64,

    // Activity
    pub queries_executed: u64,
    #[serde(default)]
    pub completed_missions: BTreeSet<String>,
    #[serde(default)]
    pub completed_sub_missions: BTreeSet<String>,
    #[serde(default)]
    pub bookmarks: BTreeSet<String>,
    pub daily_streak: u32,
    pub longest_streak: u32,
    pub last_login_date: Timestamp,
    #[serde(default)]
    pub activity_dates: BTreeSet<String>,
    #[serde(default)]
    pub total_minutes_active: u64,

    // Achievements & customization
    #[serde(default)]
    pub badges: BTreeSet<String>,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    #[serde(default = "default_themes")]
    pub unlocked_themes: BTreeSet<String>,
    #[serde(default = "default_theme")]
    pub selected_theme: String,

    #[serde(default)]
    pub personal_bests: PersonalBests,

    pub joined: Timestamp,
}

pub(crate) fn default_themes() -> BTreeSet<String> {
    BTreeSet::from([DEFAULT_THEME.to_string()])
}

pub(crate) fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

impl PilotProfile {
    /// Create the record of a freshly registered pilot.
    #[must_use]
    pub fn register(callsign: &str, prefix: &str, now: DateTime<Utc>, cfg: &ProgressionConfig) -> Self {
        let mut profile = Self {
            callsign: callsign.trim().to_uppercase(),
            prefix: prefix.to_string(),
            rank: String::new(),
            fuel: FUEL_MAX,
            stardust: cfg.rewards.initial_stardust,
            fuel_break_ready_at: None,
            fuel_last_regen_at: Some(now.into()),
            level: 0,
            experience_points: 0,
            queries_executed: 0,
            completed_missions: BTreeSet::new(),
            completed_sub_missions: BTreeSet::new(),
            bookmarks: BTreeSet::new(),
            daily_streak: 1,
            longest_streak: 1,
            last_login_date: now.into(),
            activity_dates: BTreeSet::from([date_key(now)]),
            total_minutes_active: 0,
            badges: BTreeSet::from([INITIAL_BADGE.to_string()]),
            achievements: Vec::new(),
            unlocked_themes: default_themes(),
            selected_theme: default_theme(),
            personal_bests: PersonalBests::default(),
            joined: now.into(),
        };
        profile.sync_rank(&cfg.level);
        log::info!(
            "registered pilot {} with {} stardust",
            profile.callsign,
            profile.stardust
        );
        profile
    }

    /// Re-derive `level`, `rank` and `experience_points` from `stardust`.
    pub fn sync_rank(&mut self, level: &LevelConfig) {
        self.level = level.level_for(self.stardust);
        self.rank = rank_title(self.level).to_string();
        self.experience_points = self.stardust;
    }

    pub fn credit_stardust(&mut self, amount: u64, level: &LevelConfig) {
        self.stardust = self.stardust.saturating_add(amount);
        self.sync_rank(level);
    }

    pub fn debit_stardust(&mut self, amount: u64, level: &LevelConfig) {
        self.stardust = self.stardust.saturating_sub(amount);
        self.sync_rank(level);
    }

    /// Set fuel, clamped to the tank.
    pub fn set_fuel(&mut self, fuel: u32) {
        self.fuel = fuel.min(FUEL_MAX);
    }

    #[must_use]
    pub fn is_tank_full(&self) -> bool {
        self.fuel >= FUEL_MAX
    }

    #[must_use]
    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|entry| entry.id == id)
    }

    /// Record `now`'s date key. Returns `true` when it was not yet logged.
    pub fn log_activity(&mut self, now: DateTime<Utc>) -> bool {
        self.activity_dates.insert(date_key(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn timestamps_format_like_browser_iso_strings() {
        let ts = Timestamp::from(at(2025, 3, 9, 14, 5));
        assert_eq!(ts.as_str(), "2025-03-09T14:05:00.000Z");
        assert_eq!(ts.parse(), Some(at(2025, 3, 9, 14, 5)));
    }

    #[test]
    fn timestamps_parse_leniently() {
        assert_eq!(
            Timestamp::raw("2025-03-09").parse(),
            Some(at(2025, 3, 9, 0, 0))
        );
        assert_eq!(
            Timestamp::raw("2025-03-09T16:05:00+02:00").parse(),
            Some(at(2025, 3, 9, 14, 5))
        );
        assert_eq!(Timestamp::raw("not-a-date").parse(), None);
        assert_eq!(Timestamp::raw("").parse(), None);
    }

    #[test]
    fn date_keys_validate() {
        assert_eq!(date_key(at(2025, 12, 31, 23, 59)), "2025-12-31");
        assert!(is_date_key("2024-02-29"));
        assert!(!is_date_key("2023-02-29"));
        assert!(!is_date_key("2024-2-9"));
    }

    #[test]
    fn registration_sets_initial_values() {
        let now = at(2025, 1, 1, 8, 0);
        let profile = PilotProfile::register(" nova ", "COMMANDER", now, &ProgressionConfig::default());
        assert_eq!(profile.callsign, "NOVA");
        assert_eq!(profile.stardust, 50);
        assert_eq!(profile.fuel, 100);
        assert_eq!(profile.level, 1);
        assert_eq!(profile.rank, "Cadet");
        assert_eq!(profile.experience_points, 50);
        assert_eq!((profile.daily_streak, profile.longest_streak), (1, 1));
        assert!(profile.badges.contains("identity-verified"));
        assert!(profile.activity_dates.contains("2025-01-01"));
    }

    #[test]
    fn stardust_mutations_keep_rank_in_sync() {
        let cfg = ProgressionConfig::default();
        let mut profile = PilotProfile::register("ace", "PILOT", at(2025, 1, 1, 0, 0), &cfg);
        profile.credit_stardust(575, &cfg.level);
        assert_eq!((profile.level, profile.rank.as_str()), (5, "Navigator"));
        profile.debit_stardust(10_000, &cfg.level);
        assert_eq!(profile.stardust, 0);
        assert_eq!((profile.level, profile.experience_points), (0, 0));
    }

    #[test]
    fn json_shape_uses_camel_case_and_sets() {
        let cfg = ProgressionConfig::default();
        let mut profile = PilotProfile::register("ace", "PILOT", at(2025, 1, 1, 0, 0), &cfg);
        profile.bookmarks.insert("mission-01/intro".into());
        profile.bookmarks.insert("mission-01/intro".into());
        let value = serde_json::to_value(&profile).unwrap();
        assert!(value.get("lastLoginDate").is_some());
        assert!(value.get("fuelBreakReadyAt").is_none());
        assert_eq!(value["bookmarks"].as_array().unwrap().len(), 1);

        let restored: PilotProfile = serde_json::from_value(value).unwrap();
        assert_eq!(restored, profile);
    }
}
