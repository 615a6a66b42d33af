//! Forward migration of stored profile records.
//!
//! Stored JSON is classified into [`ProfileRecord`]: a record that already has
//! the current shape, a current-shape record with some malformed fields, or a
//! legacy/partial one. The last two are read field by field. [`migrate_profile`]
//! maps every record to a complete [`PilotProfile`], and is the only place
//! defaults are applied.
use chrono::{DateTime, Utc};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::config::ProgressionConfig;
use crate::constants::{
    DEFAULT_CALLSIGN, DEFAULT_PREFIX, FUEL_MAX, LEGACY_DEFAULT_FUEL, LEGACY_DEFAULT_STARDUST,
};
use crate::numbers::{floor_f64_to_u64, round_f64_to_bounded_u32};
use crate::profile::{
    Achievement, PersonalBests, PilotProfile, Timestamp, date_key, default_theme, default_themes, is_date_key,
};

/// Fields that mark a record as carrying the current progression shape.
const CURRENT_SHAPE_KEYS: [&str; 3] = ["level", "experiencePoints", "dailyStreak"];

/// A stored record, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileRecord {
    Current(PilotProfile),
    /// Current shape, but some fields fail strict decoding. Progress is kept
    /// and only the unreadable fields are replaced.
    Damaged(Value),
    Legacy(LegacyProfile),
}

impl ProfileRecord {
    /// Classify arbitrary JSON. Never fails: a record without the current
    /// shape is treated as legacy.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        if !has_current_shape(&value) {
            return Self::Legacy(LegacyProfile::from_value(&value));
        }
        match serde_json::from_value::<PilotProfile>(value.clone()) {
            Ok(profile) => Self::Current(profile),
            Err(err) => {
                log::warn!("stored profile has malformed fields: {err}");
                Self::Damaged(value)
            }
        }
    }

    /// Parse stored text and classify it.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not JSON at all.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self::from_value)
    }

    #[must_use]
    pub const fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }
}

fn has_current_shape(value: &Value) -> bool {
    CURRENT_SHAPE_KEYS
        .iter()
        .all(|key| value.get(*key).is_some_and(Value::is_number))
}

/// The fields a legacy record may carry, each kept only when well-typed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LegacyProfile {
    pub callsign: Option<String>,
    /// Pre-callsign display name.
    pub name: Option<String>,
    pub prefix: Option<String>,
    pub fuel: Option<f64>,
    pub stardust: Option<f64>,
    pub fuel_last_regen_at: Option<String>,
    pub completed_missions: Option<Vec<String>>,
    pub completed_sub_missions: Option<Vec<String>>,
    pub bookmarks: Option<Vec<String>>,
    pub badges: Option<Vec<String>>,
    pub joined: Option<String>,
    pub last_login_date: Option<String>,
    pub activity_dates: Option<Vec<String>>,
}

impl LegacyProfile {
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        Self {
            callsign: text(value, "callsign"),
            name: text(value, "name"),
            prefix: text(value, "prefix"),
            fuel: value.get("fuel").and_then(Value::as_f64),
            stardust: value.get("stardust").and_then(Value::as_f64),
            fuel_last_regen_at: text(value, "fuelLastRegenAt"),
            completed_missions: text_list(value, "completedMissions"),
            completed_sub_missions: text_list(value, "completedSubMissions"),
            bookmarks: text_list(value, "bookmarks"),
            badges: text_list(value, "badges"),
            joined: text(value, "joined"),
            last_login_date: text(value, "lastLoginDate"),
            activity_dates: text_list(value, "activityDates"),
        }
    }
}

fn text(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn text_list(value: &Value, key: &str) -> Option<Vec<String>> {
    value.get(key).and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

/// Bring any stored record up to the current schema.
///
/// Current records are only normalized (derived fields re-computed, fuel
/// clamped), so migrating a migrated profile is a no-op.
#[must_use]
pub fn migrate_profile(
    record: ProfileRecord,
    now: DateTime<Utc>,
    cfg: &ProgressionConfig,
) -> PilotProfile {
    match record {
        ProfileRecord::Current(profile) => normalize(profile, cfg),
        ProfileRecord::Damaged(value) => {
            let profile = repair_current(&value, now, cfg);
            log::info!("repaired stored profile for {}", profile.callsign);
            profile
        }
        ProfileRecord::Legacy(legacy) => {
            let profile = upgrade_legacy(legacy, now, cfg);
            log::info!("migrated legacy profile for {}", profile.callsign);
            profile
        }
    }
}

/// Classify and migrate raw JSON in one step.
#[must_use]
pub fn migrate_value(value: Value, now: DateTime<Utc>, cfg: &ProgressionConfig) -> PilotProfile {
    migrate_profile(ProfileRecord::from_value(value), now, cfg)
}

fn normalize(mut profile: PilotProfile, cfg: &ProgressionConfig) -> PilotProfile {
    profile.sync_rank(&cfg.level);
    profile.set_fuel(profile.fuel);
    profile.longest_streak = profile.longest_streak.max(profile.daily_streak);
    profile.activity_dates.retain(|date| is_date_key(date));
    profile
}

fn upgrade_legacy(legacy: LegacyProfile, now: DateTime<Utc>, cfg: &ProgressionConfig) -> PilotProfile {
    let stardust = legacy
        .stardust
        .map_or(LEGACY_DEFAULT_STARDUST, floor_f64_to_u64);
    let fuel = legacy
        .fuel
        .map_or(LEGACY_DEFAULT_FUEL, |fuel| round_f64_to_bounded_u32(fuel, FUEL_MAX));
    let activity_dates = seed_activity(&legacy, now);
    let as_set = |list: Option<Vec<String>>| list.unwrap_or_default().into_iter().collect();

    let mut profile = PilotProfile {
        callsign: legacy
            .callsign
            .or(legacy.name)
            .unwrap_or_else(|| DEFAULT_CALLSIGN.to_string()),
        prefix: legacy.prefix.unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
        rank: String::new(),
        fuel,
        stardust,
        fuel_break_ready_at: None,
        fuel_last_regen_at: Some(
            legacy
                .fuel_last_regen_at
                .map_or_else(|| now.into(), Timestamp::raw),
        ),
        level: 0,
        experience_points: 0,
        queries_executed: 0,
        completed_missions: as_set(legacy.completed_missions),
        completed_sub_missions: as_set(legacy.completed_sub_missions),
        bookmarks: as_set(legacy.bookmarks),
        daily_streak: 1,
        longest_streak: 1,
        last_login_date: now.into(),
        activity_dates,
        total_minutes_active: 0,
        badges: as_set(legacy.badges),
        achievements: Vec::new(),
        unlocked_themes: default_themes(),
        selected_theme: default_theme(),
        personal_bests: PersonalBests::default(),
        joined: legacy.joined.map_or_else(|| now.into(), Timestamp::raw),
    };
    profile.sync_rank(&cfg.level);
    profile
}

/// Rebuild a current-shape record whose strict decoding failed. Scalars go
/// through the lenient legacy reader (rounded, clamped, defaulted); every other
/// field is kept when it decodes on its own. Achievements are filtered entry by
/// entry so earned ids survive.
fn repair_current(value: &Value, now: DateTime<Utc>, cfg: &ProgressionConfig) -> PilotProfile {
    let mut profile = upgrade_legacy(LegacyProfile::from_value(value), now, cfg);
    overlay(&mut profile.queries_executed, value, "queriesExecuted");
    overlay(&mut profile.daily_streak, value, "dailyStreak");
    overlay(&mut profile.longest_streak, value, "longestStreak");
    overlay(&mut profile.last_login_date, value, "lastLoginDate");
    overlay(&mut profile.total_minutes_active, value, "totalMinutesActive");
    overlay(&mut profile.unlocked_themes, value, "unlockedThemes");
    overlay(&mut profile.selected_theme, value, "selectedTheme");
    overlay(&mut profile.personal_bests, value, "personalBests");
    overlay(&mut profile.fuel_break_ready_at, value, "fuelBreakReadyAt");
    profile.daily_streak = profile.daily_streak.max(1);
    profile.achievements = readable_achievements(value);
    normalize(profile, cfg)
}

fn overlay<T: DeserializeOwned>(slot: &mut T, value: &Value, key: &str) {
    if let Some(parsed) = value.get(key).and_then(|raw| T::deserialize(raw).ok()) {
        *slot = parsed;
    }
}

fn readable_achievements(value: &Value) -> Vec<Achievement> {
    let mut seen = BTreeSet::new();
    let mut kept = Vec::new();
    for entry in value
        .get("achievements")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        match Achievement::deserialize(entry) {
            Ok(achievement) if seen.insert(achievement.id.clone()) => kept.push(achievement),
            Ok(_) => {}
            Err(err) => log::warn!("dropping unreadable achievement: {err}"),
        }
    }
    kept
}

/// Keep a legacy activity log when it has valid entries, otherwise seed it
/// from the last login day, otherwise from today.
fn seed_activity(legacy: &LegacyProfile, now: DateTime<Utc>) -> BTreeSet<String> {
    let kept: BTreeSet<String> = legacy
        .activity_dates
        .iter()
        .flatten()
        .filter(|date| is_date_key(date))
        .cloned()
        .collect();
    if !kept.is_empty() {
        return kept;
    }
    let seeded = legacy
        .last_login_date
        .as_deref()
        .and_then(|raw| raw.get(..10))
        .filter(|prefix| is_date_key(prefix))
        .map_or_else(|| date_key(now), str::to_string);
    BTreeSet::from([seeded])
}
