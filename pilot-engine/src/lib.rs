//! Pilot Progression Engine
//!
//! Platform-agnostic progression logic for the query-language academy: level
//! and rank math, daily streaks, passive fuel regeneration, break refills,
//! reward bookkeeping and forward migration of stored profiles.
//! Engine functions take the profile and an explicit `now`; storage and change
//! notification are injected through [`KeyValueStore`] and [`ProfileObserver`].

pub mod config;
pub mod constants;
pub mod fuel;
pub mod level;
pub mod migrate;
pub mod numbers;
pub mod profile;
pub mod rewards;
pub mod streak;
pub mod transfer;

use chrono::{DateTime, Utc};
use thiserror::Error;

// Re-export commonly used types
pub use config::{
    ConfigError, FuelConfig, LevelConfig, MilestoneBadge, MultiplierTier, ProgressionConfig,
    RewardConfig, StreakConfig, StreakMilestone,
};
pub use fuel::{
    BreakClaim, BreakRefill, BreakStart, EconomyError, RefuelReceipt, apply_break_refill,
    apply_passive_regen, break_remaining, purchase_refuel, spend_fuel, start_break,
};
pub use level::{LevelProgress, calculate_level, level_progress, rank_title, stardust_for_level};
pub use migrate::{LegacyProfile, ProfileRecord, migrate_profile, migrate_value};
pub use profile::{
    Achievement, AchievementCategory, AchievementRarity, PersonalBests, PilotProfile, Timestamp,
    date_key,
};
pub use rewards::{
    MissionReport, SimulationOutcome, add_bookmark, award_milestone_badges,
    collect_stardust_pickup, complete_mission, complete_sub_mission, grant_achievement,
    record_simulation_run, reset_bookmarks, reset_progress, reset_rewards, simulation_id,
};
pub use streak::{
    LoginOutcome, StreakCheck, calculate_daily_streak, check_and_update_daily_login,
    streak_multiplier, streak_reward,
};
pub use transfer::{export_file_name, export_profile_json, import_profile};

use constants::PROFILE_STORAGE_KEY;

/// Failure to decode or encode a profile document.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a [`ProfileRepository`] operation.
#[derive(Debug, Error)]
pub enum StoreError<E>
where
    E: std::error::Error + 'static,
{
    #[error("profile store failed: {0}")]
    Backend(#[source] E),
    #[error("profile could not be encoded: {0}")]
    Json(#[from] serde_json::Error),
}

/// String key-value storage holding the profile document.
/// Platform-specific implementations should provide this
pub trait KeyValueStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Remove `key` if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the removal.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

/// Receives the profile after every successful persist, or `None` after the
/// record was removed.
pub trait ProfileObserver {
    fn profile_changed(&self, profile: Option<&PilotProfile>);
}

impl ProfileObserver for () {
    fn profile_changed(&self, _profile: Option<&PilotProfile>) {}
}

/// Result of [`ProfileRepository::load`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedProfile {
    pub profile: PilotProfile,
    /// The stored record was legacy or needed normalizing.
    pub migrated: bool,
    pub refill: BreakRefill,
    /// The pipeline changed the record and it was written back.
    pub persisted: bool,
}

/// Result of [`ProfileRepository::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct Updated<T> {
    pub profile: PilotProfile,
    pub outcome: T,
    pub persisted: bool,
}

/// Loads, repairs and persists the single profile record.
pub struct ProfileRepository<S, O = ()>
where
    S: KeyValueStore,
    O: ProfileObserver,
{
    store: S,
    observer: O,
    config: ProgressionConfig,
}

impl<S, O> ProfileRepository<S, O>
where
    S: KeyValueStore,
    O: ProfileObserver,
{
    pub const fn new(store: S, observer: O, config: ProgressionConfig) -> Self {
        Self {
            store,
            observer,
            config,
        }
    }

    pub const fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn observer(&self) -> &O {
        &self.observer
    }

    /// Read the stored profile and run it through migration, passive regen and
    /// the break refill. The result is written back and broadcast when any step
    /// changed it.
    ///
    /// Missing or unparsable documents load as `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or the repaired profile
    /// cannot be written back.
    pub fn load(&self, now: DateTime<Utc>) -> Result<Option<LoadedProfile>, StoreError<S::Error>> {
        let Some(raw) = self
            .store
            .get(PROFILE_STORAGE_KEY)
            .map_err(StoreError::Backend)?
        else {
            return Ok(None);
        };
        let record = match ProfileRecord::from_json(&raw) {
            Ok(record) => record,
            Err(err) => {
                log::warn!("ignoring unreadable stored profile: {err}");
                return Ok(None);
            }
        };

        let migrated = match &record {
            ProfileRecord::Legacy(_) | ProfileRecord::Damaged(_) => true,
            ProfileRecord::Current(stored) => {
                let normalized = migrate_profile(record.clone(), now, &self.config);
                normalized != *stored
            }
        };
        let mut profile = migrate_profile(record, now, &self.config);
        let refill = apply_break_refill(&mut profile, now, &self.config.fuel);

        let persisted = migrated || refill.changed;
        if persisted {
            log::debug!("load pipeline changed the profile (migrated: {migrated}); persisting");
            self.save(&profile)?;
        }
        Ok(Some(LoadedProfile {
            profile,
            migrated,
            refill,
            persisted,
        }))
    }

    /// Persist `profile` and notify the observer.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be encoded or written.
    pub fn save(&self, profile: &PilotProfile) -> Result<(), StoreError<S::Error>> {
        let json = serde_json::to_string(profile)?;
        self.store
            .set(PROFILE_STORAGE_KEY, &json)
            .map_err(StoreError::Backend)?;
        self.observer.profile_changed(Some(profile));
        Ok(())
    }

    /// Load the profile, apply `action`, and persist the result if the action
    /// modified it. Returns `None` when no profile is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if loading or saving fails.
    pub fn update<T, F>(&self, now: DateTime<Utc>, action: F) -> anyhow::Result<Option<Updated<T>>>
    where
        F: FnOnce(&mut PilotProfile, &ProgressionConfig) -> T,
    {
        let Some(loaded) = self.load(now)? else {
            return Ok(None);
        };
        let mut profile = loaded.profile;
        let before = profile.clone();
        let outcome = action(&mut profile, &self.config);
        let persisted = profile != before;
        if persisted {
            self.save(&profile)?;
        }
        Ok(Some(Updated {
            profile,
            outcome,
            persisted,
        }))
    }

    /// Run the daily login check against the stored profile.
    ///
    /// # Errors
    ///
    /// Returns an error if loading or saving fails.
    pub fn login(&self, now: DateTime<Utc>) -> anyhow::Result<Option<Updated<LoginOutcome>>> {
        self.update(now, |profile, cfg| check_and_update_daily_login(profile, now, cfg))
    }

    /// Remove the stored profile and notify the observer.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the removal.
    pub fn clear(&self) -> Result<(), StoreError<S::Error>> {
        self.store
            .remove(PROFILE_STORAGE_KEY)
            .map_err(StoreError::Backend)?;
        self.observer.profile_changed(None);
        Ok(())
    }
}
