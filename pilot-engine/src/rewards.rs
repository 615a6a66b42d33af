//! Reward bookkeeping and the small economy actions that feed stardust and
//! fuel into the profile.
//!
//! Every one-shot reward is guarded by a stable id (an achievement id or a set
//! member) so replaying an action never pays twice.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{LevelConfig, ProgressionConfig};
use crate::profile::{Achievement, AchievementCategory, AchievementRarity, PilotProfile};

const STARDUST_ICON: &str = "stardust";

/// 32-bit FNV-1a over UTF-16 code units, matching the ids already stored by
/// browser clients.
fn fnv1a32_utf16(input: &str) -> u32 {
    const FNV_OFFSET: u32 = 0x811c_9dc5;
    const FNV_PRIME: u32 = 0x0100_0193;
    input.encode_utf16().fold(FNV_OFFSET, |hash, unit| {
        (hash ^ u32::from(unit)).wrapping_mul(FNV_PRIME)
    })
}

/// Reward id of a simulation exercise, keyed by its title and starting code.
#[must_use]
pub fn simulation_id(title: &str, code: &str) -> String {
    format!("sim-{:08x}", fnv1a32_utf16(&format!("{title}|{code}")))
}

/// Append `achievement` and credit `stardust`, unless its id was already
/// granted. Returns whether anything changed.
pub fn grant_achievement(
    profile: &mut PilotProfile,
    achievement: Achievement,
    stardust: u64,
    level: &LevelConfig,
) -> bool {
    if profile.has_achievement(&achievement.id) {
        log::debug!("achievement {} already granted", achievement.id);
        return false;
    }
    log::info!("granting achievement {} (+{stardust} stardust)", achievement.id);
    profile.credit_stardust(stardust, level);
    profile.achievements.push(achievement);
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationOutcome {
    pub simulation_id: String,
    /// Stardust paid for this run; 0 once the exercise was rewarded before.
    pub awarded: u64,
}

/// Book a finished simulation run: count the query, log activity and pay the
/// first-completion reward. Fuel is spent separately, before the run starts.
pub fn record_simulation_run(
    profile: &mut PilotProfile,
    title: &str,
    code: &str,
    now: DateTime<Utc>,
    cfg: &ProgressionConfig,
) -> SimulationOutcome {
    let id = simulation_id(title, code);
    let reward = cfg.rewards.simulation_reward;
    let achievement = Achievement {
        id: id.clone(),
        name: "Simulation Synchronized".to_string(),
        description: format!("Completed simulation: {title}"),
        icon: STARDUST_ICON.to_string(),
        earned_at: now.into(),
        category: AchievementCategory::Query,
        rarity: AchievementRarity::Common,
    };
    let awarded = if grant_achievement(profile, achievement, reward, &cfg.level) {
        reward
    } else {
        0
    };
    profile.queries_executed = profile.queries_executed.saturating_add(1);
    profile.log_activity(now);
    SimulationOutcome {
        simulation_id: id,
        awarded,
    }
}

/// Collect a one-off stardust pickup. Returns `false` if it was collected before.
pub fn collect_stardust_pickup(
    profile: &mut PilotProfile,
    pickup_id: &str,
    amount: u64,
    now: DateTime<Utc>,
    cfg: &ProgressionConfig,
) -> bool {
    let achievement = Achievement {
        id: pickup_id.to_string(),
        name: "Briefing Pickup".to_string(),
        description: format!("Collected +{amount} stardust."),
        icon: STARDUST_ICON.to_string(),
        earned_at: now.into(),
        category: AchievementCategory::Special,
        rarity: AchievementRarity::Common,
    };
    let granted = grant_achievement(profile, achievement, amount, &cfg.level);
    if granted {
        profile.log_activity(now);
    }
    granted
}

/// Rewards paid for finishing a sub-mission, for the mission report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MissionReport {
    pub first_completion: bool,
    pub fuel_refill: u32,
    pub stardust_reward: u64,
}

/// Mission id of a `mission-xx/section` slug.
#[must_use]
pub fn mission_id(slug: &str) -> &str {
    slug.split('/').next().unwrap_or(slug)
}

/// Mark a sub-mission complete. The first completion refills fuel, and
/// orientation sub-missions also pay stardust.
pub fn complete_sub_mission(
    profile: &mut PilotProfile,
    slug: &str,
    cfg: &ProgressionConfig,
) -> MissionReport {
    if !profile.completed_sub_missions.insert(slug.to_string()) {
        return MissionReport::default();
    }

    let before = profile.fuel;
    profile.set_fuel(before.saturating_add(cfg.fuel.sub_mission_refill));
    let stardust_reward = if mission_id(slug) == cfg.rewards.orientation_mission {
        profile.credit_stardust(cfg.rewards.orientation_reward, &cfg.level);
        cfg.rewards.orientation_reward
    } else {
        0
    };

    MissionReport {
        first_completion: true,
        fuel_refill: profile.fuel - before,
        stardust_reward,
    }
}

/// Record a finished mission (the final step of its last sub-mission).
/// Returns the bonus paid, 0 when the mission was already complete.
pub fn complete_mission(profile: &mut PilotProfile, slug: &str, cfg: &ProgressionConfig) -> u64 {
    let id = mission_id(slug);
    if id.is_empty() || !profile.completed_missions.insert(id.to_string()) {
        return 0;
    }
    profile.credit_stardust(cfg.rewards.mission_reward, &cfg.level);
    log::info!("mission {id} complete (+{} stardust)", cfg.rewards.mission_reward);
    cfg.rewards.mission_reward
}

/// Save a research-log bookmark, paying `reward` on first save.
pub fn add_bookmark(
    profile: &mut PilotProfile,
    slug: &str,
    reward: u64,
    level: &LevelConfig,
) -> bool {
    if !profile.bookmarks.insert(slug.to_string()) {
        return false;
    }
    if reward > 0 {
        profile.credit_stardust(reward, level);
    }
    true
}

/// Unlock every milestone badge the current stardust qualifies for.
/// Returns the newly added badges.
pub fn award_milestone_badges(profile: &mut PilotProfile, cfg: &ProgressionConfig) -> Vec<String> {
    let stardust = profile.stardust;
    cfg.rewards
        .milestone_badges
        .iter()
        .filter(|milestone| stardust >= milestone.stardust)
        .filter_map(|milestone| {
            profile
                .badges
                .insert(milestone.badge.clone())
                .then(|| milestone.badge.clone())
        })
        .collect()
}

/// Clear completed missions. Stardust, fuel and bookmarks stay.
pub fn reset_progress(profile: &mut PilotProfile) -> bool {
    let changed = !profile.completed_missions.is_empty();
    profile.completed_missions.clear();
    changed
}

pub fn reset_bookmarks(profile: &mut PilotProfile) -> bool {
    let changed = !profile.bookmarks.is_empty();
    profile.bookmarks.clear();
    changed
}

/// Clear the achievement log so pickups and simulation rewards can be earned
/// again.
pub fn reset_rewards(profile: &mut PilotProfile) -> bool {
    let changed = !profile.achievements.is_empty();
    profile.achievements.clear();
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 2, 10, 30, 0).unwrap()
    }

    fn pilot(cfg: &ProgressionConfig) -> PilotProfile {
        PilotProfile::register("lyra", "PILOT", t0(), cfg)
    }

    #[test]
    fn simulation_ids_are_stable_fnv_hex() {
        assert_eq!(fnv1a32_utf16(""), 0x811c_9dc5);
        assert_eq!(fnv1a32_utf16("a"), 0xe40c_292c);
        let id = simulation_id("Holodeck", "AuthenticationEvents | take 10");
        assert!(id.starts_with("sim-"));
        assert_eq!(id.len(), 12);
        assert_eq!(id, simulation_id("Holodeck", "AuthenticationEvents | take 10"));
        assert_ne!(id, simulation_id("Holodeck", "SigninLogs | take 10"));
    }

    #[test]
    fn achievements_are_granted_once() {
        let cfg = ProgressionConfig::default();
        let mut profile = pilot(&cfg);
        assert!(collect_stardust_pickup(&mut profile, "pickup-m00-a", 20, t0(), &cfg));
        assert!(!collect_stardust_pickup(&mut profile, "pickup-m00-a", 20, t0(), &cfg));
        assert_eq!(profile.stardust, 70);
        assert_eq!(profile.achievements.len(), 1);
        assert_eq!(profile.achievements[0].category, AchievementCategory::Special);
    }

    #[test]
    fn simulation_runs_pay_once_but_always_count() {
        let cfg = ProgressionConfig::default();
        let mut profile = pilot(&cfg);
        let first = record_simulation_run(&mut profile, "Console", "T | take 1", t0(), &cfg);
        let second = record_simulation_run(&mut profile, "Console", "T | take 1", t0(), &cfg);
        assert_eq!(first.awarded, 5);
        assert_eq!(second.awarded, 0);
        assert_eq!(first.simulation_id, second.simulation_id);
        assert_eq!(profile.stardust, 55);
        assert_eq!(profile.queries_executed, 2);
        assert_eq!(profile.achievements.len(), 1);
        assert_eq!(profile.experience_points, 55);
    }

    #[test]
    fn sub_missions_refill_and_orientation_pays() {
        let cfg = ProgressionConfig::default();
        let mut profile = pilot(&cfg);
        profile.fuel = 50;
        let report = complete_sub_mission(&mut profile, "mission-00/briefing", &cfg);
        assert_eq!(
            report,
            MissionReport {
                first_completion: true,
                fuel_refill: 5,
                stardust_reward: 5
            }
        );
        let repeat = complete_sub_mission(&mut profile, "mission-00/briefing", &cfg);
        assert_eq!(repeat, MissionReport::default());

        profile.fuel = 98;
        let later = complete_sub_mission(&mut profile, "mission-03/joins", &cfg);
        assert_eq!(later.fuel_refill, 2);
        assert_eq!(later.stardust_reward, 0);
        assert_eq!(profile.stardust, 55);
    }

    #[test]
    fn mission_completion_pays_once() {
        let cfg = ProgressionConfig::default();
        let mut profile = pilot(&cfg);
        assert_eq!(complete_mission(&mut profile, "mission-01/debrief", &cfg), 50);
        assert_eq!(complete_mission(&mut profile, "mission-01", &cfg), 0);
        assert!(profile.completed_missions.contains("mission-01"));
        assert_eq!(profile.stardust, 100);
        assert_eq!(profile.level, 2);
    }

    #[test]
    fn bookmarks_and_milestones_are_sets() {
        let cfg = ProgressionConfig::default();
        let mut profile = pilot(&cfg);
        assert!(add_bookmark(&mut profile, "mission-02/where", 0, &cfg.level));
        assert!(!add_bookmark(&mut profile, "mission-02/where", 0, &cfg.level));
        assert!(add_bookmark(&mut profile, "mission-02/project", 3, &cfg.level));
        assert_eq!(profile.stardust, 53);

        profile.credit_stardust(500, &cfg.level);
        let unlocked = award_milestone_badges(&mut profile, &cfg);
        assert_eq!(unlocked, vec!["rising-star", "cosmic-navigator"]);
        assert!(award_milestone_badges(&mut profile, &cfg).is_empty());
    }

    #[test]
    fn resets_clear_only_their_collection() {
        let cfg = ProgressionConfig::default();
        let mut profile = pilot(&cfg);
        complete_mission(&mut profile, "mission-01", &cfg);
        add_bookmark(&mut profile, "mission-01/a", 0, &cfg.level);
        collect_stardust_pickup(&mut profile, "p1", 5, t0(), &cfg);
        let stardust = profile.stardust;

        assert!(reset_rewards(&mut profile));
        assert!(profile.achievements.is_empty());
        assert!(!profile.bookmarks.is_empty());
        assert!(reset_bookmarks(&mut profile));
        assert!(reset_progress(&mut profile));
        assert!(!reset_progress(&mut profile));
        assert_eq!(profile.stardust, stardust);

        // A cleared reward can be earned again.
        assert!(collect_stardust_pickup(&mut profile, "p1", 5, t0(), &cfg));
    }
}
