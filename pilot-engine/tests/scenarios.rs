use chrono::{DateTime, Duration, TimeZone, Utc};
use pilot_engine::{
    Achievement, AchievementCategory, AchievementRarity, BreakClaim, BreakStart, EconomyError,
    PilotProfile, ProfileRecord, ProgressionConfig, StreakCheck, Timestamp, apply_break_refill,
    apply_passive_regen, award_milestone_badges, calculate_daily_streak, calculate_level,
    check_and_update_daily_login, collect_stardust_pickup, grant_achievement, import_profile,
    level_progress, migrate_profile, purchase_refuel, rank_title, start_break,
};
use serde_json::json;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 20, 0, 0).unwrap()
}

fn pilot() -> (PilotProfile, ProgressionConfig) {
    let cfg = ProgressionConfig::default();
    (PilotProfile::register("vega", "PILOT", t0(), &cfg), cfg)
}

#[test]
fn regen_from_forty_after_twenty_five_minutes() {
    let (mut profile, cfg) = pilot();
    profile.fuel = 40;
    profile.fuel_last_regen_at = Some(Timestamp::from(t0() - Duration::minutes(25)));
    assert!(apply_passive_regen(&mut profile, t0(), &cfg.fuel));
    assert_eq!(profile.fuel, 65);
    assert_eq!(profile.fuel_last_regen_at, Some(Timestamp::from(t0())));
}

#[test]
fn regen_caps_at_the_tank_after_a_long_absence() {
    let (mut profile, cfg) = pilot();
    profile.fuel = 40;
    profile.fuel_last_regen_at = Some(Timestamp::from(t0() - Duration::minutes(125)));
    assert!(apply_passive_regen(&mut profile, t0(), &cfg.fuel));
    assert_eq!(profile.fuel, 100);
}

#[test]
fn six_hundred_twenty_five_stardust_is_navigator_level_five() {
    assert_eq!(calculate_level(625), 5);
    assert_eq!(rank_title(5), "Navigator");
    let progress = level_progress(625);
    assert_eq!((progress.current, progress.next), (5, 6));
    assert!(progress.percentage.abs() < f64::EPSILON);
}

#[test]
fn break_refill_end_to_end() {
    let (mut profile, cfg) = pilot();
    profile.fuel = 60;
    assert!(matches!(
        start_break(&mut profile, t0(), &cfg.fuel),
        BreakStart::Scheduled { .. }
    ));

    let early = apply_break_refill(&mut profile, t0() + Duration::minutes(5), &cfg.fuel);
    assert!(matches!(early.claim, BreakClaim::Pending { .. }));
    assert_eq!(profile.fuel, 65);

    let claimed = apply_break_refill(&mut profile, t0() + Duration::minutes(11), &cfg.fuel);
    assert_eq!(claimed.claim, BreakClaim::Claimed { gained: 25 });
    assert!(claimed.changed);
    assert_eq!(profile.fuel, 96);
    assert!(profile.fuel_break_ready_at.is_none());
}

#[test]
fn break_without_regen_pays_the_flat_bonus() {
    let (mut profile, mut cfg) = pilot();
    cfg.fuel.regen_rate = 0;
    profile.fuel = 60;
    assert!(start_break(&mut profile, t0(), &cfg.fuel).changed());

    let early = apply_break_refill(&mut profile, t0() + Duration::minutes(5), &cfg.fuel);
    assert!(!early.changed);
    assert_eq!(profile.fuel, 60);
    assert!(profile.fuel_break_ready_at.is_some());

    apply_break_refill(&mut profile, t0() + Duration::minutes(11), &cfg.fuel);
    assert_eq!(profile.fuel, 85);
    assert!(profile.fuel_break_ready_at.is_none());
}

#[test]
fn a_week_of_daily_logins_pays_milestones() {
    let (mut profile, cfg) = pilot();
    let mut paid = Vec::new();
    for day in 1..=7 {
        let now = t0() + Duration::days(day);
        profile.fuel = 30;
        let outcome = check_and_update_daily_login(&mut profile, now, &cfg);
        assert!(outcome.is_new_streak);
        assert_eq!(profile.fuel, 100);
        paid.push(outcome.reward);
    }
    assert_eq!(paid, vec![10, 25, 10, 10, 10, 50, 10]);
    assert_eq!(profile.daily_streak, 8);
    assert_eq!(profile.longest_streak, 8);
    assert_eq!(profile.activity_dates.len(), 8);
}

#[test]
fn late_night_logins_use_elapsed_time_not_calendar_days() {
    let (profile, cfg) = pilot();
    let next_morning = t0() + Duration::hours(5);
    assert_eq!(
        calculate_daily_streak(&profile.last_login_date, next_morning, &cfg.streak),
        StreakCheck::SameDay
    );
    assert_eq!(
        calculate_daily_streak(&profile.last_login_date, t0() + Duration::hours(47), &cfg.streak),
        StreakCheck::NextDay
    );
    assert_eq!(
        calculate_daily_streak(&profile.last_login_date, t0() + Duration::hours(48), &cfg.streak),
        StreakCheck::Broken
    );
}

#[test]
fn a_missed_day_resets_the_streak() {
    let (mut profile, cfg) = pilot();
    profile.daily_streak = 12;
    profile.longest_streak = 12;
    let outcome = check_and_update_daily_login(&mut profile, t0() + Duration::days(3), &cfg);
    assert_eq!(outcome.reward, 10);
    assert_eq!(profile.daily_streak, 1);
    assert_eq!(profile.longest_streak, 12);
}

#[test]
fn achievements_are_granted_once() {
    let (mut profile, cfg) = pilot();
    let achievement = Achievement {
        id: "first-query".into(),
        name: "First Query".into(),
        description: "Ran a query".into(),
        icon: "terminal".into(),
        earned_at: t0().into(),
        category: AchievementCategory::Query,
        rarity: AchievementRarity::Rare,
    };
    assert!(grant_achievement(&mut profile, achievement.clone(), 40, &cfg.level));
    assert!(!grant_achievement(&mut profile, achievement, 40, &cfg.level));
    assert_eq!(profile.achievements.len(), 1);
    assert_eq!(profile.stardust, 90);
}

#[test]
fn refuel_spends_stardust_and_drops_level() {
    let (mut profile, cfg) = pilot();
    profile.fuel = 30;
    assert_eq!(profile.level, 1);
    let receipt = purchase_refuel(&mut profile, &cfg).unwrap();
    assert_eq!((receipt.fuel_gained, receipt.stardust_spent), (25, 25));
    assert_eq!(profile.stardust, 25);
    assert_eq!(profile.level, 1);
    purchase_refuel(&mut profile, &cfg).unwrap();
    assert_eq!(profile.level, 0);
    assert_eq!(
        purchase_refuel(&mut profile, &cfg),
        Err(EconomyError::InsufficientStardust {
            needed: 25,
            available: 0
        })
    );
}

#[test]
fn imported_legacy_profile_earns_badges() {
    let cfg = ProgressionConfig::default();
    let mut profile =
        import_profile(r#"{"name":"Retro","stardust":1200,"fuel":12}"#, t0(), &cfg).unwrap();
    assert_eq!(profile.level, 6);
    let badges = award_milestone_badges(&mut profile, &cfg);
    assert_eq!(badges, vec!["rising-star", "cosmic-navigator", "query-master"]);
    assert!(award_milestone_badges(&mut profile, &cfg).is_empty());
}

#[test]
fn fractional_fuel_does_not_wipe_streaks_or_rewards() {
    let (mut profile, cfg) = pilot();
    profile.daily_streak = 7;
    profile.longest_streak = 9;
    assert!(collect_stardust_pickup(&mut profile, "orb-1", 15, t0(), &cfg));
    let stardust = profile.stardust;

    let mut stored = serde_json::to_value(&profile).unwrap();
    stored["fuel"] = json!(72.5);
    let record = ProfileRecord::from_value(stored);
    assert!(!record.is_legacy());

    let mut restored = migrate_profile(record, t0() + Duration::hours(1), &cfg);
    assert_eq!(restored.fuel, 73);
    assert_eq!((restored.daily_streak, restored.longest_streak), (7, 9));
    assert_eq!(restored.achievements.len(), 1);
    assert_eq!(restored.stardust, stardust);
    assert!(!collect_stardust_pickup(&mut restored, "orb-1", 15, t0(), &cfg));
    assert_eq!(restored.stardust, stardust);
}

#[test]
fn unknown_achievement_rarity_drops_only_that_entry() {
    let (mut profile, cfg) = pilot();
    assert!(collect_stardust_pickup(&mut profile, "orb-1", 5, t0(), &cfg));
    assert!(collect_stardust_pickup(&mut profile, "orb-2", 5, t0(), &cfg));

    let mut stored = serde_json::to_value(&profile).unwrap();
    stored["achievements"][1]["rarity"] = json!("mythic");
    let mut restored = migrate_profile(ProfileRecord::from_value(stored), t0(), &cfg);
    assert_eq!(restored.achievements.len(), 1);
    assert_eq!(restored.stardust, profile.stardust);
    assert!(!collect_stardust_pickup(&mut restored, "orb-1", 5, t0(), &cfg));
}
