use chrono::{DateTime, Duration, TimeZone, Utc};
use pilot_engine::{
    PilotProfile, ProgressionConfig, apply_break_refill, apply_passive_regen, calculate_level,
    check_and_update_daily_login, collect_stardust_pickup, complete_sub_mission, level_progress,
    migrate_value, purchase_refuel, rank_title, record_simulation_run, spend_fuel,
    stardust_for_level, start_break,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde_json::{Value, json};

const SEEDS: [u64; 4] = [0x5EED, 0xA57_0001, 0xC0FFEE, 0x0BAD_F00D];

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

fn assert_derived_fields(profile: &PilotProfile) {
    assert!(profile.fuel <= 100, "fuel {} exceeds the tank", profile.fuel);
    assert_eq!(profile.level, calculate_level(profile.stardust));
    assert_eq!(profile.experience_points, profile.stardust);
    assert_eq!(profile.rank, rank_title(profile.level));
    assert!(profile.longest_streak >= profile.daily_streak);
}

#[test]
fn level_is_monotonic_in_stardust() {
    let mut previous = 0;
    for stardust in (0..=50_000_u64).step_by(7) {
        let level = calculate_level(stardust);
        assert!(level >= previous, "level dropped at {stardust}");
        previous = level;
    }
}

#[test]
fn level_thresholds_round_trip() {
    for level in 0..=500 {
        let threshold = stardust_for_level(level);
        assert_eq!(calculate_level(threshold), level);
        if threshold > 0 {
            assert_eq!(calculate_level(threshold - 1), level - 1);
        }
        assert!(level_progress(threshold).percentage.abs() < f64::EPSILON);
    }
}

#[test]
fn random_action_sequences_keep_the_profile_consistent() {
    let cfg = ProgressionConfig::default();
    for seed in SEEDS {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut now = epoch();
        let mut profile = PilotProfile::register("sweep", "PILOT", now, &cfg);

        for step in 0..2_000 {
            now += Duration::milliseconds(rng.gen_range(0..3 * 60 * 60 * 1000));
            match rng.gen_range(0..9) {
                0 => {
                    apply_passive_regen(&mut profile, now, &cfg.fuel);
                }
                1 => {
                    start_break(&mut profile, now, &cfg.fuel);
                }
                2 => {
                    apply_break_refill(&mut profile, now, &cfg.fuel);
                }
                3 => {
                    let _ = purchase_refuel(&mut profile, &cfg);
                }
                4 => {
                    let before = profile.fuel;
                    match spend_fuel(&mut profile, rng.gen_range(0..=120)) {
                        Ok(left) => assert!(left <= before),
                        Err(_) => assert_eq!(profile.fuel, before),
                    }
                }
                5 => {
                    let slug = format!("mission-0{}/part-{}", rng.gen_range(0..4), rng.gen_range(0..6));
                    complete_sub_mission(&mut profile, &slug, &cfg);
                }
                6 => {
                    check_and_update_daily_login(&mut profile, now, &cfg);
                }
                7 => {
                    let id = format!("pickup-{}", rng.gen_range(0..40));
                    collect_stardust_pickup(&mut profile, &id, rng.gen_range(0..60), now, &cfg);
                }
                _ => {
                    let title = format!("drill {}", rng.gen_range(0..25));
                    record_simulation_run(&mut profile, &title, "SigninLogs | take 5", now, &cfg);
                }
            }
            assert_derived_fields(&profile);
            let ids: std::collections::BTreeSet<_> =
                profile.achievements.iter().map(|a| a.id.as_str()).collect();
            assert_eq!(ids.len(), profile.achievements.len(), "seed {seed} step {step}");
        }
    }
}

#[test]
fn regen_is_idempotent_at_a_fixed_instant() {
    let cfg = ProgressionConfig::default();
    let mut profile = PilotProfile::register("idle", "PILOT", epoch(), &cfg);
    profile.fuel = 10;
    let later = epoch() + Duration::minutes(17);
    assert!(apply_passive_regen(&mut profile, later, &cfg.fuel));
    let snapshot = profile.clone();
    assert!(!apply_passive_regen(&mut profile, later, &cfg.fuel));
    assert_eq!(profile, snapshot);
}

#[test]
fn regen_splits_at_whole_minutes_do_not_drift() {
    let cfg = ProgressionConfig::default();
    let mut single = PilotProfile::register("one", "PILOT", epoch(), &cfg);
    single.fuel = 0;
    let mut split = single.clone();

    apply_passive_regen(&mut single, epoch() + Duration::minutes(130), &cfg.fuel);
    apply_passive_regen(&mut split, epoch() + Duration::minutes(70), &cfg.fuel);
    apply_passive_regen(&mut split, epoch() + Duration::minutes(130), &cfg.fuel);
    assert_eq!(single.fuel, split.fuel);

    let mut rng = ChaCha20Rng::seed_from_u64(SEEDS[0]);
    for _ in 0..200 {
        let total = rng.gen_range(1..90_i64);
        let cut = rng.gen_range(0..=total);
        let mut whole = PilotProfile::register("a", "PILOT", epoch(), &cfg);
        whole.fuel = 5;
        let mut parts = whole.clone();
        apply_passive_regen(&mut whole, epoch() + Duration::minutes(total), &cfg.fuel);
        apply_passive_regen(&mut parts, epoch() + Duration::minutes(cut), &cfg.fuel);
        apply_passive_regen(&mut parts, epoch() + Duration::minutes(total), &cfg.fuel);
        assert_eq!(whole.fuel, parts.fuel, "split {cut}/{total}");
    }
}

fn random_record(rng: &mut ChaCha20Rng) -> Value {
    let mut record = serde_json::Map::new();
    if rng.gen_bool(0.5) {
        record.insert("callsign".into(), json!(format!("pilot{}", rng.gen_range(0..99))));
    }
    if rng.gen_bool(0.3) {
        record.insert("name".into(), json!("Legacy Name"));
    }
    if rng.gen_bool(0.6) {
        record.insert("stardust".into(), json!(rng.gen_range(-50.0..20_000.0_f64)));
    }
    if rng.gen_bool(0.6) {
        record.insert("fuel".into(), json!(rng.gen_range(-20.0..140.0_f64)));
    }
    if rng.gen_bool(0.4) {
        record.insert("bookmarks".into(), json!(["mission-01/a", "mission-02/b", "mission-01/a"]));
    }
    if rng.gen_bool(0.4) {
        record.insert("lastLoginDate".into(), json!("2024-12-30T08:00:00.000Z"));
    }
    if rng.gen_bool(0.3) {
        record.insert("activityDates".into(), json!(["2024-12-01", "garbage"]));
    }
    if rng.gen_bool(0.2) {
        record.insert("fuelLastRegenAt".into(), json!("not a time"));
    }
    Value::Object(record)
}

#[test]
fn migration_is_idempotent_for_random_records() {
    let cfg = ProgressionConfig::default();
    for seed in SEEDS {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        for _ in 0..250 {
            let once = migrate_value(random_record(&mut rng), epoch(), &cfg);
            assert_derived_fields(&once);
            assert!(!once.activity_dates.is_empty());
            let later = epoch() + Duration::days(3);
            let twice = migrate_value(serde_json::to_value(&once).unwrap(), later, &cfg);
            assert_eq!(once, twice);
        }
    }
}
