//! Seeded scenarios that drive the engine through the repository and check
//! its invariants. Each run builds its own in-memory store, so iterations are
//! independent and reproducible from the seed alone.

use anyhow::{Context, Result, ensure};
use chrono::{DateTime, Duration, TimeZone, Utc};
use pilot_engine::constants::{FUEL_MAX, PROFILE_STORAGE_KEY};
use pilot_engine::{
    BreakClaim, BreakStart, MissionReport, PilotProfile, ProfileRepository, ProgressionConfig, Timestamp,
    add_bookmark, apply_break_refill, apply_passive_regen, award_milestone_badges,
    check_and_update_daily_login, collect_stardust_pickup, complete_mission, complete_sub_mission,
    import_profile, purchase_refuel, rank_title, record_simulation_run, spend_fuel, start_break,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde_json::{Value, json};
use std::collections::BTreeSet;

use crate::store::{CountingObserver, MemoryStore};

pub struct ScenarioCtx<'a> {
    pub seed: u64,
    pub config: &'a ProgressionConfig,
}

impl ScenarioCtx<'_> {
    fn rng(&self) -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(self.seed)
    }

    fn repository(&self) -> Repo {
        ProfileRepository::new(
            MemoryStore::default(),
            CountingObserver::default(),
            self.config.clone(),
        )
    }
}

type Repo = ProfileRepository<MemoryStore, CountingObserver>;

pub type ScenarioFn = fn(&ScenarioCtx<'_>) -> Result<String>;

pub struct Scenario {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub run: ScenarioFn,
}

pub const CATALOG: [Scenario; 7] = [
    Scenario {
        key: "smoke",
        name: "Smoke Test",
        description: "Register, persist, reload and log in on the next day",
        run: smoke,
    },
    Scenario {
        key: "streak",
        name: "Daily Streaks",
        description: "Random login gaps against a reference streak model",
        run: streak,
    },
    Scenario {
        key: "fuel",
        name: "Passive Regeneration",
        description: "Regen amounts, idempotence and split-free accrual",
        run: fuel,
    },
    Scenario {
        key: "break",
        name: "Break Refill",
        description: "Schedule, wait and claim a break through the load pipeline",
        run: break_refill,
    },
    Scenario {
        key: "migration",
        name: "Profile Migration",
        description: "Random legacy records load, persist once and stay stable",
        run: migration,
    },
    Scenario {
        key: "economy",
        name: "Stardust Economy",
        description: "Refuel, simulations, missions and pickups keep the ledger exact",
        run: economy,
    },
    Scenario {
        key: "soak",
        name: "Soak Test",
        description: "Long random action sequences through the repository",
        run: soak,
    },
];

#[must_use]
pub fn find_scenario(key: &str) -> Option<&'static Scenario> {
    let key = key.to_lowercase();
    CATALOG.iter().find(|scenario| scenario.key == key)
}

pub fn list_scenarios() -> impl Iterator<Item = (&'static str, &'static str)> {
    CATALOG
        .iter()
        .map(|scenario| (scenario.key, scenario.description))
}

/// Expand `all` into every catalog key, keeping the requested order.
#[must_use]
pub fn expand_scenarios(requested: &[String]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for key in requested {
        if key.eq_ignore_ascii_case("all") {
            keys.extend(CATALOG.iter().map(|scenario| scenario.key.to_string()));
        } else {
            keys.push(key.clone());
        }
    }
    let mut seen = BTreeSet::new();
    keys.retain(|key| seen.insert(key.clone()));
    keys
}

fn start_time(rng: &mut ChaCha20Rng) -> DateTime<Utc> {
    let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().unwrap_or_default();
    base + Duration::minutes(rng.gen_range(0..365 * 24 * 60))
}

fn check_consistency(profile: &PilotProfile, cfg: &ProgressionConfig) -> Result<()> {
    ensure!(profile.fuel <= FUEL_MAX, "fuel {} exceeds the tank", profile.fuel);
    ensure!(
        profile.level == cfg.level.level_for(profile.stardust),
        "level {} does not match {} stardust",
        profile.level,
        profile.stardust
    );
    ensure!(profile.rank == rank_title(profile.level), "rank {} is stale", profile.rank);
    ensure!(
        profile.experience_points == profile.stardust,
        "experience points drifted from stardust"
    );
    ensure!(
        profile.longest_streak >= profile.daily_streak,
        "longest streak {} below current {}",
        profile.longest_streak,
        profile.daily_streak
    );
    let ids: BTreeSet<&str> = profile.achievements.iter().map(|a| a.id.as_str()).collect();
    ensure!(
        ids.len() == profile.achievements.len(),
        "duplicate achievement ids"
    );
    Ok(())
}

fn smoke(ctx: &ScenarioCtx<'_>) -> Result<String> {
    let mut rng = ctx.rng();
    let repo = ctx.repository();
    let t0 = start_time(&mut rng);

    let profile = PilotProfile::register("smoke", "PILOT", t0, repo.config());
    repo.save(&profile)?;
    let loaded = repo.load(t0)?.context("profile missing after save")?;
    ensure!(loaded.profile == profile, "reload changed the profile");
    ensure!(!loaded.persisted, "fresh profile should not need repair");

    let next_day = t0 + Duration::milliseconds(repo.config().streak.day_ms);
    let login = repo.login(next_day)?.context("profile missing at login")?;
    ensure!(login.outcome.streak == 2, "streak {} after one day", login.outcome.streak);
    ensure!(
        login.outcome.reward == repo.config().streak.reward_for(2),
        "unexpected login reward {}",
        login.outcome.reward
    );
    check_consistency(&login.profile, repo.config())?;
    ensure!(repo.observer().count() == 2, "expected two broadcasts");

    Ok(format!(
        "{} level {} ({}) with {} stardust",
        login.profile.callsign, login.profile.level, login.profile.rank, login.profile.stardust
    ))
}

fn streak(ctx: &ScenarioCtx<'_>) -> Result<String> {
    let mut rng = ctx.rng();
    let cfg = ctx.config;
    let day_ms = cfg.streak.day_ms;
    let mut last = start_time(&mut rng);
    let mut profile = PilotProfile::register("streak", "PILOT", last, cfg);
    let mut expected = 1_u32;
    let mut longest = 1_u32;
    let mut breaks = 0;

    for login in 0..60 {
        let gap_ms = match rng.gen_range(0..10) {
            0 | 1 => rng.gen_range(0..day_ms),
            2..=7 => rng.gen_range(day_ms..2 * day_ms),
            _ => rng.gen_range(2 * day_ms..6 * day_ms),
        };
        let now = last + Duration::milliseconds(gap_ms);
        profile.fuel = rng.gen_range(0..=FUEL_MAX);
        let outcome = check_and_update_daily_login(&mut profile, now, cfg);

        let (streak, reward) = match gap_ms / day_ms {
            0 => {
                ensure!(
                    outcome.reward == 0 && !outcome.is_new_streak,
                    "login {login}: same-day login paid out"
                );
                continue;
            }
            1 => (expected + 1, cfg.streak.reward_for(expected + 1)),
            _ => {
                breaks += 1;
                (1, cfg.streak.base_reward)
            }
        };
        expected = streak;
        longest = longest.max(streak);
        last = now;
        ensure!(outcome.streak == expected, "login {login}: streak {} != {expected}", outcome.streak);
        ensure!(outcome.reward == reward, "login {login}: reward {} != {reward}", outcome.reward);
        ensure!(
            profile.fuel == cfg.fuel.daily_refuel_target.min(FUEL_MAX),
            "login {login}: tank not refilled"
        );
        ensure!(profile.longest_streak == longest, "login {login}: longest streak drifted");
        check_consistency(&profile, cfg)?;
    }

    Ok(format!(
        "final streak {expected}, longest {longest}, {breaks} break(s)"
    ))
}

fn fuel(ctx: &ScenarioCtx<'_>) -> Result<String> {
    let mut rng = ctx.rng();
    let cfg = &ctx.config.fuel;
    let t0 = start_time(&mut rng);
    let interval = cfg.regen_interval_ms;
    let mut profile = PilotProfile::register("fuel", "PILOT", t0, ctx.config);

    let start = rng.gen_range(0..FUEL_MAX);
    let whole = rng.gen_range(0..200_i64);
    let partial = rng.gen_range(0..interval);
    profile.fuel = start;
    let now = t0 + Duration::milliseconds(whole * interval + partial);

    let changed = apply_passive_regen(&mut profile, now, cfg);
    let gained = u32::try_from(whole)?.saturating_mul(cfg.regen_rate);
    let expected = start.saturating_add(gained).min(FUEL_MAX);
    ensure!(profile.fuel == expected, "regen gave {} expected {expected}", profile.fuel);
    ensure!(changed == (expected != start), "changed flag {changed} for {start} -> {expected}");

    let snapshot = profile.clone();
    ensure!(!apply_passive_regen(&mut profile, now, cfg), "second regen at the same instant changed fuel");
    ensure!(profile == snapshot, "second regen modified the profile");

    let mut single = PilotProfile::register("one", "PILOT", t0, ctx.config);
    single.fuel = 0;
    let mut split = single.clone();
    let total = rng.gen_range(1..150_i64);
    let cut = rng.gen_range(0..=total);
    apply_passive_regen(&mut single, t0 + Duration::milliseconds(total * interval), cfg);
    apply_passive_regen(&mut split, t0 + Duration::milliseconds(cut * interval), cfg);
    apply_passive_regen(&mut split, t0 + Duration::milliseconds(total * interval), cfg);
    ensure!(single.fuel == split.fuel, "split {cut}/{total} drifted: {} vs {}", single.fuel, split.fuel);

    profile.fuel_last_regen_at = Some(Timestamp::raw("yesterday-ish"));
    ensure!(apply_passive_regen(&mut profile, now, cfg) || profile.is_tank_full(), "corrupt anchor not reported");

    Ok(format!("{start} -> {expected} after {whole} interval(s)"))
}

fn break_refill(ctx: &ScenarioCtx<'_>) -> Result<String> {
    let mut rng = ctx.rng();
    let repo = ctx.repository();
    let cfg = &repo.config().fuel;
    let t0 = start_time(&mut rng);
    let interval = cfg.regen_interval_ms;
    let cooldown = cfg.break_cooldown_ms;

    let mut profile = PilotProfile::register("break", "PILOT", t0, repo.config());
    let start = rng.gen_range(0..FUEL_MAX - 1);
    profile.fuel = start;
    let BreakStart::Scheduled { ready_at } = start_break(&mut profile, t0, cfg) else {
        anyhow::bail!("break was not scheduled at {start} fuel");
    };
    ensure!(ready_at == t0 + Duration::milliseconds(cooldown), "wrong ready time");
    ensure!(
        start_break(&mut profile, t0 + Duration::milliseconds(1), cfg)
            == BreakStart::AlreadyPending { ready_at },
        "pending break was overwritten"
    );
    repo.save(&profile)?;

    let halfway = cooldown / 2;
    let pending = repo
        .load(t0 + Duration::milliseconds(halfway))?
        .context("profile missing")?;
    ensure!(
        matches!(pending.refill.claim, BreakClaim::Pending { .. }),
        "break claimed early: {:?}",
        pending.refill.claim
    );
    let regen = |fuel: u32, ms: i64| -> Result<u32> {
        let intervals = u32::try_from(ms / interval)?;
        Ok(fuel.saturating_add(intervals.saturating_mul(cfg.regen_rate)).min(FUEL_MAX))
    };
    let mid = regen(start, halfway)?;
    ensure!(pending.profile.fuel == mid, "halfway fuel {} != {mid}", pending.profile.fuel);

    let end = cooldown + interval;
    let claimed = repo
        .load(t0 + Duration::milliseconds(end))?
        .context("profile missing")?;
    let before_claim = regen(mid, end - halfway)?;
    let expected = before_claim.saturating_add(cfg.break_gain).min(FUEL_MAX);
    ensure!(
        claimed.refill.claim
            == BreakClaim::Claimed {
                gained: expected - before_claim
            },
        "unexpected claim {:?}",
        claimed.refill.claim
    );
    ensure!(claimed.profile.fuel == expected, "final fuel {} != {expected}", claimed.profile.fuel);
    ensure!(claimed.persisted, "claimed break was not persisted");
    ensure!(claimed.profile.fuel_break_ready_at.is_none(), "schedule not cleared");

    let mut corrupt = claimed.profile;
    corrupt.fuel_break_ready_at = Some(Timestamp::raw("after lunch"));
    let repaired = apply_break_refill(&mut corrupt, t0 + Duration::milliseconds(end), cfg);
    ensure!(
        repaired.claim == BreakClaim::Cleared && repaired.changed,
        "corrupt schedule not cleared"
    );

    Ok(format!("{start} -> {mid} -> {expected}"))
}

fn legacy_record(rng: &mut ChaCha20Rng) -> Value {
    let mut record = serde_json::Map::new();
    if rng.gen_bool(0.6) {
        record.insert("callsign".into(), json!(format!("ACE{}", rng.gen_range(0..100))));
    } else if rng.gen_bool(0.5) {
        record.insert("name".into(), json!("Old Timer"));
    }
    if rng.gen_bool(0.7) {
        record.insert("stardust".into(), json!(rng.gen_range(-100..50_000)));
    }
    if rng.gen_bool(0.7) {
        record.insert("fuel".into(), json!(rng.gen_range(-10.0..130.0_f64)));
    }
    if rng.gen_bool(0.5) {
        record.insert("completedMissions".into(), json!(["mission-00", "mission-01"]));
    }
    if rng.gen_bool(0.4) {
        record.insert("lastLoginDate".into(), json!("2024-11-20T10:00:00.000Z"));
    }
    if rng.gen_bool(0.3) {
        record.insert("activityDates".into(), json!(["2024-11-19", "2024-11-20", 17]));
    }
    if rng.gen_bool(0.2) {
        record.insert("fuelLastRegenAt".into(), json!("???"));
    }
    Value::Object(record)
}

fn migration(ctx: &ScenarioCtx<'_>) -> Result<String> {
    let mut rng = ctx.rng();
    let repo = ctx.repository();
    let t0 = start_time(&mut rng);
    let record = legacy_record(&mut rng);
    repo.store().seed(PROFILE_STORAGE_KEY, record.to_string());

    let first = repo.load(t0)?.context("legacy profile did not load")?;
    ensure!(first.migrated, "legacy record was not migrated");
    ensure!(first.persisted, "migrated record was not persisted");
    check_consistency(&first.profile, repo.config())?;
    ensure!(!first.profile.activity_dates.is_empty(), "activity log left empty");
    let stored = repo.store().peek(PROFILE_STORAGE_KEY).context("nothing persisted")?;
    ensure!(stored.contains("\"experiencePoints\""), "persisted record lacks current fields");

    let second = repo.load(t0)?.context("migrated profile did not reload")?;
    ensure!(!second.migrated && !second.persisted, "migrated record changed on reload");
    ensure!(second.profile == first.profile, "reload differs from first migration");

    let guest = import_profile("[\"not\", \"a\", \"profile\"]", t0, repo.config())?;
    ensure!(guest.callsign == pilot_engine::constants::GUEST_CALLSIGN, "non-object import is not a guest");

    Ok(format!(
        "{} migrated to level {} with {} fuel",
        first.profile.callsign, first.profile.level, first.profile.fuel
    ))
}

fn economy(ctx: &ScenarioCtx<'_>) -> Result<String> {
    let mut rng = ctx.rng();
    let cfg = ctx.config;
    let t0 = start_time(&mut rng);
    let mut profile = PilotProfile::register("ledger", "PILOT", t0, cfg);
    let mut ledger = profile.stardust;

    let cost = cfg.fuel.simulation_cost;
    while profile.fuel >= cost && cost > 0 {
        spend_fuel(&mut profile, cost)?;
    }
    if cost > 0 {
        let before = profile.fuel;
        ensure!(spend_fuel(&mut profile, cost).is_err(), "run allowed on an empty tank");
        ensure!(profile.fuel == before, "refused run still spent fuel");
    }

    let title = format!("drill {}", rng.gen_range(0..1000));
    let first = record_simulation_run(&mut profile, &title, "SigninLogs | take 10", t0, cfg);
    let repeat = record_simulation_run(&mut profile, &title, "SigninLogs | take 10", t0, cfg);
    ensure!(first.awarded == cfg.rewards.simulation_reward, "first run not rewarded");
    ensure!(repeat.awarded == 0, "repeat run rewarded again");
    ensure!(profile.queries_executed == 2, "queries not counted");
    ledger += first.awarded;

    let orientation = format!("{}/briefing", cfg.rewards.orientation_mission);
    let report = complete_sub_mission(&mut profile, &orientation, cfg);
    ensure!(report.first_completion, "orientation sub-mission not new");
    ensure!(complete_sub_mission(&mut profile, &orientation, cfg) == MissionReport::default(), "sub-mission paid twice");
    ledger += report.stardust_reward;
    ledger += complete_mission(&mut profile, &orientation, cfg);
    ensure!(complete_mission(&mut profile, &orientation, cfg) == 0, "mission bonus paid twice");

    let pickup = rng.gen_range(1..100);
    ensure!(collect_stardust_pickup(&mut profile, "briefing-orb", pickup, t0, cfg), "pickup refused");
    ensure!(!collect_stardust_pickup(&mut profile, "briefing-orb", pickup, t0, cfg), "pickup collected twice");
    ledger += pickup;

    ensure!(add_bookmark(&mut profile, "mission-01/joins", 0, &cfg.level), "bookmark not saved");
    ensure!(!add_bookmark(&mut profile, "mission-01/joins", 0, &cfg.level), "bookmark saved twice");

    let mut refuels = 0;
    while !profile.is_tank_full() && profile.stardust >= cfg.fuel.refuel_cost {
        let receipt = purchase_refuel(&mut profile, cfg)?;
        ledger -= receipt.stardust_spent;
        refuels += 1;
    }
    ensure!(profile.stardust == ledger, "stardust {} != ledger {ledger}", profile.stardust);
    check_consistency(&profile, cfg)?;

    let badges = award_milestone_badges(&mut profile, cfg);
    ensure!(award_milestone_badges(&mut profile, cfg).is_empty(), "badges awarded twice");

    Ok(format!(
        "ledger {ledger} stardust after {refuels} refuel(s), {} new badge(s)",
        badges.len()
    ))
}

fn soak(ctx: &ScenarioCtx<'_>) -> Result<String> {
    let mut rng = ctx.rng();
    let repo = ctx.repository();
    let mut now = start_time(&mut rng);
    repo.save(&PilotProfile::register("soak", "PILOT", now, repo.config()))?;

    for step in 0..300 {
        now += Duration::milliseconds(rng.gen_range(0..6 * 60 * 60 * 1000));
        let choice = rng.gen_range(0..8);
        let pick: u32 = rng.gen_range(0..12);
        let at = now;
        let updated = repo
            .update(at, |profile, cfg| match choice {
                0 => check_and_update_daily_login(profile, at, cfg).changed,
                1 => start_break(profile, at, &cfg.fuel).changed(),
                2 => purchase_refuel(profile, cfg).is_ok(),
                3 => spend_fuel(profile, cfg.fuel.simulation_cost).is_ok(),
                4 => complete_sub_mission(profile, &format!("mission-0{}/s{pick}", pick % 4), cfg)
                    .first_completion,
                5 => record_simulation_run(profile, &format!("sim {pick}"), "x", at, cfg).awarded > 0,
                6 => collect_stardust_pickup(profile, &format!("orb-{pick}"), u64::from(pick) * 3, at, cfg),
                _ => !award_milestone_badges(profile, cfg).is_empty(),
            })
            .with_context(|| format!("step {step}"))?
            .context("profile vanished")?;
        check_consistency(&updated.profile, repo.config()).with_context(|| format!("step {step}"))?;
    }

    let last = repo.load(now)?.context("profile vanished")?;
    ensure!(!last.persisted, "final reload should be clean");
    Ok(format!(
        "level {} after 300 steps, {} broadcast(s)",
        last.profile.level,
        repo.observer().count()
    ))
}
