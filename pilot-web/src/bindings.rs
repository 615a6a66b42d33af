//! JavaScript entry points used by the academy pages.
//!
//! Every call reads the clock once, loads the stored profile through the
//! repository (migrate, regen, break refill), applies one action and persists
//! when the action changed something.

use chrono::{DateTime, Utc};
use pilot_engine::{
    EconomyError, PilotProfile, ProfileRepository, ProgressionConfig, add_bookmark,
    award_milestone_badges, break_remaining, collect_stardust_pickup, complete_mission,
    complete_sub_mission, export_file_name, export_profile_json, import_profile,
    numbers::floor_f64_to_u64, purchase_refuel, record_simulation_run, reset_bookmarks,
    reset_progress, reset_rewards, spend_fuel, start_break,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::dom::{now, to_js};
use crate::events::BroadcastObserver;
use crate::storage::WebStore;

type WebRepository = ProfileRepository<WebStore, BroadcastObserver>;

fn repository() -> Result<WebRepository, JsValue> {
    let store = WebStore::local().map_err(|err| JsValue::from_str(&err.to_string()))?;
    Ok(ProfileRepository::new(
        store,
        BroadcastObserver,
        ProgressionConfig::default(),
    ))
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn no_profile() -> JsValue {
    JsValue::from_str("no pilot profile stored")
}

/// Apply `action` to the stored profile and hand its outcome to JavaScript.
fn with_profile<T, F>(action: F) -> Result<JsValue, JsValue>
where
    T: Serialize,
    F: FnOnce(&mut PilotProfile, &ProgressionConfig, DateTime<Utc>) -> T,
{
    let at = now();
    let updated = repository()?
        .update(at, |profile, cfg| action(profile, cfg, at))
        .map_err(|err| JsValue::from_str(&format!("{err:#}")))?
        .ok_or_else(no_profile)?;
    to_js(&updated.outcome)
}

fn try_with_profile<T, F>(action: F) -> Result<JsValue, JsValue>
where
    T: Serialize,
    F: FnOnce(&mut PilotProfile, &ProgressionConfig, DateTime<Utc>) -> Result<T, EconomyError>,
{
    let at = now();
    let updated = repository()?
        .update(at, |profile, cfg| action(profile, cfg, at))
        .map_err(|err| JsValue::from_str(&format!("{err:#}")))?
        .ok_or_else(no_profile)?;
    to_js(&updated.outcome.map_err(js_error)?)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BreakStatus {
    scheduled: bool,
    ready_at: Option<String>,
    remaining_ms: Option<i64>,
}

/// Reply to `startFuelBreak`: what happened plus the resulting schedule.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BreakStartReply {
    outcome: &'static str,
    #[serde(flatten)]
    status: BreakStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportedProfile {
    file_name: String,
    json: String,
}

fn break_status(profile: &PilotProfile, at: DateTime<Utc>) -> BreakStatus {
    BreakStatus {
        scheduled: profile.fuel_break_ready_at.is_some(),
        ready_at: profile
            .fuel_break_ready_at
            .as_ref()
            .map(ToString::to_string),
        remaining_ms: break_remaining(profile, at).map(|left| left.num_milliseconds()),
    }
}

/// The stored profile after the load pipeline, or `null`.
///
/// # Errors
/// Returns an error if storage is unavailable.
#[wasm_bindgen(js_name = loadProfile)]
pub fn load_profile() -> Result<JsValue, JsValue> {
    let loaded = repository()?.load(now()).map_err(js_error)?;
    to_js(&loaded.map(|loaded| loaded.profile))
}

/// Create and persist a new pilot.
///
/// # Errors
/// Returns an error if storage is unavailable.
#[wasm_bindgen(js_name = registerPilot)]
pub fn register_pilot(callsign: &str, prefix: &str) -> Result<JsValue, JsValue> {
    let repo = repository()?;
    let profile = PilotProfile::register(callsign, prefix, now(), repo.config());
    repo.save(&profile).map_err(js_error)?;
    to_js(&profile)
}

/// Run the daily login check.
///
/// # Errors
/// Returns an error if storage is unavailable or no pilot is registered.
#[wasm_bindgen(js_name = dailyLogin)]
pub fn daily_login() -> Result<JsValue, JsValue> {
    let login = repository()?
        .login(now())
        .map_err(|err| JsValue::from_str(&format!("{err:#}")))?
        .ok_or_else(no_profile)?;
    to_js(&login.outcome)
}

/// Schedule a break refill. Resolves to `{ outcome, scheduled, readyAt,
/// remainingMs }` where `outcome` is `"scheduled"`, `"alreadyPending"` or
/// `"tankFull"`.
///
/// # Errors
/// Returns an error if storage is unavailable or no pilot is registered.
#[wasm_bindgen(js_name = startFuelBreak)]
pub fn start_fuel_break() -> Result<JsValue, JsValue> {
    with_profile(|profile, cfg, at| BreakStartReply {
        outcome: start_break(profile, at, &cfg.fuel).label(),
        status: break_status(profile, at),
    })
}

/// Break schedule of the stored profile. Loading also claims a due break.
///
/// # Errors
/// Returns an error if storage is unavailable or no pilot is registered.
#[wasm_bindgen(js_name = fuelBreakStatus)]
pub fn fuel_break_status() -> Result<JsValue, JsValue> {
    with_profile(|profile, _, at| break_status(profile, at))
}

/// Trade stardust for fuel.
///
/// # Errors
/// Returns the refusal message when the tank is full or stardust is short.
#[wasm_bindgen(js_name = purchaseRefuel)]
pub fn purchase_refuel_js() -> Result<JsValue, JsValue> {
    try_with_profile(|profile, cfg, _| purchase_refuel(profile, cfg))
}

/// Spend fuel before a simulation run. Resolves to the fuel left.
///
/// # Errors
/// Returns the refusal message when fuel is short.
#[wasm_bindgen(js_name = startSimulation)]
pub fn start_simulation(cost: u32) -> Result<JsValue, JsValue> {
    try_with_profile(|profile, _, _| spend_fuel(profile, cost))
}

/// Book a finished simulation run.
///
/// # Errors
/// Returns an error if storage is unavailable or no pilot is registered.
#[wasm_bindgen(js_name = finishSimulation)]
pub fn finish_simulation(title: &str, code: &str) -> Result<JsValue, JsValue> {
    with_profile(|profile, cfg, at| record_simulation_run(profile, title, code, at, cfg))
}

/// Collect a briefing pickup.
///
/// # Errors
/// Returns an error if storage is unavailable or no pilot is registered.
#[wasm_bindgen(js_name = collectStardust)]
pub fn collect_stardust(pickup_id: &str, amount: f64) -> Result<JsValue, JsValue> {
    let amount = floor_f64_to_u64(amount);
    with_profile(|profile, cfg, at| collect_stardust_pickup(profile, pickup_id, amount, at, cfg))
}

/// Mark a sub-mission complete.
///
/// # Errors
/// Returns an error if storage is unavailable or no pilot is registered.
#[wasm_bindgen(js_name = completeSubMission)]
pub fn complete_sub_mission_js(slug: &str) -> Result<JsValue, JsValue> {
    with_profile(|profile, cfg, _| complete_sub_mission(profile, slug, cfg))
}

/// Mark a mission complete and pay its bonus.
///
/// # Errors
/// Returns an error if storage is unavailable or no pilot is registered.
#[wasm_bindgen(js_name = completeMission)]
pub fn complete_mission_js(slug: &str) -> Result<JsValue, JsValue> {
    with_profile(|profile, cfg, _| complete_mission(profile, slug, cfg))
}

/// Save a research-log bookmark.
///
/// # Errors
/// Returns an error if storage is unavailable or no pilot is registered.
#[wasm_bindgen(js_name = addBookmark)]
pub fn add_bookmark_js(slug: &str) -> Result<JsValue, JsValue> {
    with_profile(|profile, cfg, _| add_bookmark(profile, slug, 0, &cfg.level))
}

/// Unlock earned milestone badges.
///
/// # Errors
/// Returns an error if storage is unavailable or no pilot is registered.
#[wasm_bindgen(js_name = awardMilestoneBadges)]
pub fn award_milestone_badges_js() -> Result<JsValue, JsValue> {
    with_profile(|profile, cfg, _| award_milestone_badges(profile, cfg))
}

/// Clear missions (`"progress"`), bookmarks (`"bookmarks"`) or achievements
/// (`"rewards"`).
///
/// # Errors
/// Returns an error for an unknown scope, or if storage is unavailable.
#[wasm_bindgen(js_name = resetProfile)]
pub fn reset_profile(scope: &str) -> Result<JsValue, JsValue> {
    let reset: fn(&mut PilotProfile) -> bool = match scope {
        "progress" => reset_progress,
        "bookmarks" => reset_bookmarks,
        "rewards" => reset_rewards,
        other => return Err(JsValue::from_str(&format!("unknown reset scope: {other}"))),
    };
    with_profile(|profile, _, _| reset(profile))
}

/// Export the stored profile as `{ fileName, json }`.
///
/// # Errors
/// Returns an error if storage is unavailable or no pilot is registered.
#[wasm_bindgen(js_name = exportProfile)]
pub fn export_profile() -> Result<JsValue, JsValue> {
    let at = now();
    let loaded = repository()?
        .load(at)
        .map_err(js_error)?
        .ok_or_else(no_profile)?;
    to_js(&ExportedProfile {
        file_name: export_file_name(at),
        json: export_profile_json(&loaded.profile).map_err(js_error)?,
    })
}

/// Replace the stored profile with an uploaded one.
///
/// # Errors
/// Returns an error if the text is not JSON or storage is unavailable.
#[wasm_bindgen(js_name = importProfile)]
pub fn import_profile_js(json: &str) -> Result<JsValue, JsValue> {
    let repo = repository()?;
    let profile = import_profile(json, now(), repo.config()).map_err(js_error)?;
    repo.save(&profile).map_err(js_error)?;
    to_js(&profile)
}

/// Remove the stored profile.
///
/// # Errors
/// Returns an error if storage is unavailable.
#[wasm_bindgen(js_name = clearProfile)]
pub fn clear_profile() -> Result<(), JsValue> {
    repository()?.clear().map_err(js_error)
}

/// # Errors
/// Returns an error if the progress cannot be converted.
#[wasm_bindgen(js_name = levelProgress)]
pub fn level_progress_js(stardust: f64) -> Result<JsValue, JsValue> {
    to_js(&pilot_engine::level_progress(floor_f64_to_u64(stardust)))
}

#[wasm_bindgen(js_name = rankTitle)]
#[must_use]
pub fn rank_title_js(level: u32) -> String {
    pilot_engine::rank_title(level).to_string()
}

#[wasm_bindgen(js_name = streakMultiplier)]
#[must_use]
pub fn streak_multiplier_js(streak: u32) -> f64 {
    pilot_engine::streak_multiplier(streak)
}
