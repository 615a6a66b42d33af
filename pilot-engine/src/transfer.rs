//! Profile import and export for the data-tools surface.
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::ProfileError;
use crate::config::ProgressionConfig;
use crate::constants::{DEFAULT_PREFIX, EXPORT_FILE_PREFIX, FUEL_MAX, GUEST_CALLSIGN};
use crate::migrate::migrate_value;
use crate::profile::{PilotProfile, date_key};

/// Pretty-printed JSON of the profile, as offered for download.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn export_profile_json(profile: &PilotProfile) -> Result<String, ProfileError> {
    Ok(serde_json::to_string_pretty(profile)?)
}

/// Download name of an export taken at `now`.
#[must_use]
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("{EXPORT_FILE_PREFIX}{}.json", date_key(now))
}

/// Parse an uploaded profile and bring it up to the current schema.
///
/// Objects go through the migrator, so partial or legacy files import with
/// defaults filled. Any other JSON value (array, number, null) imports as a
/// fresh guest record.
///
/// # Errors
///
/// Returns [`ProfileError::Json`] when the text is not JSON.
pub fn import_profile(
    json: &str,
    now: DateTime<Utc>,
    cfg: &ProgressionConfig,
) -> Result<PilotProfile, ProfileError> {
    let value: Value = serde_json::from_str(json)?;
    let value = if value.is_object() {
        value
    } else {
        log::warn!("imported profile is not an object; starting a guest record");
        guest_record()
    };
    Ok(migrate_value(value, now, cfg))
}

fn guest_record() -> Value {
    json!({
        "callsign": GUEST_CALLSIGN,
        "prefix": DEFAULT_PREFIX,
        "stardust": 0,
        "fuel": FUEL_MAX,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 3, 7, 45, 0).unwrap()
    }

    #[test]
    fn export_names_carry_the_utc_date() {
        assert_eq!(export_file_name(now()), "astro_pilot_profile_2025-11-03.json");
    }

    #[test]
    fn export_then_import_keeps_the_record() {
        let cfg = ProgressionConfig::default();
        let mut profile = PilotProfile::register("orion", "PILOT", now(), &cfg);
        profile.bookmarks.insert("mission-02/joins".into());
        let json = export_profile_json(&profile).unwrap();
        assert!(json.contains('\n'));
        let restored = import_profile(&json, now(), &cfg).unwrap();
        assert_eq!(restored, profile);
    }

    #[test]
    fn partial_files_are_migrated() {
        let cfg = ProgressionConfig::default();
        let restored = import_profile(r#"{"callsign":"Vega","stardust":100}"#, now(), &cfg).unwrap();
        assert_eq!(restored.callsign, "Vega");
        assert_eq!(restored.level, 2);
        assert_eq!(restored.fuel, 85);
    }

    #[test]
    fn non_objects_become_guests() {
        let cfg = ProgressionConfig::default();
        for input in ["[1,2,3]", "42", "null", "\"pilot\""] {
            let guest = import_profile(input, now(), &cfg).unwrap();
            assert_eq!(guest.callsign, "GUEST");
            assert_eq!(guest.fuel, 100);
            assert_eq!(guest.stardust, 0);
        }
    }

    #[test]
    fn invalid_json_is_rejected() {
        let cfg = ProgressionConfig::default();
        assert!(matches!(
            import_profile("{callsign:", now(), &cfg),
            Err(ProfileError::Json(_))
        ));
    }
}
