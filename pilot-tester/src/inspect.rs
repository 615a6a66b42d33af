//! Run the load pipeline against a profile stored on disk and describe it.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use pilot_engine::{BreakClaim, ProfileRepository, ProgressionConfig, export_profile_json};
use std::io::Write;
use std::path::Path;

use crate::store::FileStore;

pub fn parse_instant(at: Option<&str>) -> Result<DateTime<Utc>> {
    let Some(text) = at else {
        return Ok(Utc::now());
    };
    DateTime::parse_from_rfc3339(text)
        .map(|instant| instant.with_timezone(&Utc))
        .with_context(|| format!("--at {text:?} is not an RFC 3339 timestamp"))
}

/// Load the profile under `store_dir` as of `now`, writing back whatever the
/// pipeline changed, and print a summary followed by the document.
pub fn inspect<W: Write + ?Sized>(
    store_dir: &Path,
    now: DateTime<Utc>,
    config: &ProgressionConfig,
    out: &mut W,
) -> Result<()> {
    let repo = ProfileRepository::new(FileStore::new(store_dir), (), config.clone());
    let Some(loaded) = repo
        .load(now)
        .with_context(|| format!("failed to load profile from {}", store_dir.display()))?
    else {
        bail!("no readable profile stored in {}", store_dir.display());
    };
    let profile = &loaded.profile;
    let progress = config.level.progress_for(profile.stardust);

    writeln!(out, "Pilot: {} {}", profile.prefix, profile.callsign)?;
    writeln!(out, "Level: {} ({})", profile.level, profile.rank)?;
    writeln!(
        out,
        "Progress: {:.1}% toward level {}",
        progress.percentage, progress.next
    )?;
    writeln!(out, "Stardust: {}", profile.stardust)?;
    writeln!(out, "Fuel: {}", profile.fuel)?;
    let break_line = match loaded.refill.claim {
        BreakClaim::Idle => "none scheduled".to_string(),
        BreakClaim::Pending { ready_at, remaining } => format!(
            "ready at {} ({}s left)",
            ready_at.to_rfc3339(),
            remaining.num_seconds()
        ),
        BreakClaim::Cleared => "unreadable schedule cleared".to_string(),
        BreakClaim::Claimed { gained } => format!("claimed +{gained}"),
    };
    writeln!(out, "Break: {break_line}")?;
    writeln!(
        out,
        "Streak: {} (longest {})",
        profile.daily_streak, profile.longest_streak
    )?;
    writeln!(
        out,
        "Migrated: {} / Persisted: {}",
        loaded.migrated, loaded.persisted
    )?;
    writeln!(out)?;
    writeln!(out, "{}", export_profile_json(profile)?)?;
    Ok(())
}
