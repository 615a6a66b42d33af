//! Level and rank derivation from accumulated stardust.
use serde::{Deserialize, Serialize};

use crate::config::LevelConfig;
use crate::constants::{DEFAULT_RANK, RANK_TITLES};
use crate::numbers::u64_to_f64;

/// Progress through the current level band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    pub current: u32,
    pub next: u32,
    /// Share of the band already earned, `0.0..=100.0`.
    pub percentage: f64,
}

impl LevelConfig {
    /// `floor(sqrt(stardust / divisor))`.
    #[must_use]
    pub fn level_for(&self, stardust: u64) -> u32 {
        let band = stardust / self.divisor.max(1);
        u32::try_from(band.isqrt()).unwrap_or(u32::MAX)
    }

    /// Stardust at which `level` begins.
    #[must_use]
    pub fn stardust_for(&self, level: u32) -> u64 {
        let level = u64::from(level);
        level.saturating_mul(level).saturating_mul(self.divisor)
    }

    #[must_use]
    pub fn progress_for(&self, stardust: u64) -> LevelProgress {
        let current = self.level_for(stardust);
        let next = current.saturating_add(1);
        let floor = self.stardust_for(current);
        let ceiling = self.stardust_for(next);
        let required = ceiling.saturating_sub(floor);
        let percentage = if required == 0 {
            100.0
        } else {
            let earned = u64_to_f64(stardust.saturating_sub(floor));
            (earned / u64_to_f64(required) * 100.0).min(100.0)
        };
        LevelProgress {
            current,
            next,
            percentage,
        }
    }
}

/// Level reached with `stardust` under the default divisor.
#[must_use]
pub fn calculate_level(stardust: u64) -> u32 {
    LevelConfig::default().level_for(stardust)
}

/// Inverse of [`calculate_level`]: the stardust threshold of `level`.
#[must_use]
pub fn stardust_for_level(level: u32) -> u64 {
    LevelConfig::default().stardust_for(level)
}

#[must_use]
pub fn level_progress(stardust: u64) -> LevelProgress {
    LevelConfig::default().progress_for(stardust)
}

/// Highest rank whose level requirement is met; "Cadet" below the first row.
#[must_use]
pub fn rank_title(level: u32) -> &'static str {
    RANK_TITLES
        .iter()
        .rev()
        .find(|(min_level, _)| level >= *min_level)
        .map_or(DEFAULT_RANK, |(_, title)| title)
}
