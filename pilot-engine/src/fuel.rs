//! Fuel: passive regeneration, the scheduled break refill, refuel purchases
//! and simulation spending.
//!
//! Regeneration is pull-based. Nothing here runs on a timer; every call
//! compares the stored anchors with the `now` it is handed.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{FuelConfig, ProgressionConfig};
use crate::constants::FUEL_MAX;
use crate::numbers::i64_to_u32_saturating;
use crate::profile::{PilotProfile, Timestamp};

/// Refusals surfaced to the pilot by economy actions.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EconomyError {
    #[error("fuel tank already full")]
    TankFull,
    #[error("need {needed} stardust, only {available} available")]
    InsufficientStardust { needed: u64, available: u64 },
    #[error("need {needed} fuel, only {available} available")]
    InsufficientFuel { needed: u32, available: u32 },
}

/// Credit whole elapsed regen intervals since `fuel_last_regen_at`.
///
/// Returns `true` when the profile needs persisting: fuel rose, or a missing
/// or unreadable anchor was reset. A full tank only re-anchors the clock.
pub fn apply_passive_regen(profile: &mut PilotProfile, now: DateTime<Utc>, cfg: &FuelConfig) -> bool {
    if profile.is_tank_full() {
        profile.fuel_last_regen_at = Some(now.into());
        return false;
    }

    let Some(last) = profile.fuel_last_regen_at.as_ref().and_then(Timestamp::parse) else {
        if let Some(raw) = &profile.fuel_last_regen_at {
            log::warn!("unreadable fuelLastRegenAt {raw:?}; re-anchoring");
        }
        profile.fuel_last_regen_at = Some(now.into());
        return true;
    };

    let elapsed_ms = (now - last).num_milliseconds();
    let interval_ms = cfg.regen_interval_ms.max(1);
    if elapsed_ms < interval_ms {
        return false;
    }

    // The anchor moves to `now`; the partial interval is dropped.
    let intervals = i64_to_u32_saturating(elapsed_ms / interval_ms);
    let before = profile.fuel;
    profile.set_fuel(before.saturating_add(intervals.saturating_mul(cfg.regen_rate)));
    profile.fuel_last_regen_at = Some(now.into());

    log::debug!(
        "passive regen: {intervals} interval(s), fuel {before} -> {}",
        profile.fuel
    );
    profile.fuel != before
}

/// Outcome of [`start_break`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakStart {
    /// Nothing to refill; no break scheduled.
    TankFull,
    /// A future break already exists and was left untouched.
    AlreadyPending { ready_at: DateTime<Utc> },
    Scheduled { ready_at: DateTime<Utc> },
}

impl BreakStart {
    #[must_use]
    pub const fn changed(&self) -> bool {
        matches!(self, Self::Scheduled { .. })
    }

    /// Stable name of the outcome for UI bindings.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::TankFull => "tankFull",
            Self::AlreadyPending { .. } => "alreadyPending",
            Self::Scheduled { .. } => "scheduled",
        }
    }
}

/// Schedule a break refill `break_cooldown_ms` from now.
pub fn start_break(profile: &mut PilotProfile, now: DateTime<Utc>, cfg: &FuelConfig) -> BreakStart {
    if profile.is_tank_full() {
        return BreakStart::TankFull;
    }
    if let Some(ready_at) = profile.fuel_break_ready_at.as_ref().and_then(Timestamp::parse)
        && ready_at > now
    {
        return BreakStart::AlreadyPending { ready_at };
    }

    let ready_at = now + Duration::milliseconds(cfg.break_cooldown_ms);
    profile.fuel_break_ready_at = Some(ready_at.into());
    log::debug!("fuel break scheduled for {ready_at}");
    BreakStart::Scheduled { ready_at }
}

/// What the break step of [`apply_break_refill`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakClaim {
    /// No break scheduled.
    Idle,
    Pending {
        ready_at: DateTime<Utc>,
        remaining: Duration,
    },
    /// The stored schedule was unreadable and has been removed.
    Cleared,
    Claimed { gained: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakRefill {
    pub claim: BreakClaim,
    /// Whether regen or the claim modified the profile.
    pub changed: bool,
}

/// Apply passive regen, then claim a due break refill.
pub fn apply_break_refill(
    profile: &mut PilotProfile,
    now: DateTime<Utc>,
    cfg: &FuelConfig,
) -> BreakRefill {
    let regenerated = apply_passive_regen(profile, now, cfg);

    let Some(raw) = profile.fuel_break_ready_at.as_ref() else {
        return BreakRefill {
            claim: BreakClaim::Idle,
            changed: regenerated,
        };
    };
    let Some(ready_at) = raw.parse() else {
        log::warn!("unreadable fuelBreakReadyAt {raw:?}; clearing");
        profile.fuel_break_ready_at = None;
        return BreakRefill {
            claim: BreakClaim::Cleared,
            changed: true,
        };
    };
    if ready_at > now {
        return BreakRefill {
            claim: BreakClaim::Pending {
                ready_at,
                remaining: ready_at - now,
            },
            changed: regenerated,
        };
    }

    let before = profile.fuel;
    profile.set_fuel(before.saturating_add(cfg.break_gain));
    profile.fuel_break_ready_at = None;
    let gained = profile.fuel - before;
    log::info!("fuel break claimed: +{gained}");
    BreakRefill {
        claim: BreakClaim::Claimed { gained },
        changed: true,
    }
}

/// Time left until a scheduled break becomes claimable.
#[must_use]
pub fn break_remaining(profile: &PilotProfile, now: DateTime<Utc>) -> Option<Duration> {
    profile
        .fuel_break_ready_at
        .as_ref()
        .and_then(Timestamp::parse)
        .filter(|ready_at| *ready_at > now)
        .map(|ready_at| ready_at - now)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefuelReceipt {
    pub fuel_gained: u32,
    pub stardust_spent: u64,
}

/// Trade stardust for fuel.
///
/// # Errors
///
/// Returns [`EconomyError::TankFull`] when there is nothing to refill and
/// [`EconomyError::InsufficientStardust`] when the pilot cannot pay.
pub fn purchase_refuel(
    profile: &mut PilotProfile,
    cfg: &ProgressionConfig,
) -> Result<RefuelReceipt, EconomyError> {
    if profile.is_tank_full() {
        return Err(EconomyError::TankFull);
    }
    let cost = cfg.fuel.refuel_cost;
    if profile.stardust < cost {
        return Err(EconomyError::InsufficientStardust {
            needed: cost,
            available: profile.stardust,
        });
    }

    let before = profile.fuel;
    profile.debit_stardust(cost, &cfg.level);
    profile.set_fuel(before.saturating_add(cfg.fuel.refuel_gain));
    Ok(RefuelReceipt {
        fuel_gained: profile.fuel - before,
        stardust_spent: cost,
    })
}

/// Spend `cost` fuel (clamped to the tank size) up front for a simulation run.
/// Returns the fuel left.
///
/// # Errors
///
/// Returns [`EconomyError::InsufficientFuel`] without spending anything when
/// the tank holds less than the cost.
pub fn spend_fuel(profile: &mut PilotProfile, cost: u32) -> Result<u32, EconomyError> {
    let cost = cost.min(FUEL_MAX);
    if profile.fuel < cost {
        return Err(EconomyError::InsufficientFuel {
            needed: cost,
            available: profile.fuel,
        });
    }
    profile.fuel -= cost;
    Ok(profile.fuel)
}
