//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Round a f64 and clamp it to `0..=max`, returning 0 for non-finite values.
#[must_use]
pub fn round_f64_to_bounded_u32(value: f64, max: u32) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    let clamped = value.round().clamp(0.0, f64::from(max));
    cast::<f64, u32>(clamped).unwrap_or(0)
}

/// Floor a f64 into the u64 range, returning 0 for NaN or negative values.
#[must_use]
pub fn floor_f64_to_u64(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    let max = cast::<u64, f64>(u64::MAX).unwrap_or(f64::MAX);
    cast::<f64, u64>(value.min(max).floor()).unwrap_or(u64::MAX)
}

/// Convert u64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(f64::MAX)
}

/// Narrow a non-negative i64 count to u32, saturating at `u32::MAX`.
#[must_use]
pub fn i64_to_u32_saturating(value: i64) -> u32 {
    if value <= 0 {
        return 0;
    }
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Truncate a JavaScript epoch-millisecond value, saturating at the i64 range.
#[must_use]
pub fn f64_to_i64_millis(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    cast::<f64, i64>(value.trunc()).unwrap_or(if value < 0.0 { i64::MIN } else { i64::MAX })
}
