//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;
use std::time::Duration;

/// Round a f64 and clamp it to the u32 range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_u32(value: f64) -> u32 {
    if value.is_nan() {
        return 0;
    }
    let max = cast::<u32, f64>(u32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(0.0, max).round();
    cast::<f64, u32>(clamped).unwrap_or(0)
}

/// Convert u32 to f32 while allowing precision loss in a single location.
#[must_use]
pub fn u32_to_f32(value: u32) -> f32 {
    cast::<u32, f32>(value).unwrap_or(0.0)
}

/// Convert a duration to whole milliseconds, saturating at `u64::MAX`.
#[must_use]
pub fn duration_to_millis(value: Duration) -> u64 {
    u64::try_from(value.as_millis()).unwrap_or(u64::MAX)
}
