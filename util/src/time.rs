//! General time utility functions

use chrono;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Convert a duration in seconds into a whole number of cycles of the given period.
///
/// The result is rounded to the nearest cycle and is never less than one, so that a timer built
/// from it always lasts at least one cycle.
pub fn seconds_to_ticks(duration_s: f64, period_s: f64) -> u32 {
    let ticks = (duration_s / period_s).round();

    if ticks.is_nan() || ticks < 1.0 {
        1
    }
    else if ticks > u32::MAX as f64 {
        u32::MAX
    }
    else {
        ticks as u32
    }
}
