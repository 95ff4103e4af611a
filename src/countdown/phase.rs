//! Countdown phase math.

/// Server-side maximum rotation period, in seconds.
pub const DEFAULT_TOTAL_DURATION_SECS: u32 = 30;

/// Elapsed phase, in degrees, for `remaining` seconds out of `total`.
///
/// `0°` is a fresh secret and `360°` one about to rotate. Negative TTLs count
/// as zero and TTLs above `total` as a fresh secret, so the result is always
/// within `[0, 360]`.
pub fn phase_degrees(remaining: i64, total: u32) -> f64 {
    if total == 0 {
        return 360.0;
    }
    let remaining = remaining.clamp(0, i64::from(total)) as f64;
    let elapsed_fraction = 1.0 - remaining / f64::from(total);
    (elapsed_fraction * 360.0).clamp(0.0, 360.0)
}
