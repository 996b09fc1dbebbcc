//! Common time/duty helpers for prosthesis_core.

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;

/// Compute the period in microseconds for a given tick rate in Hz.
/// - Clamps `hz` to at least 1 to avoid division by zero.
/// - Ensures result is at least 1 microsecond.
#[inline]
pub fn period_us(hz: u32) -> u64 {
    (MICROS_PER_SEC / u64::from(hz.max(1))).max(1)
}

/// Convert a drive percentage into an 8-bit PWM duty, truncating.
/// Percentages above 100 saturate at full duty.
#[inline]
pub fn duty_from_pct(pct: u8) -> u8 {
    let pct = u16::from(pct.min(100));
    u8::try_from(pct * 255 / 100).unwrap_or(u8::MAX)
}
