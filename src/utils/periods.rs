//! Snapshot period arithmetic.
//!
//! Hour ids count whole hours since the unix epoch. Day ids count whole days
//! since the epoch after shifting the boundary by a configured offset, so a
//! day can close at e.g. 08:00 UTC instead of midnight.

/// Seconds in one hourly snapshot period.
pub const SECONDS_PER_HOUR: i64 = 3_600;

/// Seconds in one daily snapshot period.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Number of hourly buckets in the rolling 24h window.
pub const HOURS_PER_DAY: i64 = 24;

/// Number of hourly buckets in the rolling 7d window.
pub const HOURS_PER_WEEK: i64 = 168;

/// Hour id containing `timestamp` (floor division, correct for negatives).
#[inline]
pub fn hour_from_timestamp(timestamp: i64) -> i64 {
    timestamp.div_euclid(SECONDS_PER_HOUR)
}

/// Day id containing `timestamp`, with the day boundary moved forward by
/// `day_offset_seconds`.
#[inline]
pub fn day_from_timestamp(timestamp: i64, day_offset_seconds: i64) -> i64 {
    (timestamp - day_offset_seconds).div_euclid(SECONDS_PER_DAY)
}
