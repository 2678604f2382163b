//! Timestamp utilities
//!
//! Journal entries are keyed by the local date in Korea Standard Time (UTC+9)
//! regardless of the host time zone.

use chrono::{DateTime, FixedOffset, Offset, Utc};

const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Korea Standard Time offset
pub fn kst() -> FixedOffset {
    // 9h is always within the valid +-24h range
    FixedOffset::east_opt(KST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time in Korea Standard Time
pub fn now_kst() -> DateTime<FixedOffset> {
    to_kst(now())
}

/// Convert a UTC timestamp to Korea Standard Time
pub fn to_kst(timestamp: DateTime<Utc>) -> DateTime<FixedOffset> {
    timestamp.with_timezone(&kst())
}

/// `YYYY-MM-DD` date key for a timestamp
pub fn date_key(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}

/// `HH:MM` time key for a timestamp
pub fn time_key(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.format("%H:%M").to_string()
}
