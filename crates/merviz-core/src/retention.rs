//! Retention window handling for uploaded artifacts.
//!
//! Uploaded artifacts carry an expiry; callers may request any number of
//! days but the stored value is always clamped into the supported window.
//! Out-of-range inputs are silently adjusted, never rejected.

use time::{Duration, OffsetDateTime};

/// Default retention window applied when none (or a non-positive value)
/// is requested.
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// Upper bound of the retention window.
pub const MAX_RETENTION_DAYS: i64 = 30;

/// Clamps a requested retention window into the supported range.
///
/// Values below one day fall back to [`DEFAULT_RETENTION_DAYS`], values
/// above [`MAX_RETENTION_DAYS`] are capped.
pub fn clamp_retention_days(requested: i64) -> i64 {
    if requested < 1 {
        tracing::warn!(
            requested,
            fallback = DEFAULT_RETENTION_DAYS,
            "retention below one day, using default"
        );
        DEFAULT_RETENTION_DAYS
    } else if requested > MAX_RETENTION_DAYS {
        tracing::warn!(
            requested,
            capped = MAX_RETENTION_DAYS,
            "retention above maximum, capping"
        );
        MAX_RETENTION_DAYS
    } else {
        requested
    }
}

/// Computes the expiry timestamp for a clamped retention window starting now.
pub fn expires_at(retention_days: i64) -> OffsetDateTime {
    OffsetDateTime::now_utc() + Duration::days(clamp_retention_days(retention_days))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_in_range_unchanged() {
        assert_eq!(clamp_retention_days(1), 1);
        assert_eq!(clamp_retention_days(7), 7);
        assert_eq!(clamp_retention_days(30), 30);
    }

    #[test]
    fn test_clamp_below_range_uses_default() {
        assert_eq!(clamp_retention_days(0), DEFAULT_RETENTION_DAYS);
        assert_eq!(clamp_retention_days(-5), DEFAULT_RETENTION_DAYS);
    }

    #[test]
    fn test_clamp_above_range_caps() {
        assert_eq!(clamp_retention_days(45), MAX_RETENTION_DAYS);
        assert_eq!(clamp_retention_days(31), MAX_RETENTION_DAYS);
    }

    #[test]
    fn test_expires_at_is_in_the_future() {
        let expiry = expires_at(7);
        assert!(expiry > OffsetDateTime::now_utc());
    }
}
