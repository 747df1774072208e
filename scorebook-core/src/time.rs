//! Saturating `Duration` arithmetic for playback positions.

use std::time::Duration;

pub trait DurationExt {
    /// Whole milliseconds, saturating at `u64::MAX`.
    fn as_millis_u64(&self) -> u64;

    /// Scale a playback duration by a speed factor, saturating on overflow.
    ///
    /// Non-finite or negative factors yield `Duration::ZERO`.
    fn scaled(&self, factor: f64) -> Duration;
}

impl DurationExt for Duration {
    fn as_millis_u64(&self) -> u64 {
        u64::try_from(self.as_millis()).unwrap_or(u64::MAX)
    }

    fn scaled(&self, factor: f64) -> Duration {
        if !factor.is_finite() || factor <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(self.as_secs_f64() * factor).unwrap_or(Duration::MAX)
    }
}

/// Convert a signed millisecond offset into a shifted duration, saturating at zero.
#[must_use]
pub fn apply_offset(duration: Duration, offset_ms: i64) -> Duration {
    let delta = Duration::from_millis(offset_ms.unsigned_abs());
    if offset_ms >= 0 {
        duration.saturating_add(delta)
    } else {
        duration.saturating_sub(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_saturate() {
        assert_eq!(Duration::from_micros(62_500_900).as_millis_u64(), 62_500);
        assert_eq!(Duration::MAX.as_millis_u64(), u64::MAX);
    }

    #[test]
    fn test_scaled() {
        let duration = Duration::from_millis(1000);
        assert_eq!(duration.scaled(2.0), Duration::from_millis(2000));
        assert_eq!(duration.scaled(0.5), Duration::from_millis(500));
    }

    #[test]
    fn test_scaled_invalid_factor() {
        let duration = Duration::from_millis(1000);
        assert_eq!(duration.scaled(-1.0), Duration::ZERO);
        assert_eq!(duration.scaled(f64::NAN), Duration::ZERO);
    }

    #[test]
    fn test_apply_offset() {
        let base = Duration::from_millis(10_000);
        assert_eq!(apply_offset(base, 500), Duration::from_millis(10_500));
        assert_eq!(apply_offset(base, -500), Duration::from_millis(9_500));
        assert_eq!(apply_offset(base, -20_000), Duration::ZERO);
    }
}
