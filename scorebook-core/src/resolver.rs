//! Mapping a playback position to the active lyric line.

use crate::document::LyricLine;
use std::time::Duration;

/// Below this many lines a linear scan beats the binary search setup cost.
pub const LINEAR_SCAN_THRESHOLD: usize = 8;

/// Index of the last line whose start time is at or before `time`.
///
/// Returns `None` when `lines` is empty or `time` precedes the first line.
/// Lines sharing a start time resolve to the last of them.
#[must_use]
pub fn resolve(lines: &[LyricLine], time: Duration) -> Option<usize> {
    let count = if lines.len() < LINEAR_SCAN_THRESHOLD {
        lines.iter().take_while(|line| line.start_time <= time).count()
    } else {
        lines.partition_point(|line| line.start_time <= time)
    };
    count.checked_sub(1)
}

/// Remembers the last resolved line so callers can react only to changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineCursor {
    current: Option<usize>,
}

impl LineCursor {
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    #[must_use]
    pub const fn current(&self) -> Option<usize> {
        self.current
    }

    /// Store an explicitly known index. Returns it if it changed.
    pub fn set(&mut self, index: Option<usize>) -> Option<Option<usize>> {
        if index == self.current {
            return None;
        }
        self.current = index;
        Some(index)
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines_at(starts_ms: &[u64]) -> Vec<LyricLine> {
        starts_ms
            .iter()
            .enumerate()
            .map(|(i, &ms)| {
                LyricLine::new(
                    format!("line-{i}"),
                    format!("Line {i}"),
                    Duration::from_millis(ms),
                    Duration::from_millis(ms + 500),
                )
            })
            .collect()
    }

    fn resolve_ms(lines: &[LyricLine], ms: u64) -> Option<usize> {
        resolve(lines, Duration::from_millis(ms))
    }

    #[test]
    fn test_empty_lines() {
        assert_eq!(resolve(&[], Duration::from_secs(10)), None);
    }

    #[test]
    fn test_before_first_line() {
        let lines = lines_at(&[1000, 2000, 3000]);
        assert_eq!(resolve(&lines, Duration::from_millis(999)), None);
    }

    #[test]
    fn test_exact_boundaries() {
        let lines = lines_at(&[1000, 2000, 3000]);
        assert_eq!(resolve_ms(&lines, 1000), Some(0));
        assert_eq!(resolve_ms(&lines, 1999), Some(0));
        assert_eq!(resolve_ms(&lines, 2000), Some(1));
        assert_eq!(resolve_ms(&lines, 60_000), Some(2));
    }

    #[test]
    fn test_equal_start_times_resolve_to_last() {
        let short = lines_at(&[0, 1000, 1000, 2000]);
        assert_eq!(resolve_ms(&short, 1000), Some(2));

        let long = lines_at(&[0, 100, 200, 300, 400, 500, 500, 500, 600, 700]);
        assert_eq!(resolve_ms(&long, 550), Some(7));
    }

    #[test]
    fn test_binary_and_linear_agree() {
        let starts: Vec<u64> = (0..40).map(|i| i * 250).collect();
        let lines = lines_at(&starts);
        for ms in (0..11_000).step_by(37) {
            let expected = lines.iter().rposition(|l| l.start_time <= Duration::from_millis(ms));
            assert_eq!(resolve_ms(&lines, ms), expected, "at {ms}ms");
        }
    }

    #[test]
    fn test_monotone_for_non_decreasing_times() {
        let lines = lines_at(&[0, 0, 300, 900, 900, 1500, 4000, 4000, 4100, 8000, 9000]);
        let mut last: Option<usize> = None;
        for ms in (0..10_000).step_by(13) {
            let index = resolve_ms(&lines, ms);
            assert!(index >= last, "index went backwards at {ms}ms");
            last = index;
        }
    }

    #[test]
    fn test_cursor_reports_changes_once() {
        let lines = lines_at(&[0, 1000, 2000]);
        let mut cursor = LineCursor::new();

        assert_eq!(cursor.set(resolve_ms(&lines, 10)), Some(Some(0)));
        assert_eq!(cursor.set(resolve_ms(&lines, 500)), None);
        assert_eq!(cursor.set(resolve_ms(&lines, 1000)), Some(Some(1)));
        assert_eq!(cursor.current(), Some(1));

        cursor.clear();
        assert_eq!(cursor.current(), None);
    }
}
