//! Partitioning lyric lines into fixed-capacity pages.

use serde::{Deserialize, Serialize};

/// An inclusive range of line indices rendered together on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
}

impl PageRange {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of lines on the page (ranges are never empty)
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start + 1
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    #[must_use]
    pub const fn contains(&self, line: usize) -> bool {
        self.start <= line && line <= self.end
    }
}

/// Split `total_lines` into pages of `lines_per_page`.
///
/// Every page holds exactly `lines_per_page` lines except possibly the last,
/// which holds the remainder. Zero lines produce no pages. A capacity of
/// zero is treated as one.
#[must_use]
pub fn paginate(total_lines: usize, lines_per_page: usize) -> Vec<PageRange> {
    let lines_per_page = lines_per_page.max(1);

    (0..total_lines)
        .step_by(lines_per_page)
        .map(|start| {
            let end = start.saturating_add(lines_per_page - 1).min(total_lines - 1);
            PageRange::new(start, end)
        })
        .collect()
}

/// Number of pages a state exposes for `ranges`; never less than one.
#[must_use]
pub fn total_pages(ranges: &[PageRange]) -> usize {
    ranges.len().max(1)
}

/// The page containing `line`.
///
/// Negative indices map to the first page and indices past the end map to
/// the last page. With no ranges the answer is page 0.
#[must_use]
pub fn find_page_for_line(ranges: &[PageRange], line: i64) -> usize {
    let Some(last) = ranges.last() else {
        return 0;
    };
    let Ok(line) = usize::try_from(line) else {
        return 0;
    };
    if line > last.end {
        return ranges.len() - 1;
    }

    // Ranges are sorted and contiguous
    ranges
        .partition_point(|range| range.end < line)
        .min(ranges.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(total_lines: usize, lines_per_page: usize) {
        let ranges = paginate(total_lines, lines_per_page);
        let lines_per_page = lines_per_page.max(1);

        assert_eq!(ranges.len(), total_lines.div_ceil(lines_per_page));
        if total_lines == 0 {
            assert!(ranges.is_empty());
            return;
        }

        assert_eq!(ranges[0].start, 0);
        assert_eq!(ranges[ranges.len() - 1].end, total_lines - 1);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end + 1, pair[1].start);
        }
        for range in &ranges[..ranges.len() - 1] {
            assert_eq!(range.len(), lines_per_page);
        }
        let last = ranges[ranges.len() - 1].len();
        assert!(last >= 1 && last <= lines_per_page);
    }

    #[test]
    fn test_partition_properties() {
        for total in 0..60 {
            for per_page in 0..15 {
                assert_partition(total, per_page);
            }
        }
    }

    #[test]
    fn test_forty_two_lines_ten_per_page() {
        let ranges = paginate(42, 10);
        assert_eq!(
            ranges,
            vec![
                PageRange::new(0, 9),
                PageRange::new(10, 19),
                PageRange::new(20, 29),
                PageRange::new(30, 39),
                PageRange::new(40, 41),
            ]
        );
        assert_eq!(find_page_for_line(&ranges, 25), 2);
    }

    #[test]
    fn test_zero_lines() {
        let ranges = paginate(0, 10);
        assert!(ranges.is_empty());
        assert_eq!(total_pages(&ranges), 1);
        assert_eq!(find_page_for_line(&ranges, 3), 0);
    }

    #[test]
    fn test_zero_capacity_coerced() {
        let ranges = paginate(3, 0);
        assert_eq!(ranges.len(), 3);
        assert!(ranges.iter().all(|r| r.len() == 1));
    }

    #[test]
    fn test_find_page_clamps() {
        let ranges = paginate(42, 10);
        assert_eq!(find_page_for_line(&ranges, -1), 0);
        assert_eq!(find_page_for_line(&ranges, i64::MIN), 0);
        assert_eq!(find_page_for_line(&ranges, 42), 4);
        assert_eq!(find_page_for_line(&ranges, i64::MAX), 4);
    }

    #[test]
    fn test_find_page_every_line() {
        let ranges = paginate(23, 4);
        for line in 0..23_i64 {
            let page = find_page_for_line(&ranges, line);
            assert!(ranges[page].contains(usize::try_from(line).unwrap()));
        }
    }
}
