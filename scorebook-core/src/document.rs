//! Immutable, time-ordered lyric documents.

use crate::error::{CoreError, Result};
use crate::lrc::LrcFile;
use std::collections::HashSet;
use std::time::Duration;

/// How long the final line of a document is considered active when the
/// source format gives it no end.
pub const LAST_LINE_DURATION: Duration = Duration::from_secs(5);

/// One timed unit of lyric text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    /// Unique within its document
    pub id: String,
    pub text: String,
    pub start_time: Duration,
    pub end_time: Duration,
}

impl LyricLine {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        start_time: Duration,
        end_time: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            start_time,
            end_time,
        }
    }
}

/// An ordered sequence of lyric lines with non-decreasing start times.
///
/// Documents are never mutated after construction; a song change replaces
/// the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LyricDocument {
    lines: Vec<LyricLine>,
}

impl LyricDocument {
    /// Build a document, validating ordering and id uniqueness.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DocumentInvalid`] if a line starts before its
    /// predecessor or an id appears twice.
    pub fn new(lines: Vec<LyricLine>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(lines.len());
        for (index, line) in lines.iter().enumerate() {
            if !seen.insert(line.id.as_str()) {
                return Err(CoreError::DocumentInvalid {
                    reason: format!("duplicate line id {:?} at index {index}", line.id),
                });
            }
            if index > 0 && line.start_time < lines[index - 1].start_time {
                return Err(CoreError::DocumentInvalid {
                    reason: format!("line {index} starts before line {}", index - 1),
                });
            }
        }
        Ok(Self { lines })
    }

    /// An empty document (no lyrics available).
    #[must_use]
    pub const fn empty() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build a document from a parsed LRC file.
    ///
    /// Each line ends where the next one starts; the last line lasts
    /// [`LAST_LINE_DURATION`].
    #[must_use]
    pub fn from_lrc(lrc: &LrcFile) -> Self {
        let lines = lrc
            .lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let end_time = lrc.lines.get(i + 1).map_or_else(
                    || line.start_time.saturating_add(LAST_LINE_DURATION),
                    |next| next.start_time.max(line.start_time),
                );
                LyricLine::new(format!("line-{i}"), line.text.clone(), line.start_time, end_time)
            })
            .collect();

        // LrcFile lines are already sorted and ids are positional
        Self { lines }
    }

    #[must_use]
    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&LyricLine> {
        self.lines.get(index)
    }
}
