use scorebook_core::{LyricDocument, ScoreBookState};
use std::fmt::Write as _;

/// How a line on the visible page relates to the playback position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    Current,
    Next,
    Context,
}

impl LineRole {
    const fn marker(self) -> &'static str {
        match self {
            Self::Current => ">",
            Self::Next => "+",
            Self::Context => " ",
        }
    }
}

/// A line of the visible page, ready to print
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLine<'a> {
    pub index: usize,
    pub text: &'a str,
    pub role: LineRole,
}

/// Lines of the current page tagged with their role.
#[must_use]
pub fn page_lines<'a>(
    state: &ScoreBookState,
    document: &'a LyricDocument,
    current_line: Option<usize>,
) -> Vec<PageLine<'a>> {
    let Some(range) = state.current_range() else {
        return Vec::new();
    };
    let next_line = current_line.map_or(0, |i| i + 1);

    (range.start..=range.end)
        .filter_map(|index| {
            let line = document.get(index)?;
            let role = if Some(index) == current_line {
                LineRole::Current
            } else if index == next_line {
                LineRole::Next
            } else {
                LineRole::Context
            };
            Some(PageLine {
                index,
                text: &line.text,
                role,
            })
        })
        .collect()
}

/// Render the current page as a block of text with a header.
#[must_use]
pub fn render_page(
    state: &ScoreBookState,
    document: &LyricDocument,
    current_line: Option<usize>,
) -> String {
    let mut out = format!(
        "-- page {}/{} ({:?}) --\n",
        state.current_page + 1,
        state.total_pages,
        state.direction
    );
    for line in page_lines(state, document, current_line) {
        let _ = writeln!(out, "{} {:>4}  {}", line.role.marker(), line.index + 1, line.text);
    }
    out
}
