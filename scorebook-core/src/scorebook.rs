//! Score Book page state machine.
//!
//! [`ScoreBook`] owns the current page and the page ranges for the loaded
//! document. Every command clamps its input; there is no error path. State
//! changes are published through a `watch` channel (subscribe + snapshot),
//! and actual page changes are additionally broadcast as [`PageTurn`] events
//! for transition animations.

use crate::pagination::{self, PageRange};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};

/// Direction of the last page transition, used to pick a slide animation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
    #[default]
    None,
}

/// Snapshot of the Score Book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBookState {
    pub current_page: usize,
    /// Always at least 1, even for an empty document
    pub total_pages: usize,
    pub lines_per_page: usize,
    pub total_lines: usize,
    pub page_line_ranges: Vec<PageRange>,
    pub direction: Direction,
}

impl Default for ScoreBookState {
    fn default() -> Self {
        Self {
            current_page: 0,
            total_pages: 1,
            lines_per_page: 1,
            total_lines: 0,
            page_line_ranges: Vec::new(),
            direction: Direction::None,
        }
    }
}

impl ScoreBookState {
    /// Line range of the current page, if the document has any lines
    #[must_use]
    pub fn current_range(&self) -> Option<PageRange> {
        self.page_line_ranges.get(self.current_page).copied()
    }

    /// Page containing `line`, clamped to a valid page
    #[must_use]
    pub fn find_page_for_line(&self, line: i64) -> usize {
        pagination::find_page_for_line(&self.page_line_ranges, line)
    }
}

/// What moved the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnReason {
    /// `go_to_page` and the commands and reactions built on it
    Navigate,
    /// `reset` on a song change
    Reset,
    /// `set_pagination` clamped a page that no longer exists
    Clamp,
}

/// A page change, emitted only when `current_page` actually moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTurn {
    pub from: usize,
    pub to: usize,
    pub direction: Direction,
    pub reason: TurnReason,
}

const PAGE_TURN_CAPACITY: usize = 32;

/// Page state machine for one Score Book view.
///
/// Each instance is independent; nothing is shared between instances.
pub struct ScoreBook {
    state: ScoreBookState,
    state_tx: watch::Sender<ScoreBookState>,
    turn_tx: broadcast::Sender<PageTurn>,
}

impl ScoreBook {
    #[must_use]
    pub fn new() -> Self {
        let state = ScoreBookState::default();
        let (state_tx, _) = watch::channel(state.clone());
        let (turn_tx, _) = broadcast::channel(PAGE_TURN_CAPACITY);
        Self {
            state,
            state_tx,
            turn_tx,
        }
    }

    /// Receive a notification on every state change; re-read the full state
    /// from the receiver.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ScoreBookState> {
        self.state_tx.subscribe()
    }

    /// Receive page-turn events for transition animations.
    #[must_use]
    pub fn page_turns(&self) -> broadcast::Receiver<PageTurn> {
        self.turn_tx.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> ScoreBookState {
        self.state.clone()
    }

    #[must_use]
    pub const fn state(&self) -> &ScoreBookState {
        &self.state
    }

    #[must_use]
    pub const fn current_page(&self) -> usize {
        self.state.current_page
    }

    #[must_use]
    pub const fn total_pages(&self) -> usize {
        self.state.total_pages
    }

    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.state.direction
    }

    /// Line range for `page`, if it exists.
    #[must_use]
    pub fn page_lines(&self, page: usize) -> Option<PageRange> {
        self.state.page_line_ranges.get(page).copied()
    }

    #[must_use]
    pub fn current_range(&self) -> Option<PageRange> {
        self.state.current_range()
    }

    #[must_use]
    pub fn find_page_for_line(&self, line: i64) -> usize {
        self.state.find_page_for_line(line)
    }

    /// Recompute page ranges for a new line count or page capacity.
    ///
    /// The current page is clamped into the new page count but is NOT moved
    /// to the active line; callers re-sync explicitly once measurement has
    /// settled. Returns `false` without notifying when nothing changed.
    pub fn set_pagination(&mut self, total_lines: usize, lines_per_page: usize) -> bool {
        let lines_per_page = lines_per_page.max(1);
        if total_lines == self.state.total_lines && lines_per_page == self.state.lines_per_page {
            return false;
        }

        let ranges = pagination::paginate(total_lines, lines_per_page);
        let total_pages = pagination::total_pages(&ranges);
        let previous_page = self.state.current_page;

        self.state.total_lines = total_lines;
        self.state.lines_per_page = lines_per_page;
        self.state.total_pages = total_pages;
        self.state.page_line_ranges = ranges;
        if previous_page >= total_pages {
            self.state.current_page = total_pages - 1;
            self.state.direction = Direction::None;
        }

        self.publish(previous_page, TurnReason::Clamp);
        true
    }

    /// Move to `page`, clamped to `[0, total_pages - 1]`.
    ///
    /// Returns `true` if the current page changed.
    pub fn go_to_page(&mut self, page: i64) -> bool {
        let target = self.clamp_page(page);
        let previous_page = self.state.current_page;
        let direction = match target.cmp(&previous_page) {
            std::cmp::Ordering::Greater => Direction::Forward,
            std::cmp::Ordering::Less => Direction::Backward,
            std::cmp::Ordering::Equal => Direction::None,
        };

        if target == previous_page && direction == self.state.direction {
            return false;
        }

        self.state.current_page = target;
        self.state.direction = direction;
        self.publish(previous_page, TurnReason::Navigate);
        target != previous_page
    }

    /// Next page; a no-op on the last page
    pub fn next_page(&mut self) -> bool {
        self.go_to_page(to_i64(self.state.current_page).saturating_add(1))
    }

    /// Previous page; a no-op on the first page
    pub fn prev_page(&mut self) -> bool {
        self.go_to_page(to_i64(self.state.current_page).saturating_sub(1))
    }

    /// Back to the first page with no direction. Run on every song change
    /// before the new document is paginated.
    pub fn reset(&mut self) {
        let previous_page = self.state.current_page;
        if previous_page == 0 && self.state.direction == Direction::None {
            return;
        }
        self.state.current_page = 0;
        self.state.direction = Direction::None;
        self.publish(previous_page, TurnReason::Reset);
    }

    /// Auto-advance reaction for a line-index change.
    ///
    /// Moves to the page holding `line` unless `override_active` is set.
    /// No active line counts as line -1, which belongs to the first page.
    /// Calling it again with the same line is a no-op.
    pub fn auto_advance(&mut self, line: Option<usize>, override_active: bool) -> bool {
        if override_active {
            return false;
        }
        let target = self.find_page_for_active_line(line);
        if target == self.state.current_page {
            return false;
        }
        self.go_to_page(to_i64(target))
    }

    /// Repagination re-sync reaction: show the page holding `line`,
    /// regardless of any manual override.
    pub fn resync_to_line(&mut self, line: Option<usize>) -> bool {
        let target = self.find_page_for_active_line(line);
        self.go_to_page(to_i64(target))
    }

    fn find_page_for_active_line(&self, line: Option<usize>) -> usize {
        self.find_page_for_line(line.map_or(-1, to_i64))
    }

    fn clamp_page(&self, page: i64) -> usize {
        let last = self.state.total_pages.saturating_sub(1);
        usize::try_from(page).map_or(0, |page| page.min(last))
    }

    fn publish(&self, previous_page: usize, reason: TurnReason) {
        self.state_tx.send_replace(self.state.clone());
        if previous_page != self.state.current_page {
            // No subscribers is fine; turns are advisory
            let _ = self.turn_tx.send(PageTurn {
                from: previous_page,
                to: self.state.current_page,
                direction: self.state.direction,
                reason,
            });
        }
    }
}

impl Default for ScoreBook {
    fn default() -> Self {
        Self::new()
    }
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
