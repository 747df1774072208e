//! One Score Book view bound to a lyric document and a playback clock.
//!
//! [`Session`] wires the inputs to the page state machine:
//!
//! - a line-index change runs the auto-advance reaction,
//! - a `lines_per_page` change runs repagination followed by the re-sync
//!   reaction,
//! - manual navigation arms the override timer,
//! - leaving the playing state drops the override without snapping.
//!
//! The two reactions are separate entry points keyed on separate inputs, so
//! a repagination never re-runs auto-advance against a page index captured
//! before the new ranges were applied.

use crate::config::PagingConfig;
use crate::document::LyricDocument;
use crate::override_timer::{ManualOverrideState, ManualOverrideTimer};
use crate::playback::PlaybackStatus;
use crate::resolver::LineCursor;
use crate::scorebook::{PageTurn, ScoreBook, ScoreBookState};
use crate::viewport::Viewport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tracing::debug;

const LOG_TARGET: &str = "scorebook::session";

pub struct Session {
    document: Arc<LyricDocument>,
    book: ScoreBook,
    override_timer: ManualOverrideTimer,
    cursor: LineCursor,
    playback: PlaybackStatus,
    lines_per_page: usize,
    min_lines_per_page: usize,
}

impl Session {
    #[must_use]
    pub fn new(config: &PagingConfig) -> Self {
        let min_lines_per_page = config.min_lines_per_page.max(1);
        Self {
            document: Arc::new(LyricDocument::empty()),
            book: ScoreBook::new(),
            override_timer: ManualOverrideTimer::new(config.override_timeout()),
            cursor: LineCursor::new(),
            playback: PlaybackStatus::Stopped,
            lines_per_page: min_lines_per_page,
            min_lines_per_page,
        }
    }

    #[must_use]
    pub fn document(&self) -> &Arc<LyricDocument> {
        &self.document
    }

    #[must_use]
    pub const fn book(&self) -> &ScoreBook {
        &self.book
    }

    #[must_use]
    pub fn snapshot(&self) -> ScoreBookState {
        self.book.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ScoreBookState> {
        self.book.subscribe()
    }

    #[must_use]
    pub fn page_turns(&self) -> broadcast::Receiver<PageTurn> {
        self.book.page_turns()
    }

    #[must_use]
    pub const fn current_line(&self) -> Option<usize> {
        self.cursor.current()
    }

    #[must_use]
    pub const fn playback(&self) -> PlaybackStatus {
        self.playback
    }

    #[must_use]
    pub const fn lines_per_page(&self) -> usize {
        self.lines_per_page
    }

    #[must_use]
    pub const fn override_state(&self) -> ManualOverrideState {
        self.override_timer.state()
    }

    #[must_use]
    pub const fn override_deadline(&self) -> Option<Instant> {
        self.override_timer.deadline()
    }

    /// Future completing when the manual override expires; see
    /// [`ManualOverrideTimer::expired`].
    pub async fn override_expired(&self) {
        self.override_timer.expired().await;
    }

    /// Register a hook run whenever the override is released by timeout.
    pub fn on_override_release(&mut self, hook: impl FnMut() + Send + 'static) {
        self.override_timer.set_on_release(hook);
    }

    /// Replace the document for a song change.
    ///
    /// The page state is reset before the new document is paginated, so the
    /// old page index is never clamped against the new page count.
    pub fn load_document(&mut self, document: Arc<LyricDocument>) {
        self.override_timer.cancel();
        self.cursor.clear();
        self.book.reset();
        self.document = document;
        self.book.set_pagination(self.document.len(), self.lines_per_page);
        debug!(
            target: LOG_TARGET,
            "Loaded document with {} lines ({} pages)",
            self.document.len(),
            self.book.total_pages()
        );
    }

    /// Feed a playback position. Returns `true` if the page changed.
    pub fn on_time(&mut self, time: Duration) -> bool {
        let line = crate::resolver::resolve(self.document.lines(), time);
        self.on_line_index(line)
    }

    /// Auto-advance reaction. Runs only when the line index changed and
    /// playback is active; the override suppresses the page change but the
    /// line index is still tracked.
    ///
    /// An override whose deadline has already passed is released here first,
    /// so callers without a timer loop never stay stuck on a manual page.
    pub fn on_line_index(&mut self, line: Option<usize>) -> bool {
        if self.cursor.set(line).is_none() || !self.playback.is_playing() {
            return false;
        }
        let page = self.book.current_page();
        self.poll_override(Instant::now());
        self.book.auto_advance(line, self.override_timer.is_active());
        let turned = self.book.current_page() != page;
        if turned {
            debug!(
                target: LOG_TARGET,
                "Auto-advanced to page {} for line {:?}",
                self.book.current_page(),
                line
            );
        }
        turned
    }

    /// Apply a new page capacity and re-sync to the active line.
    ///
    /// The re-sync ignores the manual override: after a resize the active
    /// line must be on screen. Returns `true` if pagination changed.
    pub fn on_lines_per_page(&mut self, lines_per_page: usize) -> bool {
        let lines_per_page = lines_per_page.max(self.min_lines_per_page);
        self.lines_per_page = lines_per_page;
        if !self.book.set_pagination(self.document.len(), lines_per_page) {
            return false;
        }
        self.book.resync_to_line(self.cursor.current());
        debug!(
            target: LOG_TARGET,
            "Repaginated at {} lines per page, showing page {} of {}",
            lines_per_page,
            self.book.current_page() + 1,
            self.book.total_pages()
        );
        true
    }

    /// [`on_lines_per_page`](Self::on_lines_per_page) for a measured viewport.
    pub fn on_viewport(&mut self, viewport: Viewport) -> bool {
        self.on_lines_per_page(viewport.lines_per_page(self.min_lines_per_page))
    }

    /// Track playback status changes.
    ///
    /// Leaving `Playing` drops the override without snapping. Entering
    /// `Playing` runs auto-advance for the active line.
    pub fn on_playback(&mut self, status: PlaybackStatus) {
        let was_playing = self.playback.is_playing();
        self.playback = status;

        if !status.is_playing() {
            if self.override_timer.cancel() {
                debug!(target: LOG_TARGET, "Playback {:?}, manual override dropped", status);
            }
            return;
        }
        if !was_playing {
            self.book.auto_advance(self.cursor.current(), false);
        }
    }

    pub fn next_page(&mut self, now: Instant) -> bool {
        self.arm_override(now);
        self.book.next_page()
    }

    pub fn prev_page(&mut self, now: Instant) -> bool {
        self.arm_override(now);
        self.book.prev_page()
    }

    pub fn go_to_page(&mut self, page: i64, now: Instant) -> bool {
        self.arm_override(now);
        self.book.go_to_page(page)
    }

    /// Show the page holding `line` (clamped into the document).
    pub fn jump_to_line(&mut self, line: i64, now: Instant) -> bool {
        self.arm_override(now);
        let page = self.book.find_page_for_line(line);
        self.book.go_to_page(i64::try_from(page).unwrap_or(i64::MAX))
    }

    /// Release the override if its deadline has passed at `now`.
    pub fn poll_override(&mut self, now: Instant) -> bool {
        if self.override_timer.is_expired(now) {
            self.release_override()
        } else {
            false
        }
    }

    /// Release the override and snap back to the active line's page.
    ///
    /// Returns `true` if an override was active.
    pub fn release_override(&mut self) -> bool {
        if !self.override_timer.deactivate() {
            return false;
        }
        self.book.resync_to_line(self.cursor.current());
        debug!(
            target: LOG_TARGET,
            "Manual override released, snapped to page {}",
            self.book.current_page()
        );
        true
    }

    /// Manual navigation only suppresses auto-advance while playing; when
    /// paused nothing advances anyway.
    fn arm_override(&mut self, now: Instant) {
        if self.playback.is_playing() {
            self.override_timer.activate(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::LyricLine;
    use crate::scorebook::TurnReason;

    /// One line per second starting at 0s
    fn document(lines: usize) -> Arc<LyricDocument> {
        let lines = (0..lines)
            .map(|i| {
                let start = Duration::from_secs(u64::try_from(i).unwrap());
                LyricLine::new(
                    format!("line-{i}"),
                    format!("Line {i}"),
                    start,
                    start + Duration::from_secs(1),
                )
            })
            .collect();
        Arc::new(LyricDocument::new(lines).unwrap())
    }

    fn playing_session(lines: usize, lines_per_page: usize) -> Session {
        let mut session = Session::new(&PagingConfig::default());
        session.on_lines_per_page(lines_per_page);
        session.load_document(document(lines));
        session.on_playback(PlaybackStatus::Playing);
        session
    }

    #[test]
    fn test_auto_advance_follows_time() {
        let mut session = playing_session(42, 10);

        assert!(!session.on_time(Duration::from_millis(9500)));
        assert_eq!(session.snapshot().current_page, 0);

        assert!(session.on_time(Duration::from_millis(10_000)));
        assert_eq!(session.snapshot().current_page, 1);
        assert_eq!(session.current_line(), Some(10));

        assert!(session.on_time(Duration::from_secs(41)));
        assert_eq!(session.snapshot().current_page, 4);
    }

    #[test]
    fn test_auto_advance_idempotent() {
        let mut session = playing_session(42, 10);
        let mut turns = session.page_turns();

        assert!(session.on_line_index(Some(25)));
        assert!(!session.on_line_index(Some(25)));

        assert_eq!(turns.try_recv().unwrap().to, 2);
        assert!(turns.try_recv().is_err());
    }

    #[test]
    fn test_paused_does_not_advance() {
        let mut session = playing_session(42, 10);
        session.on_playback(PlaybackStatus::Paused);

        assert!(!session.on_line_index(Some(25)));
        assert_eq!(session.snapshot().current_page, 0);

        // Resuming catches up with the line tracked while paused
        session.on_playback(PlaybackStatus::Playing);
        assert_eq!(session.snapshot().current_page, 2);
    }

    #[test]
    fn test_override_suppresses_auto_advance() {
        let now = Instant::now();
        let mut session = playing_session(42, 10);
        session.on_line_index(Some(5));

        session.go_to_page(3, now);
        assert!(session.override_state().active);

        assert!(!session.on_line_index(Some(12)));
        assert_eq!(session.snapshot().current_page, 3);

        // Expiry snaps to the active line's page
        assert!(!session.poll_override(now + Duration::from_millis(3999)));
        assert!(session.poll_override(now + Duration::from_millis(4000)));
        assert!(!session.override_state().active);
        assert_eq!(session.snapshot().current_page, 1);

        // And auto-advance resumes
        assert!(session.on_line_index(Some(20)));
        assert_eq!(session.snapshot().current_page, 2);
    }

    #[test]
    fn test_stale_override_released_by_line_change() {
        let mut session = playing_session(42, 10);
        session.on_line_index(Some(5));

        // Armed long enough ago that the deadline has passed, never polled
        let armed = Instant::now()
            .checked_sub(Duration::from_secs(10))
            .unwrap();
        session.go_to_page(3, armed);
        assert!(session.override_state().active);

        assert!(session.on_line_index(Some(12)));
        assert!(!session.override_state().active);
        assert_eq!(session.snapshot().current_page, 1);
    }

    #[test]
    fn test_override_is_debounced() {
        let now = Instant::now();
        let mut session = playing_session(42, 10);

        session.next_page(now);
        session.next_page(now + Duration::from_millis(3000));

        assert!(!session.poll_override(now + Duration::from_millis(4500)));
        assert!(session.override_state().active);
        assert_eq!(
            session.override_deadline(),
            Some(now + Duration::from_millis(7000))
        );
    }

    #[test]
    fn test_pause_drops_override_without_snap() {
        let now = Instant::now();
        let mut session = playing_session(42, 10);
        session.on_line_index(Some(5));
        session.go_to_page(3, now);

        session.on_playback(PlaybackStatus::Paused);
        assert!(!session.override_state().active);
        assert_eq!(session.snapshot().current_page, 3);
        assert!(!session.release_override());
    }

    #[test]
    fn test_navigation_while_paused_does_not_arm_override() {
        let now = Instant::now();
        let mut session = Session::new(&PagingConfig::default());
        session.on_lines_per_page(10);
        session.load_document(document(42));

        assert!(session.next_page(now));
        assert!(!session.override_state().active);
    }

    #[test]
    fn test_resize_resync_bypasses_override() {
        let now = Instant::now();
        let mut session = playing_session(42, 10);
        session.on_line_index(Some(25));
        assert_eq!(session.snapshot().current_page, 2);

        session.go_to_page(0, now);
        assert!(session.override_state().active);

        assert!(session.on_lines_per_page(4));
        let state = session.snapshot();
        assert_eq!(state.current_page, state.find_page_for_line(25));
        assert_eq!(state.current_page, 6);
        assert!(session.override_state().active);
    }

    #[test]
    fn test_unchanged_capacity_is_noop() {
        let mut session = playing_session(42, 10);
        let mut rx = session.subscribe();
        assert!(!session.on_lines_per_page(10));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_viewport_capacity() {
        let mut session = playing_session(42, 10);
        assert!(session.on_viewport(Viewport::new(160.0, 32.0)));
        assert_eq!(session.lines_per_page(), 5);
        assert_eq!(session.snapshot().total_pages, 9);
    }

    #[test]
    fn test_jump_to_line() {
        let now = Instant::now();
        let mut session = playing_session(42, 10);

        assert!(session.jump_to_line(33, now));
        assert_eq!(session.snapshot().current_page, 3);
        assert!(session.override_state().active);

        session.jump_to_line(-7, now);
        assert_eq!(session.snapshot().current_page, 0);
        session.jump_to_line(500, now);
        assert_eq!(session.snapshot().current_page, 4);
    }

    #[test]
    fn test_forty_two_line_navigation() {
        let now = Instant::now();
        let mut session = playing_session(42, 10);
        let state = session.snapshot();
        assert_eq!(state.total_pages, 5);
        assert_eq!(state.find_page_for_line(25), 2);

        for _ in 0..3 {
            session.next_page(now);
        }
        assert_eq!(session.snapshot().current_page, 3);

        session.go_to_page(4, now);
        assert!(!session.next_page(now));
        assert_eq!(session.snapshot().current_page, 4);
    }

    #[test]
    fn test_song_change_resets_before_repagination() {
        let now = Instant::now();
        let mut session = playing_session(42, 10);
        session.go_to_page(3, now);
        let mut turns = session.page_turns();

        session.load_document(document(5));

        let state = session.snapshot();
        assert_eq!(state.current_page, 0);
        assert_eq!(state.total_pages, 1);
        assert!(!session.override_state().active);
        assert_eq!(session.current_line(), None);

        let turn = turns.try_recv().unwrap();
        assert_eq!(turn.reason, TurnReason::Reset);
        assert_eq!((turn.from, turn.to), (3, 0));
        assert!(turns.try_recv().is_err(), "no clamp after reset");
    }

    #[test]
    fn test_empty_document() {
        let mut session = playing_session(0, 10);
        assert!(!session.on_time(Duration::from_secs(3)));
        let state = session.snapshot();
        assert_eq!(state.total_pages, 1);
        assert_eq!(state.current_page, 0);
        assert!(state.page_line_ranges.is_empty());
    }

    #[test]
    fn test_seek_backwards() {
        let mut session = playing_session(42, 10);
        session.on_time(Duration::from_secs(35));
        assert_eq!(session.snapshot().current_page, 3);

        assert!(session.on_time(Duration::from_secs(2)));
        assert_eq!(session.snapshot().current_page, 0);
    }

    #[test]
    fn test_release_hook_runs_on_expiry() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let released = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&released);
        let now = Instant::now();
        let mut session = playing_session(42, 10);
        session.on_override_release(move || flag.store(true, Ordering::SeqCst));

        session.next_page(now);
        session.poll_override(now + Duration::from_secs(5));
        assert!(released.load(Ordering::SeqCst));
    }
}
