//! Async driver owning a [`Session`] on a tokio task.
//!
//! All inputs arrive as [`DriverCommand`]s on one channel and are applied in
//! order by a single task, so the session never sees concurrent mutation.
//! The task also owns the two timers of the subsystem: the manual override
//! deadline and the viewport settle (debounce) deadline.

use crate::config::PagingConfig;
use crate::document::LyricDocument;
use crate::error::{CoreError, Result};
use crate::playback::PlaybackStatus;
use crate::scorebook::{PageTurn, ScoreBookState};
use crate::session::Session;
use crate::viewport::Viewport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "scorebook::driver";

const COMMAND_CAPACITY: usize = 64;

/// Inputs accepted by the driver.
#[derive(Debug, Clone)]
pub enum DriverCommand {
    /// Song change
    LoadDocument(Arc<LyricDocument>),
    /// Playback clock position
    Time(Duration),
    Playback(PlaybackStatus),
    /// Raw measurement; applied once measurements stop changing
    Viewport(Viewport),
    /// Already-settled page capacity; applied immediately
    LinesPerPage(usize),
    NextPage,
    PrevPage,
    GoToPage(i64),
    JumpToLine(i64),
}

#[derive(Debug, Clone, Copy)]
struct PendingResize {
    lines_per_page: usize,
    deadline: Instant,
}

struct DriverState {
    session: Session,
    pending_resize: Option<PendingResize>,
    resize_debounce: Duration,
    min_lines_per_page: usize,
}

impl DriverState {
    fn handle(&mut self, command: DriverCommand) {
        let now = Instant::now();
        match command {
            DriverCommand::LoadDocument(document) => {
                info!(target: LOG_TARGET, "Loading document with {} lines", document.len());
                self.session.load_document(document);
            }
            DriverCommand::Time(time) => {
                self.session.on_time(time);
            }
            DriverCommand::Playback(status) => {
                debug!(target: LOG_TARGET, "Playback status {:?}", status);
                self.session.on_playback(status);
            }
            DriverCommand::Viewport(viewport) => {
                // Replaces any pending measurement and restarts the settle delay
                self.pending_resize = Some(PendingResize {
                    lines_per_page: viewport.lines_per_page(self.min_lines_per_page),
                    deadline: now + self.resize_debounce,
                });
            }
            DriverCommand::LinesPerPage(lines_per_page) => {
                self.pending_resize = None;
                self.session.on_lines_per_page(lines_per_page);
            }
            DriverCommand::NextPage => {
                self.session.next_page(now);
            }
            DriverCommand::PrevPage => {
                self.session.prev_page(now);
            }
            DriverCommand::GoToPage(page) => {
                self.session.go_to_page(page, now);
            }
            DriverCommand::JumpToLine(line) => {
                self.session.jump_to_line(line, now);
            }
        }
    }

    fn apply_pending_resize(&mut self) {
        if let Some(pending) = self.pending_resize.take() {
            debug!(
                target: LOG_TARGET,
                "Viewport settled at {} lines per page",
                pending.lines_per_page
            );
            self.session.on_lines_per_page(pending.lines_per_page);
        }
    }
}

/// Runs a [`Session`] until cancelled or every command sender is dropped.
pub struct ScoreBookDriver {
    state: DriverState,
    commands: mpsc::Receiver<DriverCommand>,
    cancel_token: CancellationToken,
}

impl ScoreBookDriver {
    /// Spawn the driver on the current tokio runtime.
    ///
    /// # Arguments
    /// * `session` - Session to drive; returned by [`DriverHandle::shutdown`]
    /// * `config` - Paging settings (resize debounce, minimum capacity)
    /// * `cancel_token` - Optional external cancellation token for graceful shutdown
    #[must_use]
    pub fn spawn(
        session: Session,
        config: &PagingConfig,
        cancel_token: Option<CancellationToken>,
    ) -> DriverHandle {
        let (tx, commands) = mpsc::channel(COMMAND_CAPACITY);
        let cancel_token = cancel_token.unwrap_or_default();
        let state_rx = session.subscribe();
        let turns = session.page_turns();

        let driver = Self {
            state: DriverState {
                session,
                pending_resize: None,
                resize_debounce: config.resize_debounce(),
                min_lines_per_page: config.min_lines_per_page.max(1),
            },
            commands,
            cancel_token: cancel_token.clone(),
        };

        DriverHandle {
            tx,
            state_rx,
            turns,
            cancel_token,
            join: tokio::spawn(driver.run()),
        }
    }

    async fn run(mut self) -> Session {
        info!(target: LOG_TARGET, "Score book driver started");

        loop {
            let override_deadline = self.state.session.override_deadline();
            let resize_deadline = self.state.pending_resize.map(|p| p.deadline);

            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(target: LOG_TARGET, "Score book driver shutting down");
                    break;
                }
                () = sleep_until_some(override_deadline) => {
                    self.state.session.release_override();
                }
                () = sleep_until_some(resize_deadline) => {
                    self.state.apply_pending_resize();
                }
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        info!(target: LOG_TARGET, "All command senders dropped, stopping driver");
                        break;
                    };
                    self.state.handle(command);
                }
            }
        }

        self.state.session
    }
}

/// Sleeps until `deadline`, or forever when there is none.
async fn sleep_until_some(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Handle for sending commands to and observing a running driver.
pub struct DriverHandle {
    tx: mpsc::Sender<DriverCommand>,
    state_rx: watch::Receiver<ScoreBookState>,
    turns: broadcast::Receiver<PageTurn>,
    cancel_token: CancellationToken,
    join: JoinHandle<Session>,
}

impl DriverHandle {
    /// Queue a command.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DriverClosed`] if the driver has stopped.
    pub async fn send(&self, command: DriverCommand) -> Result<()> {
        self.tx.send(command).await.map_err(|_| CoreError::DriverClosed)
    }

    /// A cloneable sender for producers running on other tasks.
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<DriverCommand> {
        self.tx.clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ScoreBookState> {
        self.state_rx.clone()
    }

    #[must_use]
    pub fn page_turns(&self) -> broadcast::Receiver<PageTurn> {
        self.turns.resubscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> ScoreBookState {
        self.state_rx.borrow().clone()
    }

    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Stop the driver and take back its session.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DriverClosed`] if the driver task panicked or was aborted.
    pub async fn shutdown(self) -> Result<Session> {
        self.cancel_token.cancel();
        self.join.await.map_err(|e| {
            warn!(target: LOG_TARGET, "Driver task failed: {}", e);
            CoreError::DriverClosed
        })
    }
}
