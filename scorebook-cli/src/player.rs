use crate::commands::{parse_command, ControlCommand, HELP};
use crate::view::render_page;
use scorebook_core::resolver::resolve;
use scorebook_core::{
    DriverCommand, DriverHandle, LayoutMetrics, LyricDocument, PlaybackClock, PlaybackStatus,
    Result, ScoreBookConfig, Session,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "scorebook::player";

/// Terminal front end: feeds a simulated playback clock and stdin commands
/// into the driver, and prints the page whenever it turns.
pub struct Player {
    handle: DriverHandle,
    document: Arc<LyricDocument>,
    clock: PlaybackClock,
    metrics: LayoutMetrics,
    window_height: f32,
    min_lines_per_page: usize,
    tick: Duration,
    input_open: bool,
}

impl Player {
    #[must_use]
    pub fn new(
        handle: DriverHandle,
        document: Arc<LyricDocument>,
        clock: PlaybackClock,
        metrics: LayoutMetrics,
        window_height: f32,
        config: &ScoreBookConfig,
    ) -> Self {
        Self {
            handle,
            document,
            clock,
            metrics,
            window_height,
            min_lines_per_page: config.scorebook.min_lines_per_page,
            tick: config.playback.tick(),
            input_open: true,
        }
    }

    /// Send the first measurement and the document, then start the clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver has already stopped.
    pub async fn start(&mut self, play: bool) -> Result<()> {
        // The first measurement is already settled, so skip the debounce
        let lines_per_page = self
            .metrics
            .viewport(self.window_height)
            .lines_per_page(self.min_lines_per_page);
        self.handle
            .send(DriverCommand::LinesPerPage(lines_per_page))
            .await?;
        self.handle
            .send(DriverCommand::LoadDocument(Arc::clone(&self.document)))
            .await?;

        let now = Instant::now();
        self.handle
            .send(DriverCommand::Time(self.clock.position(now)))
            .await?;
        if play {
            self.clock.play(now);
            self.handle
                .send(DriverCommand::Playback(PlaybackStatus::Playing))
                .await?;
        }

        info!(
            target: LOG_TARGET,
            "Loaded {} lines, {} per page",
            self.document.len(),
            lines_per_page
        );
        Ok(())
    }

    /// Run on stdin until quit, Ctrl+C, or the end of the song once stdin
    /// is closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver stops unexpectedly.
    pub async fn run(self, cancel_token: CancellationToken) -> Result<Session> {
        self.run_with_input(BufReader::new(tokio::io::stdin()), cancel_token)
            .await
    }

    /// [`run`](Self::run) reading commands from `input`. Once `input` is
    /// exhausted the player exits as soon as the clock is not playing.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver stops unexpectedly.
    pub async fn run_with_input<R>(
        mut self,
        input: R,
        cancel_token: CancellationToken,
    ) -> Result<Session>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut turns = self.handle.page_turns();
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut input = input.lines();

        self.print_page();

        loop {
            tokio::select! {
                () = cancel_token.cancelled() => {
                    break;
                }
                _ = ticker.tick() => {
                    if !self.tick_clock().await? {
                        break;
                    }
                }
                turn = turns.recv() => match turn {
                    Ok(turn) => {
                        debug!(
                            target: LOG_TARGET,
                            "Page {} -> {} ({:?}, {:?})",
                            turn.from, turn.to, turn.direction, turn.reason
                        );
                        self.print_page();
                    }
                    Err(RecvError::Lagged(n)) => {
                        info!(target: LOG_TARGET, "Missed {} page turns", n);
                        self.print_page();
                    }
                    Err(RecvError::Closed) => {
                        info!(target: LOG_TARGET, "Page turn channel closed");
                        break;
                    }
                },
                line = input.next_line(), if self.input_open => match line {
                    Ok(Some(line)) => match parse_command(&line) {
                        Ok(Some(command)) => {
                            if !self.apply(command).await? {
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => warn!(target: LOG_TARGET, "{e}"),
                    },
                    Ok(None) => {
                        debug!(target: LOG_TARGET, "Input closed");
                        self.input_open = false;
                        if self.unattended_and_idle() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(target: LOG_TARGET, "Failed to read input: {}", e);
                        self.input_open = false;
                        if self.unattended_and_idle() {
                            break;
                        }
                    }
                },
            }
        }

        self.handle.shutdown().await
    }

    /// Nobody can send `play` any more and nothing is playing.
    const fn unattended_and_idle(&self) -> bool {
        !self.input_open && !self.clock.is_playing()
    }

    /// Push the clock position to the driver. Returns `false` once nothing
    /// is playing and there is nobody left to send commands.
    async fn tick_clock(&mut self) -> Result<bool> {
        let now = Instant::now();
        self.handle
            .send(DriverCommand::Time(self.clock.position(now)))
            .await?;

        if self.clock.is_playing() && self.clock.finished(now) {
            info!(target: LOG_TARGET, "Reached the end of the song");
            self.clock.pause(now);
            self.handle
                .send(DriverCommand::Playback(PlaybackStatus::Stopped))
                .await?;
        }
        Ok(!self.unattended_and_idle())
    }

    /// Apply one stdin command. Returns `false` on quit.
    async fn apply(&mut self, command: ControlCommand) -> Result<bool> {
        let now = Instant::now();
        match command {
            ControlCommand::Next => self.handle.send(DriverCommand::NextPage).await?,
            ControlCommand::Prev => self.handle.send(DriverCommand::PrevPage).await?,
            ControlCommand::GoToPage(page) => {
                self.handle
                    .send(DriverCommand::GoToPage(page.saturating_sub(1)))
                    .await?;
            }
            ControlCommand::JumpToLine(line) => {
                self.handle
                    .send(DriverCommand::JumpToLine(line.saturating_sub(1)))
                    .await?;
            }
            ControlCommand::Play => {
                self.clock.play(now);
                self.handle
                    .send(DriverCommand::Playback(PlaybackStatus::Playing))
                    .await?;
            }
            ControlCommand::Pause => {
                self.clock.pause(now);
                self.handle
                    .send(DriverCommand::Playback(PlaybackStatus::Paused))
                    .await?;
            }
            ControlCommand::Seek(position) => {
                self.clock.seek(position, now);
                self.handle
                    .send(DriverCommand::Time(self.clock.position(now)))
                    .await?;
            }
            ControlCommand::Resize(height) => {
                self.window_height = height;
                self.send_viewport().await?;
            }
            ControlCommand::FontScale(scale) => {
                self.metrics = self.metrics.with_font_scale(scale);
                self.send_viewport().await?;
            }
            ControlCommand::State => self.print_state(),
            ControlCommand::Help => println!("{HELP}"),
            ControlCommand::Quit => return Ok(false),
        }
        Ok(true)
    }

    async fn send_viewport(&self) -> Result<()> {
        let viewport = self.metrics.viewport(self.window_height);
        debug!(
            target: LOG_TARGET,
            "Measured {:.0}px for lines of {:.0}px",
            viewport.available_height,
            viewport.line_height
        );
        self.handle.send(DriverCommand::Viewport(viewport)).await
    }

    fn print_page(&self) {
        let current_line = resolve(
            self.document.lines(),
            self.clock.position(Instant::now()),
        );
        print!(
            "{}",
            render_page(&self.handle.snapshot(), &self.document, current_line)
        );
    }

    fn print_state(&self) {
        match serde_json::to_string_pretty(&self.handle.snapshot()) {
            Ok(json) => println!("{json}"),
            Err(e) => warn!(target: LOG_TARGET, "Failed to serialize state: {}", e),
        }
    }
}
