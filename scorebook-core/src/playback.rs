use crate::time::DurationExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Whether the playback clock is advancing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    Playing,
    Paused,
    #[default]
    Stopped,
}

impl PlaybackStatus {
    #[must_use]
    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }
}

/// Playback position interpolated from an anchor, like a remote player's
/// last reported position plus the time elapsed since.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    status: PlaybackStatus,
    /// Position at `anchor_instant`
    anchor_position: Duration,
    anchor_instant: Instant,
    speed: f64,
    /// Track length; the position never runs past it
    duration: Option<Duration>,
}

impl PlaybackClock {
    #[must_use]
    pub fn new(speed: f64) -> Self {
        Self {
            status: PlaybackStatus::Stopped,
            anchor_position: Duration::ZERO,
            anchor_instant: Instant::now(),
            speed,
            duration: None,
        }
    }

    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    #[must_use]
    pub const fn status(&self) -> PlaybackStatus {
        self.status
    }

    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.status.is_playing()
    }

    /// Interpolated position at `now`, clamped to the track duration
    #[must_use]
    pub fn position(&self, now: Instant) -> Duration {
        let position = if self.status.is_playing() {
            let elapsed = now.saturating_duration_since(self.anchor_instant);
            self.anchor_position.saturating_add(elapsed.scaled(self.speed))
        } else {
            self.anchor_position
        };
        self.duration.map_or(position, |d| position.min(d))
    }

    /// True once a bounded track has played to its end
    #[must_use]
    pub fn finished(&self, now: Instant) -> bool {
        self.duration.is_some_and(|d| self.position(now) >= d)
    }

    pub fn play(&mut self, now: Instant) {
        if self.status.is_playing() {
            return;
        }
        self.anchor_instant = now;
        self.status = PlaybackStatus::Playing;
    }

    pub fn pause(&mut self, now: Instant) {
        if !self.status.is_playing() {
            return;
        }
        self.anchor_position = self.position(now);
        self.anchor_instant = now;
        self.status = PlaybackStatus::Paused;
    }

    pub fn seek(&mut self, position: Duration, now: Instant) {
        self.anchor_position = self.duration.map_or(position, |d| position.min(d));
        self.anchor_instant = now;
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new(1.0)
    }
}
