//! Manual navigation override.
//!
//! While the user is navigating by hand, auto-advance is suppressed. The
//! override expires `timeout` after the most recent manual input. Only one
//! deadline exists at a time: re-activating replaces it.

use std::fmt;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// How long auto-advance stays suppressed after the last manual input.
pub const DEFAULT_OVERRIDE_TIMEOUT: Duration = Duration::from_millis(4000);

/// Observable override state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManualOverrideState {
    pub active: bool,
    pub expires_at: Option<Instant>,
}

type ReleaseHook = Box<dyn FnMut() + Send>;

/// Debounced manual-override timer.
pub struct ManualOverrideTimer {
    timeout: Duration,
    expires_at: Option<Instant>,
    on_release: Option<ReleaseHook>,
}

impl ManualOverrideTimer {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            expires_at: None,
            on_release: None,
        }
    }

    /// Register a hook run each time the override is released by
    /// [`deactivate`](Self::deactivate) (not by [`cancel`](Self::cancel)).
    pub fn set_on_release(&mut self, hook: impl FnMut() + Send + 'static) {
        self.on_release = Some(Box::new(hook));
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.expires_at.is_some()
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.expires_at
    }

    #[must_use]
    pub const fn state(&self) -> ManualOverrideState {
        ManualOverrideState {
            active: self.expires_at.is_some(),
            expires_at: self.expires_at,
        }
    }

    /// Start or extend the override until `now + timeout`.
    pub fn activate(&mut self, now: Instant) {
        self.expires_at = Some(now + self.timeout);
    }

    /// Release the override.
    ///
    /// Returns `true` if it was active; the caller then snaps the view back
    /// to the active line. The release hook runs on the same transition.
    pub fn deactivate(&mut self) -> bool {
        if self.expires_at.take().is_none() {
            return false;
        }
        if let Some(hook) = self.on_release.as_mut() {
            hook();
        }
        true
    }

    /// Drop the override without the snap side effect (playback stopped).
    pub fn cancel(&mut self) -> bool {
        self.expires_at.take().is_some()
    }

    /// Whether the deadline has passed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }

    /// Completes when the current deadline passes; never completes while
    /// inactive. Meant for `tokio::select!` loops that rebuild it each turn.
    pub async fn expired(&self) {
        match self.expires_at {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}

impl Default for ManualOverrideTimer {
    fn default() -> Self {
        Self::new(DEFAULT_OVERRIDE_TIMEOUT)
    }
}

impl fmt::Debug for ManualOverrideTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualOverrideTimer")
            .field("timeout", &self.timeout)
            .field("expires_at", &self.expires_at)
            .field("has_release_hook", &self.on_release.is_some())
            .finish()
    }
}
