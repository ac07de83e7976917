//! Adaptive polling cadence.
//!
//! Selects one of three fixed intervals from the session's background
//! flag and paused state. The control loop re-reads the interval on
//! every iteration and is woken when it changes, so a new cadence is
//! observed no later than the next tick.

use std::time::Duration;

use tracing::debug;

/// Polling interval while foregrounded and moving.
pub const FOREGROUND_INTERVAL: Duration = Duration::from_secs(1);

/// Polling interval while backgrounded and moving.
pub const BACKGROUND_INTERVAL: Duration = Duration::from_secs(30);

/// Polling interval while stationary, regardless of background mode.
pub const STATIONARY_INTERVAL: Duration = Duration::from_secs(60);

/// The three polling cadences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Foreground,
    Background,
    Stationary,
}

impl Cadence {
    /// Select the cadence for a mode/paused combination.
    pub fn select(allows_background: bool, paused: bool) -> Self {
        if paused {
            Cadence::Stationary
        } else if allows_background {
            Cadence::Background
        } else {
            Cadence::Foreground
        }
    }

    /// The polling interval for this cadence.
    pub fn interval(self) -> Duration {
        match self {
            Cadence::Foreground => FOREGROUND_INTERVAL,
            Cadence::Background => BACKGROUND_INTERVAL,
            Cadence::Stationary => STATIONARY_INTERVAL,
        }
    }
}

impl std::fmt::Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Foreground => write!(f, "foreground"),
            Self::Background => write!(f, "background"),
            Self::Stationary => write!(f, "stationary"),
        }
    }
}

/// Tracks the selected cadence and reports changes.
#[derive(Debug, Clone)]
pub struct AdaptiveScheduler {
    cadence: Cadence,
}

impl AdaptiveScheduler {
    /// Start at the foreground cadence.
    pub fn new() -> Self {
        Self {
            cadence: Cadence::Foreground,
        }
    }

    /// Currently selected cadence.
    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    /// Currently selected polling interval.
    pub fn interval(&self) -> Duration {
        self.cadence.interval()
    }

    /// Re-select the cadence; returns true if it changed.
    pub fn reconfigure(&mut self, allows_background: bool, paused: bool) -> bool {
        let next = Cadence::select(allows_background, paused);
        if next == self.cadence {
            return false;
        }

        debug!(from = %self.cadence, to = %next, "polling cadence changed");
        self.cadence = next;
        true
    }
}

impl Default for AdaptiveScheduler {
    fn default() -> Self {
        Self::new()
    }
}
