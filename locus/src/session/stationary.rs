//! Stationary detector.
//!
//! Watches the reported fix stream and decides when the session has
//! dwelt long enough inside a small radius to be considered
//! stationary. The radius and dwell timeout are fixed by the design,
//! not client-tunable.

use std::time::{Duration, SystemTime};

use tracing::debug;

use crate::fix::{Coordinate, Fix};
use crate::geo;

/// Radius within which movement does not reset the dwell anchor.
pub const STATIONARY_RADIUS_M: f64 = 10.0;

/// Dwell time inside the radius before the session is paused.
pub const STATIONARY_DWELL: Duration = Duration::from_secs(60);

/// Dwell-based MOVING / STATIONARY state machine.
#[derive(Debug, Clone, Default)]
pub struct StationaryDetector {
    anchor: Option<Coordinate>,
    anchor_since: Option<SystemTime>,
    paused: bool,
}

impl StationaryDetector {
    /// Create a detector with no anchor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the session is currently considered stationary.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Observe a reported fix and return the paused state after it.
    ///
    /// With `auto_pause` off the detector is inert and unpauses. A fix
    /// beyond [`STATIONARY_RADIUS_M`] of the anchor re-anchors and
    /// unpauses; a fix within the radius pauses once the dwell since
    /// the anchor's timestamp reaches [`STATIONARY_DWELL`].
    pub fn observe(&mut self, fix: &Fix, auto_pause: bool) -> bool {
        if !auto_pause {
            self.paused = false;
            return false;
        }

        match (self.anchor, self.anchor_since) {
            (Some(anchor), Some(since)) => {
                let displacement = geo::haversine_m(anchor, fix.coordinate);
                if displacement > STATIONARY_RADIUS_M {
                    self.anchor = Some(fix.coordinate);
                    self.anchor_since = Some(fix.timestamp);
                    if self.paused {
                        debug!(displacement_m = displacement, "movement detected, resuming");
                    }
                    self.paused = false;
                } else {
                    let dwell = fix
                        .timestamp
                        .duration_since(since)
                        .unwrap_or_default();
                    if dwell >= STATIONARY_DWELL && !self.paused {
                        debug!(dwell_secs = dwell.as_secs(), "dwell reached, pausing");
                        self.paused = true;
                    }
                }
            }
            _ => {
                self.anchor = Some(fix.coordinate);
                self.anchor_since = Some(fix.timestamp);
                self.paused = false;
            }
        }

        self.paused
    }

    /// Drop the anchor and unpause. Called on session stop and when
    /// auto-pause is switched off.
    pub fn reset(&mut self) {
        self.anchor = None;
        self.anchor_since = None;
        self.paused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix_at_time(latitude: f64, longitude: f64, offset: Duration) -> Fix {
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        Fix::new(Coordinate::new(latitude, longitude), 5.0).with_timestamp(base + offset)
    }

    #[test]
    fn test_inert_without_auto_pause() {
        let mut detector = StationaryDetector::new();

        for i in 0..120 {
            let paused = detector.observe(
                &fix_at_time(37.7749, -122.4194, Duration::from_secs(i)),
                false,
            );
            assert!(!paused);
        }
    }

    #[test]
    fn test_first_fix_anchors_without_pausing() {
        let mut detector = StationaryDetector::new();
        let paused = detector.observe(&fix_at_time(37.7749, -122.4194, Duration::ZERO), true);

        assert!(!paused);
    }

    #[test]
    fn test_dwell_promotes_to_paused() {
        let mut detector = StationaryDetector::new();

        // Identical fixes spaced 1s apart; the dwell reaches 60s at
        // the 61st observation
        for i in 0..=59 {
            let paused = detector.observe(
                &fix_at_time(37.7749, -122.4194, Duration::from_secs(i)),
                true,
            );
            assert!(!paused, "should still be moving at t={}s", i);
        }
        let paused = detector.observe(
            &fix_at_time(37.7749, -122.4194, Duration::from_secs(60)),
            true,
        );
        assert!(paused);
    }

    #[test]
    fn test_small_movement_keeps_anchor() {
        let mut detector = StationaryDetector::new();

        detector.observe(&fix_at_time(37.7749, -122.4194, Duration::ZERO), true);
        // ~5.5m north, inside the 10m radius
        let paused = detector.observe(
            &fix_at_time(37.77495, -122.4194, Duration::from_secs(61)),
            true,
        );
        assert!(paused, "dwell inside the radius should pause");
    }

    #[test]
    fn test_movement_reanchors_and_resumes() {
        let mut detector = StationaryDetector::new();

        detector.observe(&fix_at_time(37.7749, -122.4194, Duration::ZERO), true);
        detector.observe(&fix_at_time(37.7749, -122.4194, Duration::from_secs(60)), true);
        assert!(detector.is_paused());

        // ~22m north, beyond the radius
        let paused = detector.observe(
            &fix_at_time(37.7751, -122.4194, Duration::from_secs(61)),
            true,
        );
        assert!(!paused);

        // Dwell restarts from the new anchor
        let paused = detector.observe(
            &fix_at_time(37.7751, -122.4194, Duration::from_secs(119)),
            true,
        );
        assert!(!paused, "dwell must restart after re-anchoring");
        let paused = detector.observe(
            &fix_at_time(37.7751, -122.4194, Duration::from_secs(121)),
            true,
        );
        assert!(paused);
    }

    #[test]
    fn test_disabling_auto_pause_resumes() {
        let mut detector = StationaryDetector::new();

        detector.observe(&fix_at_time(37.7749, -122.4194, Duration::ZERO), true);
        detector.observe(&fix_at_time(37.7749, -122.4194, Duration::from_secs(60)), true);
        assert!(detector.is_paused());

        let paused = detector.observe(
            &fix_at_time(37.7749, -122.4194, Duration::from_secs(61)),
            false,
        );
        assert!(!paused);
    }

    #[test]
    fn test_reset_clears_anchor() {
        let mut detector = StationaryDetector::new();

        detector.observe(&fix_at_time(37.7749, -122.4194, Duration::ZERO), true);
        detector.observe(&fix_at_time(37.7749, -122.4194, Duration::from_secs(60)), true);
        assert!(detector.is_paused());

        detector.reset();
        assert!(!detector.is_paused());

        // After reset the dwell starts over
        let paused = detector.observe(
            &fix_at_time(37.7749, -122.4194, Duration::from_secs(90)),
            true,
        );
        assert!(!paused);
    }
}
