//! Distance filter.
//!
//! Gates the fix stream by great-circle displacement from the last
//! reported fix. The emitted stream is always a subsequence of the
//! input stream, and with the filter enabled every consecutive pair of
//! emitted fixes is at least the threshold apart.

use crate::fix::{Coordinate, Fix};
use crate::geo;

/// Displacement gate over the reported fix stream.
#[derive(Debug, Clone)]
pub struct DistanceFilter {
    /// Threshold in meters; non-positive disables the filter.
    threshold_m: f64,

    /// Coordinate of the last fix that passed.
    last: Option<Coordinate>,
}

impl DistanceFilter {
    /// Create a filter with the given threshold.
    pub fn new(threshold_m: f64) -> Self {
        Self {
            threshold_m,
            last: None,
        }
    }

    /// Current threshold in meters.
    pub fn threshold_m(&self) -> f64 {
        self.threshold_m
    }

    /// Change the threshold. Takes effect on the next check; the last
    /// reported position is kept.
    pub fn set_threshold_m(&mut self, threshold_m: f64) {
        self.threshold_m = threshold_m;
    }

    /// Whether the filter is currently a pass-through.
    pub fn is_disabled(&self) -> bool {
        self.threshold_m <= 0.0
    }

    /// Decide whether a fix is reported, recording it if it passes.
    ///
    /// The first fix after a reset always passes.
    pub fn check(&mut self, fix: &Fix) -> bool {
        if self.is_disabled() {
            self.last = Some(fix.coordinate);
            return true;
        }

        match self.last {
            None => {
                self.last = Some(fix.coordinate);
                true
            }
            Some(previous) => {
                if geo::haversine_m(previous, fix.coordinate) >= self.threshold_m {
                    self.last = Some(fix.coordinate);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Forget the last reported position; the next fix passes
    /// unconditionally.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
