//! Session configuration.

use crate::accuracy::AccuracyTier;

/// Sentinel distance filter value meaning "report every fix".
pub const DISTANCE_FILTER_NONE: f64 = -1.0;

/// Client-set configuration for a session.
///
/// Every field can be changed while the session runs; changes are
/// observed by the next timer tick.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Accuracy tier requested from the provider registry.
    pub desired_accuracy: AccuracyTier,

    /// Minimum displacement in meters between reported fixes.
    /// Non-positive values (the [`DISTANCE_FILTER_NONE`] sentinel)
    /// disable the filter.
    pub distance_filter_m: f64,

    /// Use the relaxed background polling cadence.
    pub allows_background: bool,

    /// Let the stationary detector pause the session automatically.
    pub pauses_automatically: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            desired_accuracy: AccuracyTier::Best,
            distance_filter_m: DISTANCE_FILTER_NONE,
            allows_background: false,
            pauses_automatically: false,
        }
    }
}
