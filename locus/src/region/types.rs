//! Region value types.

use crate::error::LocationError;
use crate::fix::Coordinate;
use crate::geo;

/// A named circular geographic area.
///
/// Regions are value types: the monitor stores its own copy, and a
/// client mutating its copy must re-add the region for the change to
/// be observed.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Non-empty identifier, unique within a monitor.
    pub identifier: String,

    /// Center of the circle.
    pub center: Coordinate,

    /// Radius in meters, > 0.
    pub radius_m: f64,

    /// Emit an event when a fix crosses into the region.
    pub notify_on_entry: bool,

    /// Emit an event when a fix crosses out of the region.
    pub notify_on_exit: bool,
}

impl Region {
    /// Create a circular region notifying on both entry and exit.
    pub fn circle(identifier: impl Into<String>, center: Coordinate, radius_m: f64) -> Self {
        Self {
            identifier: identifier.into(),
            center,
            radius_m,
            notify_on_entry: true,
            notify_on_exit: true,
        }
    }

    /// Adjust the notify flags, consuming self.
    pub fn with_notify(mut self, on_entry: bool, on_exit: bool) -> Self {
        self.notify_on_entry = on_entry;
        self.notify_on_exit = on_exit;
        self
    }

    /// Validate the region for monitoring.
    pub fn validate(&self) -> Result<(), LocationError> {
        if self.identifier.is_empty() {
            return Err(LocationError::InvalidRegion(
                "identifier must not be empty".into(),
            ));
        }
        if !(self.radius_m > 0.0) {
            return Err(LocationError::InvalidRegion(format!(
                "radius must be positive, got {}",
                self.radius_m
            )));
        }
        if !self.center.is_valid() {
            return Err(LocationError::InvalidRegion(format!(
                "center {} is not a valid coordinate",
                self.center
            )));
        }
        Ok(())
    }

    /// Containment test: great-circle distance from the center is at
    /// most the radius.
    pub fn contains(&self, coordinate: Coordinate) -> bool {
        geo::haversine_m(self.center, coordinate) <= self.radius_m
    }
}

/// Containment state of a monitored region.
///
/// Transitions out of `Unknown` are the initial determination and are
/// never reported as entry/exit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegionState {
    /// No fix has been evaluated against this region yet.
    #[default]
    Unknown,
    /// The last evaluated fix was inside the region.
    Inside,
    /// The last evaluated fix was outside the region.
    Outside,
}

impl std::fmt::Display for RegionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Inside => write!(f, "inside"),
            Self::Outside => write!(f, "outside"),
        }
    }
}

/// A transition produced by evaluating a reported fix.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionEvent {
    /// The fix crossed from Outside to Inside a region with
    /// `notify_on_entry` set.
    Entered(Region),
    /// The fix crossed from Inside to Outside a region with
    /// `notify_on_exit` set.
    Exited(Region),
}
