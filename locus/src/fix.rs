//! Core sample types for location tracking.
//!
//! This module defines the value types that flow through the engine:
//!
//! - [`Coordinate`] - A latitude/longitude pair with an "invalid" sentinel
//! - [`Fix`] - An immutable geospatial sample with accuracy and motion data
//!
//! A [`Fix`] is frozen at construction. Components that enrich a fix
//! (for example the registry tagging the emitting provider) do so by
//! consuming it and producing a new value.

use std::time::{Duration, SystemTime};

/// Sentinel for numeric fields whose value is unknown or invalid.
///
/// Applies to vertical accuracy, course, course accuracy, speed and
/// speed accuracy.
pub const UNKNOWN: f64 = -1.0;

/// A latitude/longitude pair in degrees.
///
/// A coordinate with NaN in either field is the "invalid" sentinel and
/// is never reported to a delegate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,

    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
}

impl Coordinate {
    /// The invalid coordinate sentinel.
    pub const INVALID: Self = Self {
        latitude: f64::NAN,
        longitude: f64::NAN,
    };

    /// Create a new coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check whether this coordinate is a reportable position.
    ///
    /// Returns false for NaN fields and for values outside the valid
    /// latitude/longitude ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// An immutable geospatial sample.
///
/// Carries the position plus accuracy and motion metadata, the wall
/// time at which the sample was taken, and the identifier of the
/// provider that produced it.
///
/// # Sentinels
///
/// Accuracy, course and speed fields use [`UNKNOWN`] (-1) to denote an
/// unknown or invalid value. Horizontal accuracy is always >= 0 for a
/// usable fix.
#[derive(Debug, Clone)]
pub struct Fix {
    /// Position of this sample.
    pub coordinate: Coordinate,

    /// Altitude above mean sea level in meters.
    pub altitude_m: f64,

    /// Horizontal accuracy radius in meters (>= 0).
    pub horizontal_accuracy_m: f64,

    /// Vertical accuracy in meters, or [`UNKNOWN`].
    pub vertical_accuracy_m: f64,

    /// Course over ground in degrees (0 to 359.999), or [`UNKNOWN`].
    pub course_deg: f64,

    /// Course accuracy in degrees, or [`UNKNOWN`].
    pub course_accuracy_deg: f64,

    /// Ground speed in meters per second, or [`UNKNOWN`].
    pub speed_mps: f64,

    /// Speed accuracy in meters per second, or [`UNKNOWN`].
    pub speed_accuracy_mps: f64,

    /// Wall time at which this sample was measured.
    pub timestamp: SystemTime,

    /// Identifier of the provider that produced this sample.
    pub source: String,
}

impl Fix {
    /// Create a fix with the given position and horizontal accuracy.
    ///
    /// All other metadata fields start as [`UNKNOWN`], the timestamp is
    /// now, and the source is empty until a provider tags it.
    pub fn new(coordinate: Coordinate, horizontal_accuracy_m: f64) -> Self {
        Self {
            coordinate,
            altitude_m: 0.0,
            horizontal_accuracy_m,
            vertical_accuracy_m: UNKNOWN,
            course_deg: UNKNOWN,
            course_accuracy_deg: UNKNOWN,
            speed_mps: UNKNOWN,
            speed_accuracy_mps: UNKNOWN,
            timestamp: SystemTime::now(),
            source: String::new(),
        }
    }

    /// Set the altitude, consuming self.
    pub fn with_altitude(mut self, altitude_m: f64, vertical_accuracy_m: f64) -> Self {
        self.altitude_m = altitude_m;
        self.vertical_accuracy_m = vertical_accuracy_m;
        self
    }

    /// Set the course over ground, consuming self.
    pub fn with_course(mut self, course_deg: f64, course_accuracy_deg: f64) -> Self {
        self.course_deg = course_deg;
        self.course_accuracy_deg = course_accuracy_deg;
        self
    }

    /// Set the ground speed, consuming self.
    pub fn with_speed(mut self, speed_mps: f64, speed_accuracy_mps: f64) -> Self {
        self.speed_mps = speed_mps;
        self.speed_accuracy_mps = speed_accuracy_mps;
        self
    }

    /// Set the measurement timestamp, consuming self.
    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Tag this fix with the identifier of the provider that emitted it.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Get the age of this fix (wall time elapsed since measurement).
    ///
    /// Returns zero if the clock has gone backwards.
    pub fn age(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.timestamp)
            .unwrap_or_default()
    }

    /// Check if this fix is older than the given duration.
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.age() > max_age
    }

    /// Check whether the course field carries a usable value.
    pub fn has_course(&self) -> bool {
        self.course_deg >= 0.0
    }

    /// Check whether the speed field carries a usable value.
    pub fn has_speed(&self) -> bool {
        self.speed_mps >= 0.0
    }
}
