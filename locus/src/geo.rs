//! Great-circle navigation math.
//!
//! Provides the distance and bearing primitives used by the distance
//! filter, the stationary detector, and region containment checks.
//!
//! # Coordinate System
//!
//! - Latitude: degrees north (-90 to 90)
//! - Longitude: degrees east (-180 to 180)
//! - Bearing: degrees true (0-360, 0=north, 90=east)
//! - Distance: meters

use std::f64::consts::PI;

use crate::fix::Coordinate;

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Degrees to radians conversion factor.
const DEG_TO_RAD: f64 = PI / 180.0;

/// Radians to degrees conversion factor.
const RAD_TO_DEG: f64 = 180.0 / PI;

/// Calculate the great-circle distance between two coordinates.
///
/// Uses the haversine formula on a spherical earth model, which is
/// accurate to well under 0.5% for the distances this engine cares
/// about (distance filters and geofence radii).
///
/// # Example
///
/// ```
/// use locus::fix::Coordinate;
/// use locus::geo::haversine_m;
///
/// // 1 degree of latitude is approximately 111 km
/// let d = haversine_m(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
/// assert!((d - 111_195.0).abs() < 100.0);
/// ```
pub fn haversine_m(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.latitude * DEG_TO_RAD;
    let lat2_rad = to.latitude * DEG_TO_RAD;
    let delta_lat = (to.latitude - from.latitude) * DEG_TO_RAD;
    let delta_lon = (to.longitude - from.longitude) * DEG_TO_RAD;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Calculate the initial bearing from one coordinate to another.
///
/// Returns the forward azimuth at the starting point of the great
/// circle through both coordinates.
///
/// # Example
///
/// ```
/// use locus::fix::Coordinate;
/// use locus::geo::initial_bearing;
///
/// // Bearing from the origin to a point due east
/// let bearing = initial_bearing(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0));
/// assert!((bearing - 90.0).abs() < 0.1);
/// ```
pub fn initial_bearing(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.latitude * DEG_TO_RAD;
    let lat2_rad = to.latitude * DEG_TO_RAD;
    let delta_lon = (to.longitude - from.longitude) * DEG_TO_RAD;

    let y = delta_lon.sin() * lat2_rad.cos();
    let x = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * delta_lon.cos();

    let bearing_deg = y.atan2(x) * RAD_TO_DEG;
    normalize_bearing(bearing_deg)
}

/// Normalize a bearing to the range [0, 360) degrees.
///
/// Handles negative bearings and values >= 360 by wrapping appropriately.
pub fn normalize_bearing(bearing: f64) -> f64 {
    let mut b = bearing % 360.0;
    if b < 0.0 {
        b += 360.0;
    }
    b
}
