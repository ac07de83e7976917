//! Locus - a cross-platform location session engine.
//!
//! Locus reproduces the observable semantics of the familiar mobile
//! location-services model on systems without one: a client configures
//! a desired accuracy, an optional distance filter and a delegate, and
//! receives a stream (or a single shot) of geospatial fixes sourced
//! from pluggable positioning backends, plus boundary-crossing events
//! for registered circular regions.
//!
//! # High-Level API
//!
//! ```ignore
//! use std::sync::Arc;
//! use locus::accuracy::AccuracyTier;
//! use locus::provider::ProviderRegistry;
//! use locus::session::Session;
//!
//! let mut registry = ProviderRegistry::new();
//! registry.register(AccuracyTier::Best, gps_provider);
//! registry.register(AccuracyTier::Kilometer, ip_provider);
//!
//! let session = Session::new(Arc::new(registry), delegate);
//! session.set_distance_filter(50.0);
//! session.start_updating_location();
//! ```
//!
//! Backends implement [`provider::Provider`]; everything between them
//! and the delegate (per-provider caching, the accuracy fallback
//! ladder, distance filtering, stationary detection, adaptive polling
//! and region monitoring) is this crate.

pub mod accuracy;
pub mod delegate;
pub mod error;
pub mod fix;
pub mod geo;
pub mod provider;
pub mod region;
pub mod session;

/// Version of the locus library.
///
/// Defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_geo_module_exists() {
        use crate::fix::Coordinate;
        let d = geo::haversine_m(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0));
        assert!(d > 0.0);
    }
}
