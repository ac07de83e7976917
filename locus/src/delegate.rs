//! Client-facing event sink.
//!
//! A [`LocationDelegate`] receives everything the engine emits: filtered
//! fixes, terminal errors, region transitions and monitoring lifecycle
//! events. Every method has a default no-op body so clients implement
//! only the events they care about.
//!
//! Callbacks are delivered on a single dispatcher task owned by the
//! session, so for one session they never run concurrently and never
//! run under an engine lock.

use crate::error::LocationError;
use crate::fix::Fix;
use crate::region::{Region, RegionState};

/// Authorization status for location access.
///
/// The engine never mutates this itself; the host mutates it externally
/// and the session forwards the change to the delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizationStatus {
    /// The user has not yet been asked.
    #[default]
    NotDetermined,
    /// Access was denied or is restricted by policy.
    Denied,
    /// Access is granted.
    Authorized,
}

impl std::fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotDetermined => write!(f, "not determined"),
            Self::Denied => write!(f, "denied"),
            Self::Authorized => write!(f, "authorized"),
        }
    }
}

/// Receiver for session events. All methods default to no-ops.
pub trait LocationDelegate: Send + Sync {
    /// A fix passed the distance filter and was reported.
    fn on_update(&self, _fix: &Fix) {}

    /// A terminal error was surfaced (never `Cancelled`).
    fn on_fail(&self, _error: &LocationError) {}

    /// The externally-managed authorization status changed.
    fn on_authorization_changed(&self, _status: AuthorizationStatus) {}

    /// A reported fix crossed into a monitored region.
    fn on_enter_region(&self, _region: &Region) {}

    /// A reported fix crossed out of a monitored region.
    fn on_exit_region(&self, _region: &Region) {}

    /// The state of a region was determined on request.
    fn on_determine_state(&self, _state: RegionState, _region: &Region) {}

    /// Monitoring could not be started for a region.
    fn on_monitoring_failed(&self, _region: Option<&Region>, _error: &LocationError) {}

    /// Monitoring started for a region.
    fn on_start_monitoring(&self, _region: &Region) {}
}
