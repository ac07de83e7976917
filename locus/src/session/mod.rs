//! Client-facing session: configuration, lifecycle and delivery.
//!
//! - [`Session`] - The facade owning the control loop and delegate sink
//! - [`SessionConfig`] - Desired accuracy, distance filter, cadence flags
//! - [`SessionPhase`] - Idle / Running / Paused lifecycle
//! - [`DistanceFilter`] - Gates fixes by great-circle displacement
//! - [`StationaryDetector`] - Promotes dwelling sessions to Paused
//! - [`AdaptiveScheduler`] - Foreground / background / stationary cadence

mod config;
mod dispatch;
mod facade;
mod filter;
mod scheduler;
mod stationary;

pub use config::{SessionConfig, DISTANCE_FILTER_NONE};
pub use facade::{Session, SessionPhase};
pub use filter::DistanceFilter;
pub use scheduler::{
    AdaptiveScheduler, Cadence, BACKGROUND_INTERVAL, FOREGROUND_INTERVAL, STATIONARY_INTERVAL,
};
pub use stationary::{StationaryDetector, STATIONARY_DWELL, STATIONARY_RADIUS_M};
