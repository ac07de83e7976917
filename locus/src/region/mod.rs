//! Circular region monitoring.
//!
//! - [`Region`] - A named circular area with entry/exit notify flags
//! - [`RegionState`] - Unknown / Inside / Outside per region
//! - [`RegionEvent`] - Transition events computed from reported fixes
//! - [`RegionMonitor`] - The table of monitored regions and their states

mod monitor;
mod types;

pub use monitor::RegionMonitor;
pub use types::{Region, RegionEvent, RegionState};
