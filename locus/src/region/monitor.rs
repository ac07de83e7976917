//! The monitored-region table and its transition logic.
//!
//! The monitor owns copies of all monitored regions, their last-known
//! containment states, and the most recent reported fix. Transition
//! computation happens under the table's write lock; the resulting
//! events are returned to the caller and emitted only after the lock
//! is released, so a delegate callback never runs under it.

use std::collections::BTreeMap;
use std::sync::RwLock;

use tracing::{debug, trace};

use super::types::{Region, RegionEvent, RegionState};
use crate::error::LocationError;
use crate::fix::Fix;

/// A monitored region and its tracked state.
struct MonitoredRegion {
    region: Region,
    state: RegionState,
}

/// Table state guarded by the monitor's lock.
///
/// A `BTreeMap` keyed by identifier keeps evaluation order stable, so
/// identical fix sequences always produce identical event sequences.
#[derive(Default)]
struct MonitorState {
    regions: BTreeMap<String, MonitoredRegion>,
    last_fix: Option<Fix>,
}

/// Set of circular regions evaluated against every reported fix.
pub struct RegionMonitor {
    state: RwLock<MonitorState>,
}

impl RegionMonitor {
    /// Create an empty monitor.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MonitorState::default()),
        }
    }

    /// Insert a region, validating it first.
    ///
    /// Re-adding an identifier replaces the stored definition (notify
    /// flags included) but preserves the tracked state, so a flag
    /// change is observed by the next evaluation without a spurious
    /// initial determination. A new identifier starts at `Unknown`.
    pub fn add(&self, region: Region) -> Result<(), LocationError> {
        region.validate()?;

        let mut state = self.state.write().unwrap();
        match state.regions.get_mut(&region.identifier) {
            Some(monitored) => {
                trace!(region = %region.identifier, "monitored region replaced");
                monitored.region = region;
            }
            None => {
                debug!(region = %region.identifier, "region monitoring started");
                state.regions.insert(
                    region.identifier.clone(),
                    MonitoredRegion {
                        region,
                        state: RegionState::Unknown,
                    },
                );
            }
        }
        Ok(())
    }

    /// Remove a region by identifier, discarding its state.
    ///
    /// Returns true if the region was monitored.
    pub fn remove(&self, identifier: &str) -> bool {
        let removed = self
            .state
            .write()
            .unwrap()
            .regions
            .remove(identifier)
            .is_some();
        if removed {
            debug!(region = %identifier, "region monitoring stopped");
        }
        removed
    }

    /// Copies of all monitored regions.
    pub fn regions(&self) -> Vec<Region> {
        self.state
            .read()
            .unwrap()
            .regions
            .values()
            .map(|m| m.region.clone())
            .collect()
    }

    /// Tracked state of a monitored region.
    pub fn state_of(&self, identifier: &str) -> Option<RegionState> {
        self.state
            .read()
            .unwrap()
            .regions
            .get(identifier)
            .map(|m| m.state)
    }

    /// Determine the current state of a region on request.
    ///
    /// Uses the most recent reported fix; `Unknown` if none has been
    /// reported yet. If the region is monitored, the determination is
    /// recorded as its tracked state (a later fix in the same state
    /// produces no transition event).
    pub fn determine_state(&self, region: &Region) -> RegionState {
        let mut state = self.state.write().unwrap();

        let determined = match &state.last_fix {
            None => RegionState::Unknown,
            Some(fix) => {
                if region.contains(fix.coordinate) {
                    RegionState::Inside
                } else {
                    RegionState::Outside
                }
            }
        };

        if determined != RegionState::Unknown {
            if let Some(monitored) = state.regions.get_mut(&region.identifier) {
                monitored.state = determined;
            }
        }

        determined
    }

    /// Evaluate a reported fix against every monitored region.
    ///
    /// Updates each region's tracked state and returns the transition
    /// events to emit. Transitions out of `Unknown` are silent, and
    /// the notify flags gate their respective directions. The caller
    /// emits the events after this method returns, outside the lock.
    pub fn on_fix_reported(&self, fix: &Fix) -> Vec<RegionEvent> {
        let mut events = Vec::new();
        let mut state = self.state.write().unwrap();
        state.last_fix = Some(fix.clone());

        for monitored in state.regions.values_mut() {
            let previous = monitored.state;
            let current = if monitored.region.contains(fix.coordinate) {
                RegionState::Inside
            } else {
                RegionState::Outside
            };
            monitored.state = current;

            if previous == current || previous == RegionState::Unknown {
                continue;
            }

            match current {
                RegionState::Inside if monitored.region.notify_on_entry => {
                    trace!(region = %monitored.region.identifier, "region entered");
                    events.push(RegionEvent::Entered(monitored.region.clone()));
                }
                RegionState::Outside if monitored.region.notify_on_exit => {
                    trace!(region = %monitored.region.identifier, "region exited");
                    events.push(RegionEvent::Exited(monitored.region.clone()));
                }
                _ => {}
            }
        }

        events
    }
}

impl Default for RegionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fix::Coordinate;

    const CENTER: Coordinate = Coordinate {
        latitude: 37.7749,
        longitude: -122.4194,
    };

    fn fix_at(latitude: f64, longitude: f64) -> Fix {
        Fix::new(Coordinate::new(latitude, longitude), 10.0)
    }

    fn inside_fix() -> Fix {
        fix_at(37.7750, -122.4194)
    }

    fn outside_fix() -> Fix {
        fix_at(37.8500, -122.4194)
    }

    #[test]
    fn test_add_rejects_invalid_region() {
        let monitor = RegionMonitor::new();
        let err = monitor
            .add(Region::circle("bad", CENTER, -1.0))
            .unwrap_err();
        assert!(matches!(err, LocationError::InvalidRegion(_)));
        assert!(monitor.regions().is_empty());
    }

    #[test]
    fn test_initial_state_is_unknown() {
        let monitor = RegionMonitor::new();
        monitor.add(Region::circle("sf", CENTER, 500.0)).unwrap();
        assert_eq!(monitor.state_of("sf"), Some(RegionState::Unknown));
    }

    #[test]
    fn test_unknown_transition_is_silent() {
        let monitor = RegionMonitor::new();
        monitor.add(Region::circle("sf", CENTER, 500.0)).unwrap();

        // First fix determines Inside without an event
        let events = monitor.on_fix_reported(&inside_fix());
        assert!(events.is_empty());
        assert_eq!(monitor.state_of("sf"), Some(RegionState::Inside));
    }

    #[test]
    fn test_entry_transition() {
        let monitor = RegionMonitor::new();
        monitor.add(Region::circle("sf", CENTER, 500.0)).unwrap();

        assert!(monitor.on_fix_reported(&outside_fix()).is_empty());
        let events = monitor.on_fix_reported(&inside_fix());

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], RegionEvent::Entered(r) if r.identifier == "sf"));
    }

    #[test]
    fn test_exit_transition() {
        let monitor = RegionMonitor::new();
        monitor.add(Region::circle("sf", CENTER, 500.0)).unwrap();

        monitor.on_fix_reported(&inside_fix());
        let events = monitor.on_fix_reported(&outside_fix());

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], RegionEvent::Exited(r) if r.identifier == "sf"));
    }

    #[test]
    fn test_no_event_without_state_change() {
        let monitor = RegionMonitor::new();
        monitor.add(Region::circle("sf", CENTER, 500.0)).unwrap();

        monitor.on_fix_reported(&inside_fix());
        assert!(monitor.on_fix_reported(&inside_fix()).is_empty());
        assert!(monitor.on_fix_reported(&inside_fix()).is_empty());
    }

    #[test]
    fn test_notify_flags_gate_events() {
        let monitor = RegionMonitor::new();
        monitor
            .add(Region::circle("sf", CENTER, 500.0).with_notify(false, true))
            .unwrap();

        monitor.on_fix_reported(&outside_fix());
        // Entry suppressed
        assert!(monitor.on_fix_reported(&inside_fix()).is_empty());
        // Exit still fires
        let events = monitor.on_fix_reported(&outside_fix());
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], RegionEvent::Exited(_)));
    }

    #[test]
    fn test_readd_preserves_state_and_updates_flags() {
        let monitor = RegionMonitor::new();
        monitor.add(Region::circle("sf", CENTER, 500.0)).unwrap();
        monitor.on_fix_reported(&inside_fix());
        assert_eq!(monitor.state_of("sf"), Some(RegionState::Inside));

        // Mutate the flags by re-adding; the tracked state survives
        monitor
            .add(Region::circle("sf", CENTER, 500.0).with_notify(true, false))
            .unwrap();
        assert_eq!(monitor.state_of("sf"), Some(RegionState::Inside));

        // The next evaluation observes the new flags: exit suppressed
        assert!(monitor.on_fix_reported(&outside_fix()).is_empty());
        assert_eq!(monitor.state_of("sf"), Some(RegionState::Outside));
    }

    #[test]
    fn test_remove_discards_state() {
        let monitor = RegionMonitor::new();
        monitor.add(Region::circle("sf", CENTER, 500.0)).unwrap();
        monitor.on_fix_reported(&inside_fix());

        assert!(monitor.remove("sf"));
        assert_eq!(monitor.state_of("sf"), None);
        assert!(!monitor.remove("sf"));

        // Re-added region starts over at Unknown
        monitor.add(Region::circle("sf", CENTER, 500.0)).unwrap();
        assert_eq!(monitor.state_of("sf"), Some(RegionState::Unknown));
    }

    #[test]
    fn test_determine_state_without_fix() {
        let monitor = RegionMonitor::new();
        let region = Region::circle("sf", CENTER, 500.0);
        monitor.add(region.clone()).unwrap();

        assert_eq!(monitor.determine_state(&region), RegionState::Unknown);
        // Unknown determination does not overwrite the tracked state
        assert_eq!(monitor.state_of("sf"), Some(RegionState::Unknown));
    }

    #[test]
    fn test_determine_state_against_last_fix() {
        let monitor = RegionMonitor::new();
        let region = Region::circle("sf", CENTER, 500.0);
        monitor.add(region.clone()).unwrap();
        monitor.on_fix_reported(&inside_fix());

        assert_eq!(monitor.determine_state(&region), RegionState::Inside);

        // Works for a region that is not monitored too
        let other = Region::circle("far", Coordinate::new(40.7128, -74.0060), 500.0);
        assert_eq!(monitor.determine_state(&other), RegionState::Outside);
    }

    #[test]
    fn test_determine_state_records_for_monitored_region() {
        let monitor = RegionMonitor::new();
        let region = Region::circle("sf", CENTER, 500.0);
        monitor.add(region.clone()).unwrap();

        monitor.on_fix_reported(&inside_fix());
        monitor.remove("sf");
        monitor.add(region.clone()).unwrap();
        assert_eq!(monitor.state_of("sf"), Some(RegionState::Unknown));

        // Determination seeds the tracked state, so the next inside
        // fix is not a transition
        monitor.determine_state(&region);
        assert_eq!(monitor.state_of("sf"), Some(RegionState::Inside));
        assert!(monitor.on_fix_reported(&inside_fix()).is_empty());
    }

    #[test]
    fn test_event_order_is_deterministic() {
        // Two regions both transitioning on the same fix always emit
        // in identifier order
        let monitor = RegionMonitor::new();
        monitor.add(Region::circle("alpha", CENTER, 500.0)).unwrap();
        monitor.add(Region::circle("beta", CENTER, 800.0)).unwrap();

        monitor.on_fix_reported(&outside_fix());
        let events = monitor.on_fix_reported(&inside_fix());

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], RegionEvent::Entered(r) if r.identifier == "alpha"));
        assert!(matches!(&events[1], RegionEvent::Entered(r) if r.identifier == "beta"));
    }
}
