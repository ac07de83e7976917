//! The client-facing session.
//!
//! A [`Session`] owns one provider registry view, one region monitor,
//! one delegate dispatcher and one control loop. All state transitions
//! (lifecycle, configuration, pause promotion, rescheduling) are
//! serialized through a single control mutex; provider fetches and
//! delegate callbacks run on worker tasks.
//!
//! # Lifecycle
//!
//! Created idle. [`start_updating_location`](Session::start_updating_location)
//! arms the control loop, which fetches a fix on every tick of the
//! adaptive cadence (the first tick fires immediately).
//! [`stop_updating_location`](Session::stop_updating_location) cancels
//! the loop and any in-flight request, clears the last reported fix and
//! the stationary anchor, and preserves region states.

use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::config::SessionConfig;
use super::dispatch::EventSink;
use super::filter::DistanceFilter;
use super::scheduler::{AdaptiveScheduler, Cadence};
use super::stationary::StationaryDetector;
use crate::accuracy::AccuracyTier;
use crate::delegate::{AuthorizationStatus, LocationDelegate};
use crate::error::LocationError;
use crate::fix::Fix;
use crate::provider::ProviderRegistry;
use crate::region::{Region, RegionMonitor, RegionState};

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Not delivering updates.
    Idle,
    /// Delivering updates at the foreground or background cadence.
    Running,
    /// Auto-paused by the stationary detector; fixes are still fetched
    /// and delivered, at the stationary cadence.
    Paused,
}

/// Control state serialized behind the session mutex.
struct ControlState {
    config: SessionConfig,
    filter: DistanceFilter,
    stationary: StationaryDetector,
    scheduler: AdaptiveScheduler,
    last_reported: Option<Fix>,
    authorization: AuthorizationStatus,
    /// Parent token for the control loop and one-shot requests.
    /// Replaced wholesale by stop() so later operations are unaffected.
    ops_cancel: CancellationToken,
    running: bool,
}

struct SessionInner {
    registry: Arc<ProviderRegistry>,
    monitor: RegionMonitor,
    sink: EventSink,
    control: Mutex<ControlState>,
    /// Woken when the selected interval changes so the control loop
    /// observes the new cadence immediately.
    reschedule: Notify,
}

/// A single client-facing configuration-plus-lifecycle unit.
///
/// Multiple sessions may coexist in one process and share a registry
/// (and with it the per-provider caches). Dropping a session stops it.
///
/// Must be created and used within a tokio runtime.
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Create an idle session with default configuration.
    pub fn new(registry: Arc<ProviderRegistry>, delegate: Arc<dyn LocationDelegate>) -> Self {
        Self::with_config(registry, delegate, SessionConfig::default())
    }

    /// Create an idle session with the given configuration.
    pub fn with_config(
        registry: Arc<ProviderRegistry>,
        delegate: Arc<dyn LocationDelegate>,
        config: SessionConfig,
    ) -> Self {
        let filter = DistanceFilter::new(config.distance_filter_m);
        let mut scheduler = AdaptiveScheduler::new();
        scheduler.reconfigure(config.allows_background, false);

        Self {
            inner: Arc::new(SessionInner {
                registry,
                monitor: RegionMonitor::new(),
                sink: EventSink::spawn(delegate),
                control: Mutex::new(ControlState {
                    config,
                    filter,
                    stationary: StationaryDetector::new(),
                    scheduler,
                    last_reported: None,
                    authorization: AuthorizationStatus::default(),
                    ops_cancel: CancellationToken::new(),
                    running: false,
                }),
                reschedule: Notify::new(),
            }),
        }
    }

    // ==================== configuration ====================

    /// Requested accuracy tier. Observed by the next tick.
    pub fn set_desired_accuracy(&self, tier: AccuracyTier) {
        self.inner.control.lock().unwrap().config.desired_accuracy = tier;
    }

    /// Currently requested accuracy tier.
    pub fn desired_accuracy(&self) -> AccuracyTier {
        self.inner.control.lock().unwrap().config.desired_accuracy
    }

    /// Minimum displacement between reported fixes in meters;
    /// non-positive disables the filter.
    pub fn set_distance_filter(&self, meters: f64) {
        let mut control = self.inner.control.lock().unwrap();
        control.config.distance_filter_m = meters;
        control.filter.set_threshold_m(meters);
    }

    /// Current distance filter in meters.
    pub fn distance_filter(&self) -> f64 {
        self.inner.control.lock().unwrap().config.distance_filter_m
    }

    /// Switch between the foreground and background cadences.
    pub fn set_allows_background(&self, allowed: bool) {
        let mut control = self.inner.control.lock().unwrap();
        control.config.allows_background = allowed;
        let paused = control.stationary.is_paused();
        if control.scheduler.reconfigure(allowed, paused) {
            self.inner.reschedule.notify_one();
        }
    }

    /// Whether the background cadence is selected when moving.
    pub fn allows_background(&self) -> bool {
        self.inner.control.lock().unwrap().config.allows_background
    }

    /// Gate the stationary detector. Switching it off resumes a paused
    /// session and drops the dwell anchor.
    pub fn set_pauses_automatically(&self, enabled: bool) {
        let mut control = self.inner.control.lock().unwrap();
        control.config.pauses_automatically = enabled;
        if !enabled {
            control.stationary.reset();
            let background = control.config.allows_background;
            if control.scheduler.reconfigure(background, false) {
                self.inner.reschedule.notify_one();
            }
        }
    }

    /// Whether auto-pause is enabled.
    pub fn pauses_automatically(&self) -> bool {
        self.inner.control.lock().unwrap().config.pauses_automatically
    }

    // ==================== status ====================

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        let control = self.inner.control.lock().unwrap();
        if !control.running {
            SessionPhase::Idle
        } else if control.stationary.is_paused() {
            SessionPhase::Paused
        } else {
            SessionPhase::Running
        }
    }

    /// Whether the stationary detector has paused the session.
    pub fn is_paused(&self) -> bool {
        self.inner.control.lock().unwrap().stationary.is_paused()
    }

    /// Currently selected polling cadence.
    pub fn current_cadence(&self) -> Cadence {
        self.inner.control.lock().unwrap().scheduler.cadence()
    }

    /// Currently selected polling interval.
    pub fn current_interval(&self) -> std::time::Duration {
        self.inner.control.lock().unwrap().scheduler.interval()
    }

    /// The last fix reported to the delegate, if any.
    pub fn last_reported(&self) -> Option<Fix> {
        self.inner.control.lock().unwrap().last_reported.clone()
    }

    // ==================== authorization ====================

    /// Record an externally-made authorization change and forward it to
    /// the delegate. The engine itself never changes the status.
    pub fn set_authorization_status(&self, status: AuthorizationStatus) {
        self.inner.control.lock().unwrap().authorization = status;
        info!(status = %status, "authorization status changed");
        self.inner.sink.authorization_changed(status);
    }

    /// The externally-managed authorization status.
    pub fn authorization_status(&self) -> AuthorizationStatus {
        self.inner.control.lock().unwrap().authorization
    }

    // ==================== lifecycle ====================

    /// Start streaming location updates. Idempotent: calling this on a
    /// running session leaves its cadence untouched.
    ///
    /// The control loop's first tick fires immediately; subsequent
    /// ticks follow the adaptive cadence.
    pub fn start_updating_location(&self) {
        let cancel = {
            let mut control = self.inner.control.lock().unwrap();
            if control.running {
                trace!("start requested while already running");
                return;
            }
            control.running = true;
            control.ops_cancel.child_token()
        };

        info!("location updates starting");
        let inner = Arc::clone(&self.inner);
        tokio::spawn(run_loop(inner, cancel));
    }

    /// Stop streaming and cancel in-flight work.
    ///
    /// Clears the last reported fix and the stationary anchor so the
    /// next start reports its first fix unconditionally. Region states
    /// are preserved.
    pub fn stop_updating_location(&self) {
        let cancelled = {
            let mut control = self.inner.control.lock().unwrap();
            let was_running = control.running;
            control.running = false;
            control.last_reported = None;
            control.filter.reset();
            control.stationary.reset();
            let background = control.config.allows_background;
            control.scheduler.reconfigure(background, false);

            let old = std::mem::replace(&mut control.ops_cancel, CancellationToken::new());
            old.cancel();
            was_running
        };

        self.inner.registry.stop_started();
        if cancelled {
            info!("location updates stopped");
        }
    }

    /// One-shot request: walk the fallback ladder once, apply the
    /// distance filter and region evaluation, and emit one update or
    /// one terminal error. Cancellable by [`stop_updating_location`];
    /// cancellation emits nothing.
    pub async fn request_location(&self) {
        let (tier, cancel) = {
            let control = self.inner.control.lock().unwrap();
            (
                control.config.desired_accuracy,
                control.ops_cancel.child_token(),
            )
        };

        match self.inner.registry.request_with_fallback(tier, cancel).await {
            Ok(fix) => self.inner.deliver(fix),
            Err(LocationError::Cancelled) => {}
            Err(err) => {
                warn!(error = %err, "one-shot location request failed");
                self.inner.sink.fail(err);
            }
        }
    }

    // ==================== region monitoring ====================

    /// Whether this engine can monitor the given kind of region.
    /// Always true: regions are circular by construction and served by
    /// the software geofence.
    pub fn monitoring_available(&self) -> bool {
        true
    }

    /// Begin monitoring a region. Emits `on_start_monitoring` on
    /// success or `on_monitoring_failed` for an invalid region.
    pub fn start_monitoring(&self, region: Region) {
        match self.inner.monitor.add(region.clone()) {
            Ok(()) => self.inner.sink.monitoring_started(region),
            Err(err) => {
                warn!(region = %region.identifier, error = %err, "monitoring rejected");
                self.inner.sink.monitoring_failed(Some(region), err);
            }
        }
    }

    /// Stop monitoring a region; its state is discarded.
    pub fn stop_monitoring(&self, region: &Region) {
        self.inner.monitor.remove(&region.identifier);
    }

    /// Determine a region's current state against the most recent
    /// reported fix and emit `on_determine_state`.
    pub fn request_state(&self, region: &Region) {
        let state = self.inner.monitor.determine_state(region);
        self.inner.sink.state_determined(state, region.clone());
    }

    /// Copies of the currently monitored regions.
    pub fn monitored_regions(&self) -> Vec<Region> {
        self.inner.monitor.regions()
    }

    /// Tracked state of a monitored region.
    pub fn region_state(&self, identifier: &str) -> Option<RegionState> {
        self.inner.monitor.state_of(identifier)
    }

    // ==================== delivery ====================

    /// Wait until every delegate callback enqueued so far has been
    /// delivered. Useful for tests and orderly shutdown.
    pub async fn flush(&self) {
        self.inner.sink.flush().await;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop_updating_location();
    }
}

impl SessionInner {
    /// Fetch one fix at the configured tier and deliver it.
    async fn tick(&self, cancel: &CancellationToken) {
        let tier = self.control.lock().unwrap().config.desired_accuracy;

        match self
            .registry
            .request_with_fallback(tier, cancel.child_token())
            .await
        {
            Ok(fix) => self.deliver(fix),
            // A cancelled fetch must never reach the delegate
            Err(LocationError::Cancelled) => {}
            Err(err) => {
                warn!(tier = %tier, error = %err, "location tick failed");
                self.sink.fail(err);
            }
        }
    }

    /// Run a fetched fix through the filter, the stationary detector
    /// and the region monitor, then enqueue its callbacks.
    ///
    /// The whole decision runs under the control mutex so concurrent
    /// one-shot and streaming deliveries enqueue atomically; the queue
    /// pushes are channel sends, no delegate code runs under the lock.
    fn deliver(&self, fix: Fix) {
        if !fix.coordinate.is_valid() {
            trace!(source = %fix.source, "dropping fix with invalid coordinate");
            return;
        }

        let mut control = self.control.lock().unwrap();

        if !control.filter.check(&fix) {
            trace!(coordinate = %fix.coordinate, "fix gated by distance filter");
            return;
        }
        control.last_reported = Some(fix.clone());

        let auto_pause = control.config.pauses_automatically;
        let paused = control.stationary.observe(&fix, auto_pause);
        let background = control.config.allows_background;
        if control.scheduler.reconfigure(background, paused) {
            self.reschedule.notify_one();
        }

        // Region callbacks for this fix precede its location callback
        for event in self.monitor.on_fix_reported(&fix) {
            self.sink.region_event(event);
        }
        debug!(
            source = %fix.source,
            coordinate = %fix.coordinate,
            "reporting fix"
        );
        self.sink.update(fix);
    }
}

/// The control loop: tick, then sleep for the selected interval. An
/// interval change wakes the sleep so the next tick fires immediately.
async fn run_loop(inner: Arc<SessionInner>, cancel: CancellationToken) {
    loop {
        if cancel.is_cancelled() {
            break;
        }

        inner.tick(&cancel).await;

        let period = inner.control.lock().unwrap().scheduler.interval();
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,
            _ = inner.reschedule.notified() => {
                trace!("cadence change observed, ticking immediately");
            }
            _ = tokio::time::sleep(period) => {}
        }
    }
    debug!("control loop exited");
}
