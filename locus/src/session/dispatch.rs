//! Serialized delegate dispatch.
//!
//! All delegate callbacks for a session are delivered by one spawned
//! dispatcher task consuming an unbounded event queue. Enqueue order is
//! delivery order, which gives the session its ordering guarantees: the
//! fix stream is totally ordered, and the region events for a fix
//! precede its location callback. The dispatcher holds no engine lock
//! while calling the delegate.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::trace;

use crate::delegate::{AuthorizationStatus, LocationDelegate};
use crate::error::LocationError;
use crate::fix::Fix;
use crate::region::{Region, RegionEvent, RegionState};

/// An owned event queued for delegate delivery.
pub(crate) enum DelegateEvent {
    Update(Fix),
    Fail(LocationError),
    AuthorizationChanged(AuthorizationStatus),
    EnteredRegion(Region),
    ExitedRegion(Region),
    StateDetermined(RegionState, Region),
    MonitoringFailed(Option<Region>, LocationError),
    MonitoringStarted(Region),
    /// Acknowledged once every earlier event has been delivered.
    Flush(oneshot::Sender<()>),
}

/// Sending half of the dispatch queue.
#[derive(Clone)]
pub(crate) struct EventSink {
    tx: mpsc::UnboundedSender<DelegateEvent>,
}

impl EventSink {
    /// Spawn the dispatcher task for a delegate and return its sink.
    ///
    /// The task ends when every sink clone is dropped. Must be called
    /// from within a tokio runtime.
    pub fn spawn(delegate: Arc<dyn LocationDelegate>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(dispatch_loop(rx, delegate));
        Self { tx }
    }

    fn send(&self, event: DelegateEvent) {
        // The dispatcher outlives every sink, so this only fails
        // during teardown when delivery no longer matters.
        let _ = self.tx.send(event);
    }

    pub fn update(&self, fix: Fix) {
        self.send(DelegateEvent::Update(fix));
    }

    pub fn fail(&self, error: LocationError) {
        self.send(DelegateEvent::Fail(error));
    }

    pub fn authorization_changed(&self, status: AuthorizationStatus) {
        self.send(DelegateEvent::AuthorizationChanged(status));
    }

    pub fn region_event(&self, event: RegionEvent) {
        match event {
            RegionEvent::Entered(region) => self.send(DelegateEvent::EnteredRegion(region)),
            RegionEvent::Exited(region) => self.send(DelegateEvent::ExitedRegion(region)),
        }
    }

    pub fn state_determined(&self, state: RegionState, region: Region) {
        self.send(DelegateEvent::StateDetermined(state, region));
    }

    pub fn monitoring_failed(&self, region: Option<Region>, error: LocationError) {
        self.send(DelegateEvent::MonitoringFailed(region, error));
    }

    pub fn monitoring_started(&self, region: Region) {
        self.send(DelegateEvent::MonitoringStarted(region));
    }

    /// Wait until everything enqueued before this call is delivered.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        self.send(DelegateEvent::Flush(tx));
        let _ = rx.await;
    }
}

async fn dispatch_loop(
    mut rx: mpsc::UnboundedReceiver<DelegateEvent>,
    delegate: Arc<dyn LocationDelegate>,
) {
    while let Some(event) = rx.recv().await {
        match event {
            DelegateEvent::Update(fix) => delegate.on_update(&fix),
            DelegateEvent::Fail(error) => delegate.on_fail(&error),
            DelegateEvent::AuthorizationChanged(status) => {
                delegate.on_authorization_changed(status)
            }
            DelegateEvent::EnteredRegion(region) => delegate.on_enter_region(&region),
            DelegateEvent::ExitedRegion(region) => delegate.on_exit_region(&region),
            DelegateEvent::StateDetermined(state, region) => {
                delegate.on_determine_state(state, &region)
            }
            DelegateEvent::MonitoringFailed(region, error) => {
                delegate.on_monitoring_failed(region.as_ref(), &error)
            }
            DelegateEvent::MonitoringStarted(region) => delegate.on_start_monitoring(&region),
            DelegateEvent::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    trace!("delegate dispatcher stopped");
}
