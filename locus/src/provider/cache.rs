//! Per-provider single-slot cache.
//!
//! Each provider carries exactly one last-good fix and the instant at
//! which it was fetched. The freshness window equals the provider's
//! declared polling interval, so a sequence of requests over an
//! interval `T` costs at most `ceil(T / polling_interval) + 1` backend
//! calls. If a live fetch fails while the slot still holds a fix less
//! than 30 seconds old, that fix is re-served and the failure is
//! swallowed; older outages propagate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::{timeout, Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::types::{Provider, ProviderError};
use crate::fix::Fix;

/// How long an expired fix may still be re-served after a failed fetch.
const STALE_ON_ERROR_WINDOW: Duration = Duration::from_secs(30);

/// The cached slot. Empty until the first successful fetch.
#[derive(Default)]
struct CacheSlot {
    fix: Option<Fix>,
    fetched_at: Option<Instant>,
}

impl CacheSlot {
    /// Return the cached fix if it was fetched within `window`.
    fn get_within(&self, window: Duration) -> Option<Fix> {
        match (&self.fix, self.fetched_at) {
            (Some(fix), Some(at)) if at.elapsed() < window => Some(fix.clone()),
            _ => None,
        }
    }

    fn replace(&mut self, fix: Fix) {
        self.fix = Some(fix);
        self.fetched_at = Some(Instant::now());
    }
}

/// A provider wrapped with the engine's memoization contract.
///
/// Caches are shared when one provider serves multiple accuracy tiers
/// or multiple sessions, so all state is internally synchronized:
/// fresh reads take the read lock concurrently, and a live fetch holds
/// the write lease for the duration of the backend call so concurrent
/// expirees coalesce onto a single backend round-trip.
pub struct CachedProvider {
    provider: Arc<dyn Provider>,
    slot: RwLock<CacheSlot>,
    backend_calls: AtomicU64,
}

impl CachedProvider {
    /// Wrap a provider with a fresh, empty cache.
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            slot: RwLock::new(CacheSlot::default()),
            backend_calls: AtomicU64::new(0),
        }
    }

    /// Identifier of the wrapped provider.
    pub fn id(&self) -> &str {
        self.provider.id()
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Number of backend calls made through this cache.
    pub fn backend_calls(&self) -> u64 {
        self.backend_calls.load(Ordering::Relaxed)
    }

    /// Request a fix, serving from cache when fresh.
    ///
    /// Applies the provider's request timeout around the backend call
    /// and maps elapse to [`ProviderError::Timeout`]. Cancellation is
    /// never masked by stale data.
    pub async fn request_location(&self, cancel: CancellationToken) -> Result<Fix, ProviderError> {
        let freshness = self.provider.polling_interval();

        {
            let slot = self.slot.read().await;
            if let Some(fix) = slot.get_within(freshness) {
                trace!(provider = self.id(), "serving cached fix");
                return Ok(fix);
            }
        }

        let mut slot = self.slot.write().await;

        // Another caller may have refreshed the slot while we waited
        // for the write lease.
        if let Some(fix) = slot.get_within(freshness) {
            trace!(provider = self.id(), "slot refreshed while waiting");
            return Ok(fix);
        }

        self.backend_calls.fetch_add(1, Ordering::Relaxed);
        let deadline = self.provider.request_timeout();

        let result = tokio::select! {
            biased;

            _ = cancel.cancelled() => Err(ProviderError::Cancelled),

            fetched = timeout(deadline, self.provider.request_location(cancel.clone())) => {
                match fetched {
                    Ok(inner) => inner,
                    Err(_) => Err(ProviderError::Timeout(deadline)),
                }
            }
        };

        match result {
            Ok(fix) => {
                slot.replace(fix.clone());
                Ok(fix)
            }
            Err(ProviderError::Cancelled) => Err(ProviderError::Cancelled),
            Err(err) => {
                if let Some(stale) = slot.get_within(STALE_ON_ERROR_WINDOW) {
                    debug!(
                        provider = self.id(),
                        error = %err,
                        "backend failed, re-serving stale fix"
                    );
                    return Ok(stale);
                }
                Err(err)
            }
        }
    }
}
