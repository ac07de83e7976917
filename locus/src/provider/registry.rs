//! Accuracy-tier provider registry and fallback ladder.
//!
//! The registry is a dense six-slot table mapping each
//! [`AccuracyTier`] to a cached provider. A request names a tier; the
//! registry walks that tier's fallback ladder (coarser tiers first,
//! finer tiers as a last resort) until a provider yields a fix.
//!
//! One provider may serve several tiers. Its cache is shared across
//! all of them, keyed by provider id, so the ladder never calls the
//! same backend twice in one walk and sessions sharing a registry
//! share its memoization.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use super::cache::CachedProvider;
use super::types::{Provider, ProviderError};
use crate::accuracy::AccuracyTier;
use crate::error::LocationError;
use crate::fix::Fix;

/// Tier-indexed provider table with fallback.
///
/// The table is immutable once the registry is shared; overrides are
/// injected by [`register`](Self::register)-ing over a tier before the
/// registry is wrapped in an `Arc`.
pub struct ProviderRegistry {
    /// One slot per tier, indexed by `AccuracyTier::index()`.
    table: [Option<Arc<CachedProvider>>; 6],

    /// Provider id to shared cache, so a provider serving several
    /// tiers keeps a single slot.
    shared: DashMap<String, Arc<CachedProvider>>,

    /// Id of the provider whose start hook ran last.
    started: Mutex<Option<String>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            table: Default::default(),
            shared: DashMap::new(),
            started: Mutex::new(None),
        }
    }

    /// Register a provider for a tier, replacing any previous entry.
    ///
    /// Registering the same provider (by id) for several tiers shares
    /// one cache between them.
    pub fn register(&mut self, tier: AccuracyTier, provider: Arc<dyn Provider>) {
        let key = provider.id().to_string();
        let entry = self
            .shared
            .entry(key)
            .or_insert_with(|| Arc::new(CachedProvider::new(provider)));
        let cached = Arc::clone(entry.value());
        drop(entry);

        debug!(tier = %tier, provider = cached.id(), "provider registered");
        self.table[tier.index()] = Some(cached);
    }

    /// The provider serving a tier, if any.
    pub fn provider_for(&self, tier: AccuracyTier) -> Option<&Arc<CachedProvider>> {
        self.table[tier.index()].as_ref()
    }

    /// Check whether any tier has a provider.
    pub fn is_empty(&self) -> bool {
        self.table.iter().all(|slot| slot.is_none())
    }

    /// Ladder candidates for a tier, deduplicated by provider id.
    ///
    /// Order follows [`AccuracyTier::fallback_ladder`]; a provider
    /// appears once, at the position of the first tier it serves.
    pub fn candidates(&self, tier: AccuracyTier) -> Vec<Arc<CachedProvider>> {
        let mut seen: Vec<&str> = Vec::new();
        let mut candidates = Vec::new();

        for rung in tier.fallback_ladder() {
            if let Some(cached) = self.provider_for(rung) {
                if !seen.contains(&cached.id()) {
                    seen.push(cached.id());
                    candidates.push(Arc::clone(cached));
                }
            }
        }

        candidates
    }

    /// Request a fix at the given tier, walking the fallback ladder.
    ///
    /// Each candidate is started (and the previously started provider
    /// stopped) before its request. Intermediate failures are recorded
    /// and the walk continues; only the terminal outcome is returned:
    ///
    /// - `Ok(fix)` tagged with the id of the provider that produced it
    /// - [`LocationError::Cancelled`] as soon as `cancel` fires
    /// - [`LocationError::NoProviderForAccuracy`] for an empty ladder
    /// - [`LocationError::FailedAllProviders`] carrying the last
    ///   provider error when the ladder is exhausted
    pub async fn request_with_fallback(
        &self,
        tier: AccuracyTier,
        cancel: CancellationToken,
    ) -> Result<Fix, LocationError> {
        let candidates = self.candidates(tier);
        if candidates.is_empty() {
            return Err(LocationError::NoProviderForAccuracy);
        }

        let mut last_error: Option<ProviderError> = None;

        for cached in candidates {
            if cancel.is_cancelled() {
                return Err(LocationError::Cancelled);
            }

            self.switch_started(&cached);

            trace!(tier = %tier, provider = cached.id(), "trying provider");
            match cached.request_location(cancel.clone()).await {
                Ok(fix) => {
                    let fix = fix.with_source(cached.id());
                    trace!(provider = cached.id(), coordinate = %fix.coordinate, "fix acquired");
                    return Ok(fix);
                }
                Err(ProviderError::Cancelled) => return Err(LocationError::Cancelled),
                Err(err) => {
                    debug!(provider = cached.id(), error = %err, "provider failed, walking ladder");
                    last_error = Some(err);
                }
            }
        }

        Err(LocationError::FailedAllProviders {
            // The ladder was non-empty, so at least one error was recorded
            source: last_error.unwrap_or(ProviderError::NoFix),
        })
    }

    /// Stop the currently started provider, if any.
    pub fn stop_started(&self) {
        let mut started = self.started.lock().unwrap();
        if let Some(id) = started.take() {
            if let Some(cached) = self.shared.get(&id) {
                cached.provider().stop();
                info!(provider = %id, "provider stopped");
            }
        }
    }

    /// Stop the previously started provider and start `next`, in that
    /// order. Hook failures cannot abort the ladder; the hooks are
    /// infallible by contract and idempotent.
    fn switch_started(&self, next: &CachedProvider) {
        let mut started = self.started.lock().unwrap();
        if started.as_deref() == Some(next.id()) {
            return;
        }

        if let Some(previous) = started.take() {
            if let Some(cached) = self.shared.get(&previous) {
                cached.provider().stop();
            }
        }

        next.provider().start();
        debug!(provider = next.id(), "provider started");
        *started = Some(next.id().to_string());
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fix::Coordinate;
    use crate::provider::BoxFuture;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    /// Provider scripted to succeed or always fail, recording lifecycle
    /// hook invocations into a shared journal.
    struct ScriptedProvider {
        id: String,
        fails: bool,
        calls: AtomicU64,
        journal: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedProvider {
        fn new(id: &str, fails: bool, journal: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                id: id.to_string(),
                fails,
                calls: AtomicU64::new(0),
                journal,
            })
        }
    }

    impl Provider for ScriptedProvider {
        fn id(&self) -> &str {
            &self.id
        }

        fn polling_interval(&self) -> Duration {
            Duration::ZERO
        }

        fn request_location(
            &self,
            _cancel: CancellationToken,
        ) -> BoxFuture<'_, Result<Fix, ProviderError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fails = self.fails;
            Box::pin(async move {
                if fails {
                    Err(ProviderError::NoFix)
                } else {
                    Ok(Fix::new(Coordinate::new(48.0, 11.0), 25.0))
                }
            })
        }

        fn start(&self) {
            self.journal.lock().unwrap().push(format!("start:{}", self.id));
        }

        fn stop(&self) {
            self.journal.lock().unwrap().push(format!("stop:{}", self.id));
        }
    }

    fn journal() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[tokio::test]
    async fn test_empty_registry_reports_no_provider() {
        let registry = ProviderRegistry::new();
        let err = registry
            .request_with_fallback(AccuracyTier::Best, CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err, LocationError::NoProviderForAccuracy);
    }

    #[tokio::test]
    async fn test_preferred_tier_wins() {
        let j = journal();
        let mut registry = ProviderRegistry::new();
        registry.register(AccuracyTier::Best, ScriptedProvider::new("gps", false, j.clone()));
        registry.register(
            AccuracyTier::Kilometer,
            ScriptedProvider::new("ip", false, j.clone()),
        );

        let fix = registry
            .request_with_fallback(AccuracyTier::Best, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(fix.source, "gps");
    }

    #[tokio::test]
    async fn test_fallback_walks_to_coarser_provider() {
        // gps serves Navigation/Best/TenMeters and always fails; the
        // walk must land on wifi or ip without surfacing an error.
        let j = journal();
        let gps = ScriptedProvider::new("gps", true, j.clone());
        let wifi = ScriptedProvider::new("wifi", false, j.clone());
        let ip = ScriptedProvider::new("ip", false, j.clone());

        let mut registry = ProviderRegistry::new();
        registry.register(AccuracyTier::Navigation, gps.clone());
        registry.register(AccuracyTier::Best, gps.clone());
        registry.register(AccuracyTier::TenMeters, gps.clone());
        registry.register(AccuracyTier::HundredMeters, wifi);
        registry.register(AccuracyTier::Kilometer, ip.clone());
        registry.register(AccuracyTier::ThreeKilometers, ip);

        let fix = registry
            .request_with_fallback(AccuracyTier::Best, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(fix.source, "wifi");
        // gps failed exactly once despite serving three rungs
        assert_eq!(gps.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_ladder_carries_last_error() {
        let j = journal();
        let mut registry = ProviderRegistry::new();
        registry.register(AccuracyTier::Best, ScriptedProvider::new("gps", true, j.clone()));
        registry.register(
            AccuracyTier::Kilometer,
            ScriptedProvider::new("ip", true, j.clone()),
        );

        let err = registry
            .request_with_fallback(AccuracyTier::Best, CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            LocationError::FailedAllProviders {
                source: ProviderError::NoFix
            }
        );
    }

    #[tokio::test]
    async fn test_shared_provider_appears_once_in_candidates() {
        let j = journal();
        let gps = ScriptedProvider::new("gps", false, j.clone());

        let mut registry = ProviderRegistry::new();
        registry.register(AccuracyTier::Navigation, gps.clone());
        registry.register(AccuracyTier::Best, gps.clone());
        registry.register(AccuracyTier::TenMeters, gps);

        let candidates = registry.candidates(AccuracyTier::Navigation);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id(), "gps");
    }

    #[tokio::test]
    async fn test_switch_stops_previous_before_starting_next() {
        let j = journal();
        let gps = ScriptedProvider::new("gps", true, j.clone());
        let ip = ScriptedProvider::new("ip", false, j.clone());

        let mut registry = ProviderRegistry::new();
        registry.register(AccuracyTier::Best, gps);
        registry.register(AccuracyTier::Kilometer, ip);

        registry
            .request_with_fallback(AccuracyTier::Best, CancellationToken::new())
            .await
            .unwrap();

        let events = j.lock().unwrap().clone();
        assert_eq!(events, vec!["start:gps", "stop:gps", "start:ip"]);
    }

    #[tokio::test]
    async fn test_repeated_requests_do_not_rerun_start_hook() {
        let j = journal();
        let gps = ScriptedProvider::new("gps", false, j.clone());

        let mut registry = ProviderRegistry::new();
        registry.register(AccuracyTier::Best, gps);

        registry
            .request_with_fallback(AccuracyTier::Best, CancellationToken::new())
            .await
            .unwrap();
        registry
            .request_with_fallback(AccuracyTier::Best, CancellationToken::new())
            .await
            .unwrap();

        let events = j.lock().unwrap().clone();
        assert_eq!(events, vec!["start:gps"]);
    }

    #[tokio::test]
    async fn test_stop_started() {
        let j = journal();
        let gps = ScriptedProvider::new("gps", false, j.clone());

        let mut registry = ProviderRegistry::new();
        registry.register(AccuracyTier::Best, gps);

        registry
            .request_with_fallback(AccuracyTier::Best, CancellationToken::new())
            .await
            .unwrap();
        registry.stop_started();

        let events = j.lock().unwrap().clone();
        assert_eq!(events, vec!["start:gps", "stop:gps"]);
    }

    #[tokio::test]
    async fn test_cancelled_before_walk() {
        let j = journal();
        let mut registry = ProviderRegistry::new();
        registry.register(AccuracyTier::Best, ScriptedProvider::new("gps", false, j));

        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = registry
            .request_with_fallback(AccuracyTier::Best, cancel)
            .await
            .unwrap_err();
        assert_eq!(err, LocationError::Cancelled);
    }

    #[tokio::test]
    async fn test_register_override_replaces_tier() {
        let j = journal();
        let mut registry = ProviderRegistry::new();
        registry.register(AccuracyTier::Best, ScriptedProvider::new("gps", true, j.clone()));
        registry.register(
            AccuracyTier::Best,
            ScriptedProvider::new("mock-gps", false, j),
        );

        let fix = registry
            .request_with_fallback(AccuracyTier::Best, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(fix.source, "mock-gps");
    }
}
