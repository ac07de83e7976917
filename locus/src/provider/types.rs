//! Provider trait and error types.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::fix::Fix;

/// Boxed future alias for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors a provider can report for a single location request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// The backend is not reachable (daemon not running, no WiFi, no
    /// network route).
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The backend did not answer within the per-kind timeout.
    #[error("provider timed out after {0:?}")]
    Timeout(Duration),

    /// The backend answered but the payload was unparsable or missing
    /// mandatory fields.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The backend responded but has no position (for example a GPS
    /// receiver without a 2D fix yet).
    #[error("no position fix available")]
    NoFix,

    /// The request was cancelled by the caller.
    #[error("request cancelled")]
    Cancelled,
}

/// A positioning backend able to produce a single fix asynchronously.
///
/// Implementations must be safe to invoke concurrently and must not
/// block the calling thread; long waits happen inside the returned
/// future. Backends are expected to rate-limit themselves in line with
/// their declared polling interval (the engine's cache enforces a
/// matching freshness window on top).
///
/// # Lifecycle
///
/// `start` and `stop` are optional warm-up/teardown hooks (powering a
/// radio up or down, opening a daemon socket). Both default to no-ops
/// and must be idempotent.
pub trait Provider: Send + Sync {
    /// Stable identifier, unique within a process.
    fn id(&self) -> &str;

    /// Nominal interval between meaningful position changes.
    ///
    /// Drives the cache freshness window for this provider.
    fn polling_interval(&self) -> Duration;

    /// Deadline for a single location request.
    ///
    /// Defaults to 30 s, the budget for network-based lookups. Local
    /// sensor backends (GPS daemon) should override this to 5 s.
    fn request_timeout(&self) -> Duration {
        Duration::from_secs(30)
    }

    /// Request a single fix.
    ///
    /// The returned future resolves to a fix or a [`ProviderError`].
    /// Implementations should observe `cancel` and bail out with
    /// [`ProviderError::Cancelled`] promptly; the engine additionally
    /// races the future against the token and the request timeout.
    fn request_location(&self, cancel: CancellationToken) -> BoxFuture<'_, Result<Fix, ProviderError>>;

    /// Optional warm-up hook, idempotent.
    fn start(&self) {}

    /// Optional teardown hook, idempotent.
    fn stop(&self) {}
}
