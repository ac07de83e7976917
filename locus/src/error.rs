//! Engine-level error taxonomy.
//!
//! Provider-level failures ([`crate::provider::ProviderError`]) are
//! folded into this taxonomy at the session boundary: intermediate
//! fallback failures are logged but swallowed, and only terminal errors
//! reach the delegate.

use thiserror::Error;

use crate::provider::ProviderError;

/// Errors surfaced by the session facade.
///
/// `Cancelled` is absorbed by the cancelling caller and never reaches
/// a delegate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    /// No provider is registered for the requested tier or any tier on
    /// its fallback ladder.
    #[error("no provider registered for any accuracy tier")]
    NoProviderForAccuracy,

    /// Every provider on the fallback ladder failed; carries the last
    /// underlying provider error.
    #[error("all providers failed")]
    FailedAllProviders {
        #[source]
        source: ProviderError,
    },

    /// A region was rejected (non-positive radius, empty identifier).
    #[error("invalid region: {0}")]
    InvalidRegion(String),

    /// The operation was cancelled by stop() or a superseding request.
    #[error("operation cancelled")]
    Cancelled,
}
