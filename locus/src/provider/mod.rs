//! Location provider abstraction.
//!
//! This module provides the trait implemented by positioning backends
//! (GPS daemon, WiFi access points, IP geolocation) together with the
//! machinery the engine wraps them in:
//!
//! - [`Provider`] - One backend able to produce a single fix asynchronously
//! - [`CachedProvider`] - Per-provider memoization with stale-on-error
//! - [`ProviderRegistry`] - Accuracy-tier table with a fallback ladder

mod cache;
mod registry;
mod types;

pub use cache::CachedProvider;
pub use registry::ProviderRegistry;
pub use types::{BoxFuture, Provider, ProviderError};
