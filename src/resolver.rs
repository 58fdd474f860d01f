//! Resolver: serve a cached value, start a load, or fall back to the
//! caller's default while a load is pending. Never blocks, never fails.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::cache::{CacheStore, Lookup, Revision};
use crate::config::SessionConfig;
use crate::coordinator::LoadCoordinator;
use crate::error::SessionError;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::metrics::{LoadMetrics, LoadStats};

/// One translation session: the cache for the active language plus the
/// loads feeding it. Independent sessions share nothing.
pub struct Session {
    cache: Arc<CacheStore>,
    coordinator: Arc<LoadCoordinator>,
    metrics: Arc<LoadMetrics>,
}

impl Session {
    /// Session backed by the HTTP fetcher. Must be called inside a tokio runtime.
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        let fetcher = HttpFetcher::new(config.request_timeout())?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    pub fn with_fetcher(
        config: &SessionConfig,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, SessionError> {
        let runtime = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;
        Ok(Self::with_runtime(config, fetcher, runtime))
    }

    pub fn with_runtime(config: &SessionConfig, fetcher: Arc<dyn Fetcher>, runtime: Handle) -> Self {
        let metrics = Arc::new(LoadMetrics::new());
        let cache = Arc::new(CacheStore::new(config.language.clone(), 0));
        let coordinator = Arc::new(LoadCoordinator::new(
            config.base_url(),
            fetcher,
            runtime,
            Arc::clone(&cache),
            Arc::clone(&metrics),
        ));
        info!(host = config.base_url(), language = %config.language, "translation session created");
        Self {
            cache,
            coordinator,
            metrics,
        }
    }

    pub fn language(&self) -> String {
        self.cache.snapshot().language().to_string()
    }

    /// Best available value for `key` in group `path`, typed like `default`.
    ///
    /// Returns `default` while `path` is loading, when the stored value is
    /// `null` or does not decode as `V`, and on a miss. A miss (group not
    /// cached, or cached without `key`) also starts a load of `path`.
    pub fn resolve<V: DeserializeOwned>(&self, path: &str, key: &str, default: V) -> V {
        if path.is_empty() {
            debug!(key, "empty group path, using default");
            return default;
        }
        if self.coordinator.is_loading(path) {
            return default;
        }

        let snapshot = self.cache.snapshot();
        match snapshot.lookup(path, key) {
            Lookup::Found(value) => V::deserialize(value).unwrap_or_else(|e| {
                debug!(path, key, error = %e, "stored value has unexpected type, using default");
                default
            }),
            Lookup::Null => default,
            Lookup::Missing => {
                self.coordinator
                    .start_load(path, snapshot.language(), snapshot.generation());
                default
            }
        }
    }

    /// Cancel every in-flight load, then drop the cache and switch language.
    /// Applies even when `language` equals the active one.
    pub fn set_language(&self, language: &str) {
        let previous = self.language();
        let generation = self.coordinator.cancel_all();
        self.cache.reset(language, generation);
        info!(from = %previous, to = %language, generation, "language_changed");
    }

    pub fn subscribe(&self) -> watch::Receiver<Revision> {
        self.cache.subscribe()
    }

    pub fn stats(&self) -> LoadStats {
        self.metrics.stats()
    }
}
