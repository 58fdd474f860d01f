//! Load coordinator: at most one in-flight fetch per path, cancellation of
//! every in-flight fetch on language change, and publication of completed
//! groups into the cache.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, TranslationGroup};
use crate::cancellation::{LoadEpoch, LoadGuard};
use crate::config::group_url;
use crate::error::FetchError;
use crate::fetch::Fetcher;
use crate::metrics::LoadMetrics;

/// In-flight marker for one path.
struct InFlight {
    load_id: u64,
    token: CancellationToken,
}

/// Owned by a load task. Clears the task's in-flight marker when dropped, so
/// a task that panics or is torn down with its runtime never leaves the path
/// marked as loading.
struct MarkerRelease {
    coordinator: Arc<LoadCoordinator>,
    path: String,
    load_id: u64,
}

impl Drop for MarkerRelease {
    fn drop(&mut self) {
        self.coordinator.release_marker(&self.path, self.load_id);
    }
}

pub struct LoadCoordinator {
    host: String,
    fetcher: Arc<dyn Fetcher>,
    runtime: Handle,
    epoch: LoadEpoch,
    in_flight: Mutex<HashMap<String, InFlight>>,
    next_load_id: AtomicU64,
    cache: Arc<CacheStore>,
    metrics: Arc<LoadMetrics>,
}

impl LoadCoordinator {
    pub fn new(
        host: impl Into<String>,
        fetcher: Arc<dyn Fetcher>,
        runtime: Handle,
        cache: Arc<CacheStore>,
        metrics: Arc<LoadMetrics>,
    ) -> Self {
        Self {
            host: host.into(),
            fetcher,
            runtime,
            epoch: LoadEpoch::new(),
            in_flight: Mutex::new(HashMap::new()),
            next_load_id: AtomicU64::new(1),
            cache,
            metrics,
        }
    }

    pub fn is_loading(&self, path: &str) -> bool {
        self.in_flight.lock().contains_key(path)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Start fetching `path` for `language`, observed at cache `generation`.
    ///
    /// No-op (returns false) if `path` is already in flight, or if the
    /// language epoch moved on after the caller read its snapshot.
    pub fn start_load(self: &Arc<Self>, path: &str, language: &str, generation: u64) -> bool {
        let (load_id, guard) = {
            let mut in_flight = self.in_flight.lock();
            if in_flight.contains_key(path) {
                return false;
            }
            let guard = self.epoch.guard();
            if guard.my_generation() != generation {
                debug!(path, language, generation, "skipping load for superseded language");
                return false;
            }
            let load_id = self.next_load_id.fetch_add(1, Ordering::Relaxed);
            in_flight.insert(
                path.to_string(),
                InFlight {
                    load_id,
                    token: guard.token().clone(),
                },
            );
            (load_id, guard)
        };

        let url = group_url(&self.host, language, path);
        debug!(path, language, url = %url, load_id, "group_load_started");
        self.metrics.record_start();

        let release = MarkerRelease {
            coordinator: Arc::clone(self),
            path: path.to_string(),
            load_id,
        };
        let fetch = self.fetcher.fetch(url, guard.token().clone());
        self.runtime.spawn(async move {
            let started = Instant::now();
            let outcome = AssertUnwindSafe(fetch)
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(FetchError::Panicked));
            release
                .coordinator
                .complete(&release.path, load_id, &guard, outcome, started.elapsed());
        });
        true
    }

    /// Remove `path`'s marker if it still belongs to `load_id`.
    fn release_marker(&self, path: &str, load_id: u64) {
        let mut in_flight = self.in_flight.lock();
        if in_flight.get(path).is_some_and(|entry| entry.load_id == load_id) {
            in_flight.remove(path);
        }
    }

    /// Completion handler. The in-flight lock is held across publication so
    /// a reader never sees the path neither loading nor cached.
    fn complete(
        &self,
        path: &str,
        load_id: u64,
        guard: &LoadGuard,
        outcome: Result<TranslationGroup, FetchError>,
        elapsed: Duration,
    ) {
        let mut in_flight = self.in_flight.lock();
        if in_flight.get(path).is_some_and(|entry| entry.load_id == load_id) {
            in_flight.remove(path);
        }

        match outcome {
            Ok(group) => {
                let keys = group.len();
                if self.cache.publish_group(path, group, guard) {
                    self.metrics.record_success(elapsed);
                    info!(
                        path,
                        keys,
                        generation = guard.my_generation(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "group_loaded"
                    );
                } else {
                    self.metrics.record_stale();
                    debug!(path, generation = guard.my_generation(), "stale group dropped");
                }
            }
            Err(e) if e.is_cancelled() => {
                self.metrics.record_cancelled();
                debug!(path, generation = guard.my_generation(), "group load cancelled");
            }
            Err(e) => {
                self.metrics.record_failure(elapsed);
                warn!(path, error = %e, "group load failed");
            }
        }
    }

    /// Cancel every in-flight load, clear the in-flight set and open a new
    /// language epoch. Returns the new generation.
    pub fn cancel_all(&self) -> u64 {
        let mut in_flight = self.in_flight.lock();
        let cancelled = in_flight.len();
        for (_, entry) in in_flight.drain() {
            entry.token.cancel();
        }
        let generation = self.epoch.cancel_and_advance();
        drop(in_flight);
        if cancelled > 0 {
            info!(cancelled, generation, "in-flight loads cancelled");
        }
        generation
    }
}
