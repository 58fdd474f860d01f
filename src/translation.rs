//! Consumer-facing translation capability.
//! A cheap clonable handle bundling the active language, the lookup
//! functions and the language setter. UI bindings hold one of these and
//! re-resolve whenever `subscribe()` reports a new revision.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::watch;

use crate::cache::Revision;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::fetch::Fetcher;
use crate::metrics::LoadStats;
use crate::resolver::Session;

#[derive(Clone)]
pub struct Translation {
    session: Arc<Session>,
}

impl Translation {
    /// HTTP-backed translation. Must be called inside a tokio runtime.
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        Ok(Self::from_session(Session::new(config)?))
    }

    pub fn with_fetcher(
        config: &SessionConfig,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, SessionError> {
        Ok(Self::from_session(Session::with_fetcher(config, fetcher)?))
    }

    pub fn from_session(session: Session) -> Self {
        Self {
            session: Arc::new(session),
        }
    }

    pub fn language(&self) -> String {
        self.session.language()
    }

    /// String lookup with `""` as the default.
    pub fn t(&self, path: &str, key: &str) -> String {
        self.session.resolve(path, key, String::new())
    }

    pub fn t_or(&self, path: &str, key: &str, default: &str) -> String {
        self.session.resolve(path, key, default.to_string())
    }

    /// Typed lookup; see [`Session::resolve`].
    pub fn resolve<V: DeserializeOwned>(&self, path: &str, key: &str, default: V) -> V {
        self.session.resolve(path, key, default)
    }

    pub fn set_language(&self, language: &str) {
        self.session.set_language(language);
    }

    /// Notified whenever a group lands or the language changes.
    pub fn subscribe(&self) -> watch::Receiver<Revision> {
        self.session.subscribe()
    }

    pub fn metrics(&self) -> LoadStats {
        self.session.stats()
    }
}

impl std::fmt::Debug for Translation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translation")
            .field("language", &self.language())
            .finish_non_exhaustive()
    }
}
