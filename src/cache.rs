//! Language-scoped group cache.
//! Readers hold an `Arc<CacheSnapshot>`; writers build a new snapshot from the
//! current one and swap it in, so a held snapshot never changes underneath.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use crate::cancellation::LoadGuard;

/// One fetched group: key → arbitrary JSON value.
pub type TranslationGroup = serde_json::Map<String, Value>;

/// Identifies a cache state for change notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub language: String,
    pub generation: u64,
    /// Group writes since the last language reset.
    pub writes: u64,
}

/// Result of looking a key up in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    /// Group not cached, or cached without this key.
    Missing,
    /// Key present with an explicit `null`.
    Null,
    Found(&'a Value),
}

/// Immutable view of every cached group for one language.
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    language: String,
    generation: u64,
    writes: u64,
    groups: HashMap<String, Arc<TranslationGroup>>,
}

impl CacheSnapshot {
    pub fn empty(language: impl Into<String>, generation: u64) -> Self {
        Self {
            language: language.into(),
            generation,
            writes: 0,
            groups: HashMap::new(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn contains_group(&self, path: &str) -> bool {
        self.groups.contains_key(path)
    }

    pub fn lookup(&self, path: &str, key: &str) -> Lookup<'_> {
        match self.groups.get(path).and_then(|group| group.get(key)) {
            None => Lookup::Missing,
            Some(Value::Null) => Lookup::Null,
            Some(value) => Lookup::Found(value),
        }
    }

    /// New snapshot with `path` replaced wholesale by `group`.
    /// Other groups are shared with `self`.
    pub fn with_group(&self, path: &str, group: TranslationGroup) -> Self {
        let mut groups = self.groups.clone();
        groups.insert(path.to_string(), Arc::new(group));
        Self {
            language: self.language.clone(),
            generation: self.generation,
            writes: self.writes + 1,
            groups,
        }
    }

    pub fn revision(&self) -> Revision {
        Revision {
            language: self.language.clone(),
            generation: self.generation,
            writes: self.writes,
        }
    }
}

/// Owner of the active snapshot.
pub struct CacheStore {
    current: RwLock<Arc<CacheSnapshot>>,
    revision_tx: watch::Sender<Revision>,
}

impl CacheStore {
    pub fn new(language: impl Into<String>, generation: u64) -> Self {
        let snapshot = CacheSnapshot::empty(language, generation);
        let (revision_tx, _) = watch::channel(snapshot.revision());
        Self {
            current: RwLock::new(Arc::new(snapshot)),
            revision_tx,
        }
    }

    pub fn snapshot(&self) -> Arc<CacheSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Publish a fetched group if its load is still valid.
    /// The guard is checked under the write lock so a concurrent reset
    /// cannot interleave between the check and the swap.
    pub fn publish_group(&self, path: &str, group: TranslationGroup, guard: &LoadGuard) -> bool {
        let mut current = self.current.write();
        if !guard.should_continue() || current.generation() != guard.my_generation() {
            debug!(path, generation = guard.my_generation(), "discarding stale group");
            return false;
        }
        let next = Arc::new(current.with_group(path, group));
        let revision = next.revision();
        *current = next;
        drop(current);
        self.revision_tx.send_replace(revision);
        true
    }

    /// Drop every group and switch to `language` at `generation`.
    pub fn reset(&self, language: impl Into<String>, generation: u64) {
        let next = Arc::new(CacheSnapshot::empty(language, generation));
        let revision = next.revision();
        *self.current.write() = next;
        self.revision_tx.send_replace(revision);
    }

    pub fn subscribe(&self) -> watch::Receiver<Revision> {
        self.revision_tx.subscribe()
    }
}
