//! Cancellation framework: CancellationToken + generation guard.
//! Ensures a load started under one language cannot write into the cache
//! after the language has changed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

/// One language epoch. Every load gets a child of the epoch's root token;
/// advancing the epoch cancels the root (and so every child) and bumps the
/// generation.
pub struct LoadEpoch {
    root: RwLock<CancellationToken>,
    generation: Arc<AtomicU64>,
}

impl LoadEpoch {
    pub fn new() -> Self {
        Self {
            root: RwLock::new(CancellationToken::new()),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Cancel all loads of the current epoch and open the next one.
    /// Returns the new generation.
    pub fn cancel_and_advance(&self) -> u64 {
        let mut root = self.root.write();
        root.cancel();
        *root = CancellationToken::new();
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Issue a guard for a new load in the current epoch.
    pub fn guard(&self) -> LoadGuard {
        let root = self.root.read();
        LoadGuard {
            generation: Arc::clone(&self.generation),
            my_generation: self.generation.load(Ordering::SeqCst),
            token: root.child_token(),
        }
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl Default for LoadEpoch {
    fn default() -> Self {
        Self::new()
    }
}

/// Checked by a load before it writes its result.
/// Stale once its token is cancelled or the epoch has moved on.
#[derive(Clone)]
pub struct LoadGuard {
    generation: Arc<AtomicU64>,
    my_generation: u64,
    token: CancellationToken,
}

impl LoadGuard {
    #[inline]
    pub fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.my_generation
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True if the load may still publish its result.
    #[inline]
    pub fn should_continue(&self) -> bool {
        !self.is_cancelled() && self.is_current()
    }

    /// The cancellation handle registered in the in-flight set.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn my_generation(&self) -> u64 {
        self.my_generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_guard_may_continue() {
        let epoch = LoadEpoch::new();
        let guard = epoch.guard();
        assert!(guard.should_continue());
        assert_eq!(guard.my_generation(), 0);
    }

    #[test]
    fn advance_cancels_outstanding_guards() {
        let epoch = LoadEpoch::new();
        let old = epoch.guard();
        assert_eq!(epoch.cancel_and_advance(), 1);

        assert!(old.is_cancelled());
        assert!(!old.is_current());
        assert!(!old.should_continue());

        let new = epoch.guard();
        assert!(new.should_continue());
        assert_eq!(new.my_generation(), 1);
    }

    #[test]
    fn cancelling_one_guard_leaves_siblings_alone() {
        let epoch = LoadEpoch::new();
        let a = epoch.guard();
        let b = epoch.guard();
        a.token().cancel();
        assert!(!a.should_continue());
        assert!(b.should_continue());
    }
}
