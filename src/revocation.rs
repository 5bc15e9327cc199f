//! Session revocation store.
//!
//! Rotation and logout record the ids (`jti`) of refresh tokens that must not
//! be accepted again. Entries are only needed until the token would have
//! expired anyway, so they can be pruned after that.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Store of revoked refresh-token ids.
pub trait SessionRevocation: Send + Sync {
    /// Revoke `token_id` until `expires_at` (Unix seconds).
    /// Returns `false` if the id was already revoked.
    fn revoke(&self, token_id: &str, expires_at: u64) -> bool;

    /// Forget entries whose token expired before `now`. Returns the count removed.
    fn prune_expired(&self, now: u64) -> usize;

    /// Number of ids currently held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local revocation store.
#[derive(Debug, Default)]
pub struct InMemoryRevocations {
    revoked: Mutex<HashMap<String, u64>>,
}

impl InMemoryRevocations {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionRevocation for InMemoryRevocations {
    fn revoke(&self, token_id: &str, expires_at: u64) -> bool {
        let mut revoked = self.revoked.lock().unwrap_or_else(PoisonError::into_inner);
        if revoked.contains_key(token_id) {
            return false;
        }
        revoked.insert(token_id.to_string(), expires_at);
        true
    }

    fn prune_expired(&self, now: u64) -> usize {
        let mut revoked = self.revoked.lock().unwrap_or_else(PoisonError::into_inner);
        let before = revoked.len();
        revoked.retain(|_, expires_at| *expires_at >= now);
        before - revoked.len()
    }

    fn len(&self) -> usize {
        self.revoked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revoke_once() {
        let store = InMemoryRevocations::new();
        assert!(store.is_empty());
        assert!(store.revoke("a", 100));
        assert!(!store.revoke("a", 100));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_prune_expired() {
        let store = InMemoryRevocations::new();
        store.revoke("old", 10);
        store.revoke("edge", 20);
        store.revoke("new", 30);

        assert_eq!(store.prune_expired(20), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.prune_expired(20), 0);

        // Pruned ids are forgotten; the rest still refuse a second revoke
        assert!(store.revoke("old", 10));
        assert!(!store.revoke("edge", 20));
        assert!(!store.revoke("new", 30));
    }
}
