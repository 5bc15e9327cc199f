//! Scheduled cleanup of expired revocation entries.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{error, info};

use crate::revocation::SessionRevocation;

/// Interval between cleanup runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60); // 1 hour

/// Run all cleanup tasks once.
pub fn run_cleanup(revocations: &dyn SessionRevocation) {
    if revocations.is_empty() {
        return;
    }

    let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs(),
        Err(e) => {
            error!("Failed to read system time for cleanup: {}", e);
            return;
        }
    };

    let count = revocations.prune_expired(now);
    if count > 0 {
        info!(
            remaining = revocations.len(),
            "Cleaned up {} expired revocations", count
        );
    }
}

/// Spawn a background task that runs cleanup periodically.
/// Returns a handle that can be used to abort the task.
pub fn spawn_cleanup_scheduler(
    revocations: Arc<dyn SessionRevocation>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

        loop {
            interval.tick().await;
            run_cleanup(revocations.as_ref());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revocation::InMemoryRevocations;

    #[test]
    fn test_cleanup_drops_only_expired() {
        let store = InMemoryRevocations::new();
        store.revoke("long-gone", 1);
        store.revoke("far-future", u64::MAX);

        run_cleanup(&store);

        assert_eq!(store.len(), 1);
        assert!(store.revoke("long-gone", 1));
        assert!(!store.revoke("far-future", u64::MAX));
    }

    #[test]
    fn test_cleanup_on_empty_store() {
        let store = InMemoryRevocations::new();
        run_cleanup(&store);
        assert!(store.is_empty());
    }
}
