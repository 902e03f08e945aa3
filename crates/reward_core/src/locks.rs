//! Per-user async locks
//!
//! Serializes the load → mutate → save cycle of one user's reward state so two
//! concurrent submissions cannot overwrite each other's card.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct UserLocks {
    entries: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Held for the duration of one submission.
#[derive(Debug)]
pub struct UserLockGuard {
    _guard: OwnedMutexGuard<()>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, user_id: &str) -> UserLockGuard {
        let lock = {
            let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            // drop entries nobody holds or waits on
            entries.retain(|key, lock| key == user_id || Arc::strong_count(lock) > 1);
            Arc::clone(entries.entry(user_id.to_string()).or_default())
        };
        UserLockGuard { _guard: lock.lock_owned().await }
    }

    /// Number of tracked users
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
