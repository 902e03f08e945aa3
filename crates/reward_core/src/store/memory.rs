use super::{DuplicateCriteria, RewardStore, StoreResult};
use crate::error::StoreError;
use crate::types::{SubmissionRecord, UserRewardState};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<String, UserRewardState>,
    submissions: Vec<SubmissionRecord>,
}

/// Process-local store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Inner>>,
    failing_writes: Arc<AtomicUsize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` write calls fail with `StoreError::Unavailable`.
    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Snapshot of every stored submission, oldest first.
    pub fn submissions(&self) -> Vec<SubmissionRecord> {
        self.lock().map(|inner| inner.submissions.clone()).unwrap_or_default()
    }

    pub fn user_state(&self, user_id: &str) -> Option<UserRewardState> {
        self.lock().ok().and_then(|inner| inner.users.get(user_id).cloned())
    }

    /// Seed a user document directly.
    pub fn insert_user_state(&self, state: UserRewardState) {
        if let Ok(mut inner) = self.lock() {
            inner.users.insert(state.user_id.clone(), state);
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| StoreError::Unavailable("in-memory store poisoned".to_string()))
    }

    fn check_write(&self, operation: &str) -> StoreResult<()> {
        let injected = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::Unavailable(format!("injected failure on {}", operation)));
        }
        Ok(())
    }
}

impl RewardStore for InMemoryStore {
    async fn get_user_state(&self, user_id: &str) -> StoreResult<Option<UserRewardState>> {
        Ok(self.lock()?.users.get(user_id).cloned())
    }

    async fn create_user_state(&self, state: UserRewardState) -> StoreResult<UserRewardState> {
        self.check_write("create_user_state")?;
        let mut inner = self.lock()?;
        if inner.users.contains_key(&state.user_id) {
            return Err(StoreError::Conflict { key: state.user_id.clone() });
        }
        inner.users.insert(state.user_id.clone(), state.clone());
        Ok(state)
    }

    async fn save_user_state(&self, state: &UserRewardState) -> StoreResult<()> {
        self.check_write("save_user_state")?;
        self.lock()?.users.insert(state.user_id.clone(), state.clone());
        Ok(())
    }

    async fn count_submissions_in_range(
        &self,
        submitter_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let inner = self.lock()?;
        let count = inner
            .submissions
            .iter()
            .filter(|r| r.submitter_id == submitter_id && r.created_at >= start && r.created_at <= end)
            .count();
        Ok(count as u64)
    }

    async fn find_recent_submission(
        &self,
        criteria: &DuplicateCriteria,
    ) -> StoreResult<Option<SubmissionRecord>> {
        let inner = self.lock()?;
        Ok(inner
            .submissions
            .iter()
            .filter(|r| criteria.matches(r))
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn create_submission(&self, record: SubmissionRecord) -> StoreResult<SubmissionRecord> {
        self.check_write("create_submission")?;
        self.lock()?.submissions.push(record.clone());
        Ok(record)
    }
}
