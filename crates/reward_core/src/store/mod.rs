//! Persistence collaborator contract
//!
//! The document store itself lives outside this crate; the engine only needs the six
//! operations below. No transaction spans two calls.

pub mod memory;

use crate::error::StoreError;
use crate::types::{SubmissionRecord, UserRewardState};
use chrono::{DateTime, Utc};
use std::future::Future;

pub use memory::InMemoryStore;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub trait RewardStore: Send + Sync {
    fn get_user_state(
        &self,
        user_id: &str,
    ) -> impl Future<Output = StoreResult<Option<UserRewardState>>> + Send;

    fn create_user_state(
        &self,
        state: UserRewardState,
    ) -> impl Future<Output = StoreResult<UserRewardState>> + Send;

    /// Full replace of the stored document.
    fn save_user_state(&self, state: &UserRewardState)
        -> impl Future<Output = StoreResult<()>> + Send;

    /// Submissions by `submitter_id` with `start <= created_at <= end`.
    fn count_submissions_in_range(
        &self,
        submitter_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<u64>> + Send;

    /// Most recent submission satisfying `criteria`.
    fn find_recent_submission(
        &self,
        criteria: &DuplicateCriteria,
    ) -> impl Future<Output = StoreResult<Option<SubmissionRecord>>> + Send;

    fn create_submission(
        &self,
        record: SubmissionRecord,
    ) -> impl Future<Output = StoreResult<SubmissionRecord>> + Send;
}

/// What makes an earlier submission count as the same one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateMatch {
    /// Same image or same game asset URL
    AssetUrl { image_url: Option<String>, game_url: Option<String> },
    /// Same text content and frame
    Content { aim: String, steps: Vec<String>, frame_type: String },
}

/// Query for a recent duplicate by one submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCriteria {
    pub submitter_id: String,
    /// Only records created at or after this instant
    pub since: DateTime<Utc>,
    pub matcher: DuplicateMatch,
}

impl DuplicateCriteria {
    pub fn matches(&self, record: &SubmissionRecord) -> bool {
        if record.submitter_id != self.submitter_id || record.created_at < self.since {
            return false;
        }

        match &self.matcher {
            DuplicateMatch::AssetUrl { image_url, game_url } => {
                let same_image = image_url.is_some() && record.image_url == *image_url;
                let same_game = game_url.is_some() && record.game_url == *game_url;
                same_image || same_game
            }
            DuplicateMatch::Content { aim, steps, frame_type } => {
                record.aim == *aim && record.steps == *steps && record.frame_type == *frame_type
            }
        }
    }
}
