//! Duplicate submission guard
//!
//! Catches double clicks and network retries: an earlier submission by the same user
//! inside the lookback window with the same asset URL, or with the same text content
//! when no image/game asset is attached. Best effort, misses are acceptable.

use crate::store::{DuplicateCriteria, DuplicateMatch, RewardStore, StoreResult};
use crate::types::SubmissionRequest;
use chrono::{DateTime, Duration, Utc};
use tracing::warn;

pub const DEFAULT_LOOKBACK_SECS: i64 = 10;

/// Criteria describing an earlier copy of `candidate`.
pub fn duplicate_criteria(
    candidate: &SubmissionRequest,
    lookback: Duration,
    now: DateTime<Utc>,
) -> DuplicateCriteria {
    let matcher = if candidate.image_url.is_some() || candidate.game_url.is_some() {
        DuplicateMatch::AssetUrl {
            image_url: candidate.image_url.clone(),
            game_url: candidate.game_url.clone(),
        }
    } else {
        DuplicateMatch::Content {
            aim: candidate.aim.clone(),
            steps: candidate.steps.clone(),
            frame_type: candidate.frame_type.clone(),
        }
    };

    DuplicateCriteria { submitter_id: candidate.submitter_id.clone(), since: now - lookback, matcher }
}

/// Whether `candidate` repeats a submission made within `lookback` of `now`.
pub async fn is_duplicate<S: RewardStore + ?Sized>(
    store: &S,
    candidate: &SubmissionRequest,
    lookback: Duration,
    now: DateTime<Utc>,
) -> StoreResult<bool> {
    let criteria = duplicate_criteria(candidate, lookback, now);
    let existing = store.find_recent_submission(&criteria).await?;
    if let Some(record) = &existing {
        warn!(
            submitter_id = %candidate.submitter_id,
            previous = %record.id,
            "duplicate submission suppressed"
        );
    }
    Ok(existing.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::types::{LotteryResult, SubmissionRecord};

    fn lookback() -> Duration {
        Duration::seconds(DEFAULT_LOOKBACK_SECS)
    }

    async fn persist(store: &InMemoryStore, request: &SubmissionRequest, at: DateTime<Utc>) {
        let record = SubmissionRecord::from_request(request, LotteryResult::None, at);
        store.create_submission(record).await.unwrap();
    }

    #[tokio::test]
    async fn test_same_content_within_window_is_duplicate() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let request = SubmissionRequest::new("u1", "Draw a cat", ["a", "b", "c"], "square");
        persist(&store, &request, now - Duration::seconds(3)).await;

        assert!(is_duplicate(&store, &request, lookback(), now).await.unwrap());
    }

    #[tokio::test]
    async fn test_outside_window_is_not_duplicate() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let request = SubmissionRequest::new("u1", "Draw a cat", ["a", "b", "c"], "square");
        persist(&store, &request, now - Duration::seconds(11)).await;

        assert!(!is_duplicate(&store, &request, lookback(), now).await.unwrap());
    }

    #[tokio::test]
    async fn test_asset_submissions_compare_urls_only() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let first = SubmissionRequest::new("u1", "Draw a cat", ["a", "b", "c"], "square")
            .with_image("/img/cat.png");
        persist(&store, &first, now).await;

        // different text, same image
        let retry = SubmissionRequest::new("u1", "Another aim", ["x", "y", "z"], "wide")
            .with_image("/img/cat.png");
        assert!(is_duplicate(&store, &retry, lookback(), now).await.unwrap());

        // same text, different image
        let new_image = first.clone().with_image("/img/dog.png");
        assert!(!is_duplicate(&store, &new_image, lookback(), now).await.unwrap());
    }

    #[tokio::test]
    async fn test_game_url_match() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let game = SubmissionRequest::new("u1", "Make a game", ["a", "b", "c"], "game")
            .with_game("/games/run.zip");
        persist(&store, &game, now).await;

        assert!(is_duplicate(&store, &game, lookback(), now).await.unwrap());
        let other_user = SubmissionRequest { submitter_id: "u2".into(), ..game.clone() };
        assert!(!is_duplicate(&store, &other_user, lookback(), now).await.unwrap());
    }

    #[test]
    fn test_video_only_falls_back_to_content() {
        let request = SubmissionRequest::new("u1", "aim", ["a", "b", "c"], "f").with_video("/v.mp4");
        let criteria = duplicate_criteria(&request, lookback(), Utc::now());
        assert!(matches!(criteria.matcher, DuplicateMatch::Content { .. }));
    }
}
