//! One-per-day gate on a fixed UTC+9 (JST) calendar day.
//!
//! The day boundary ignores both server and user timezone.

use crate::store::{RewardStore, StoreResult};
use chrono::{DateTime, Duration, NaiveTime, Utc};

/// UTC+9 in minutes
pub const JST_OFFSET_MINUTES: i64 = 540;

fn jst_offset() -> Duration {
    Duration::minutes(JST_OFFSET_MINUTES)
}

/// 00:00:00.000 JST of the day containing `now`, as a UTC instant.
pub fn start_of_jst_day(now: DateTime<Utc>) -> DateTime<Utc> {
    let jst_day = (now + jst_offset()).date_naive();
    jst_day.and_time(NaiveTime::MIN).and_utc() - jst_offset()
}

/// 23:59:59.999 JST of the day containing `now`, as a UTC instant.
pub fn end_of_jst_day(now: DateTime<Utc>) -> DateTime<Utc> {
    start_of_jst_day(now) + Duration::days(1) - Duration::milliseconds(1)
}

/// Whether `submitter_id` already has a submission inside today's JST day.
pub async fn has_submitted_today<S: RewardStore + ?Sized>(
    store: &S,
    submitter_id: &str,
    now: DateTime<Utc>,
) -> StoreResult<bool> {
    let count = store
        .count_submissions_in_range(submitter_id, start_of_jst_day(now), end_of_jst_day(now))
        .await?;
    Ok(count > 0)
}
