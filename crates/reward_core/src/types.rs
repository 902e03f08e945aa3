//! Submission and per-user reward types

use crate::catalog::{PublicCard, Rarity};
use crate::error::RewardError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub const MAX_AIM_CHARS: usize = 100;
pub const STEP_COUNT: usize = 3;

/// Jackpot outcome tag stored on each submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LotteryResult {
    Win,
    Lose,
    #[default]
    None,
}

/// One obtained card. The collection keeps duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardEntry {
    pub card_id: String,
    pub obtained_at: DateTime<Utc>,
}

/// Reward state of one user, created on the first submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRewardState {
    pub user_id: String,
    /// Consecutive submissions without a jackpot win
    pub bonus_count: u32,
    pub active_title: Option<String>,
    pub active_title_expires_at: Option<DateTime<Utc>>,
    pub card_collection: Vec<CardEntry>,
    pub jackpot_won_at: Option<DateTime<Utc>>,
}

impl UserRewardState {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            bonus_count: 0,
            active_title: None,
            active_title_expires_at: None,
            card_collection: Vec::new(),
            jackpot_won_at: None,
        }
    }

    /// Title while `now < expiry`; an expired title counts as absent.
    pub fn active_title_at(&self, now: DateTime<Utc>) -> Option<&str> {
        match (&self.active_title, self.active_title_expires_at) {
            (Some(title), Some(expires_at)) if now < expires_at => Some(title.as_str()),
            _ => None,
        }
    }

    /// Replace the active title, whatever its remaining lifetime.
    pub fn set_title(&mut self, title: impl Into<String>, expires_at: DateTime<Utc>) {
        self.active_title = Some(title.into());
        self.active_title_expires_at = Some(expires_at);
    }

    pub fn add_card(&mut self, card_id: impl Into<String>, obtained_at: DateTime<Utc>) {
        self.card_collection.push(CardEntry { card_id: card_id.into(), obtained_at });
    }

    /// Copies owned per card id
    pub fn card_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.card_collection {
            *counts.entry(entry.card_id.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

/// Inbound submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub submitter_id: String,
    pub aim: String,
    pub steps: Vec<String>,
    pub frame_type: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub game_url: Option<String>,
}

impl SubmissionRequest {
    pub fn new(
        submitter_id: impl Into<String>,
        aim: impl Into<String>,
        steps: [&str; STEP_COUNT],
        frame_type: impl Into<String>,
    ) -> Self {
        Self {
            submitter_id: submitter_id.into(),
            aim: aim.into(),
            steps: steps.iter().map(|s| s.to_string()).collect(),
            frame_type: frame_type.into(),
            image_url: None,
            video_url: None,
            game_url: None,
        }
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_video(mut self, url: impl Into<String>) -> Self {
        self.video_url = Some(url.into());
        self
    }

    pub fn with_game(mut self, url: impl Into<String>) -> Self {
        self.game_url = Some(url.into());
        self
    }

    /// Packaged game submissions draw with boosted rarity.
    pub fn has_game_asset(&self) -> bool {
        self.game_url.is_some()
    }

    pub fn validate(&self) -> Result<(), RewardError> {
        if self.submitter_id.trim().is_empty() {
            return Err(RewardError::Validation("submitter_id must not be empty".to_string()));
        }

        let aim_chars = self.aim.chars().count();
        if self.aim.trim().is_empty() || aim_chars > MAX_AIM_CHARS {
            return Err(RewardError::Validation(format!(
                "aim must be 1-{} characters, got {}",
                MAX_AIM_CHARS, aim_chars
            )));
        }
        if self.steps.len() != STEP_COUNT {
            return Err(RewardError::Validation(format!(
                "exactly {} steps required, got {}",
                STEP_COUNT,
                self.steps.len()
            )));
        }
        if self.frame_type.trim().is_empty() {
            return Err(RewardError::Validation("frame_type must not be empty".to_string()));
        }

        for (name, url) in
            [("image_url", &self.image_url), ("video_url", &self.video_url), ("game_url", &self.game_url)]
        {
            if url.as_deref().is_some_and(|u| u.trim().is_empty()) {
                return Err(RewardError::Validation(format!("{} must not be blank", name)));
            }
        }
        Ok(())
    }
}

/// Persisted submission, immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub id: Uuid,
    pub submitter_id: String,
    pub aim: String,
    pub steps: Vec<String>,
    pub frame_type: String,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub game_url: Option<String>,
    pub lottery_result: LotteryResult,
    pub created_at: DateTime<Utc>,
}

impl SubmissionRecord {
    pub fn from_request(
        request: &SubmissionRequest,
        lottery_result: LotteryResult,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            submitter_id: request.submitter_id.clone(),
            aim: request.aim.clone(),
            steps: request.steps.clone(),
            frame_type: request.frame_type.clone(),
            image_url: request.image_url.clone(),
            video_url: request.video_url.clone(),
            game_url: request.game_url.clone(),
            lottery_result,
            created_at,
        }
    }
}

/// Card summary returned with a submission result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardCard {
    pub card_id: String,
    pub card_name: String,
    pub rarity: Option<Rarity>,
    pub image_url: Option<String>,
}

impl From<&PublicCard> for RewardCard {
    fn from(card: &PublicCard) -> Self {
        Self {
            card_id: card.card_id.clone(),
            card_name: card.card_name.clone(),
            rarity: card.rarity,
            image_url: card.image_url.clone(),
        }
    }
}

/// Result of one submission cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub result: LotteryResult,
    pub probability: f64,
    pub bonus_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_card_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_card: Option<RewardCard>,
    pub jackpot_recorded_at: Option<DateTime<Utc>>,
}

impl SubmissionOutcome {
    /// Neutral result returned for a suppressed duplicate.
    pub fn duplicate(bonus_count: u32) -> Self {
        Self {
            result: LotteryResult::None,
            probability: 0.0,
            bonus_count,
            reward_title: None,
            reward_card_id: None,
            reward_card: None,
            jackpot_recorded_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn request() -> SubmissionRequest {
        SubmissionRequest::new("u1", "Draw a cat", ["sketch", "ink", "color"], "square")
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
        assert!(request().with_image("/img/a.png").with_game("/games/a.zip").validate().is_ok());
    }

    #[test]
    fn test_aim_length_counts_characters() {
        let mut req = request();
        req.aim = "あ".repeat(MAX_AIM_CHARS);
        assert!(req.validate().is_ok());

        req.aim.push('い');
        assert!(matches!(req.validate(), Err(RewardError::Validation(_))));

        req.aim = "   ".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_step_count_and_blank_fields() {
        let mut req = request();
        req.steps.pop();
        assert!(req.validate().is_err());

        let mut req = request();
        req.frame_type = String::new();
        assert!(req.validate().is_err());

        let mut req = request();
        req.submitter_id = " ".to_string();
        assert!(req.validate().is_err());

        assert!(request().with_video("  ").validate().is_err());
    }

    #[test]
    fn test_title_expiry_boundary() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let mut state = UserRewardState::new("u1");
        assert_eq!(state.active_title_at(now), None);

        state.set_title("Idea Alchemist", now + Duration::days(7));
        assert_eq!(state.active_title_at(now), Some("Idea Alchemist"));
        assert_eq!(state.active_title_at(now + Duration::days(7) - Duration::milliseconds(1)), Some("Idea Alchemist"));
        assert_eq!(state.active_title_at(now + Duration::days(7)), None);
    }

    #[test]
    fn test_card_counts_keep_duplicates() {
        let now = Utc::now();
        let mut state = UserRewardState::new("u1");
        state.add_card("C001", now);
        state.add_card("E101", now);
        state.add_card("C001", now);

        assert_eq!(state.card_collection.len(), 3);
        let counts = state.card_counts();
        assert_eq!(counts.get("C001"), Some(&2));
        assert_eq!(counts.get("E101"), Some(&1));
    }

    #[test]
    fn test_outcome_wire_shape() {
        let outcome = SubmissionOutcome::duplicate(4);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["result"], "none");
        assert_eq!(json["probability"], 0.0);
        assert_eq!(json["bonusCount"], 4);
        assert!(json["jackpotRecordedAt"].is_null());
        assert!(json.get("rewardTitle").is_none());
    }
}
