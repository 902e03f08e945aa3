//! # reward_core - Submission Reward Engine
//!
//! Grants a title and a collectible card for every accepted creative-prompt
//! submission, suppresses accidental double submits, and runs an optional
//! once-per-day jackpot whose odds climb with each loss.
//!
//! ## Features
//! - Rarity-weighted card draws with a boosted mode for packaged game submissions
//! - CSV card master with an embedded fallback and hot reload
//! - 10-second duplicate guard and JST calendar-day gate
//! - Injectable randomness: seed it and every draw is reproducible
//! - Pluggable async persistence and a retrying notification queue

// Struct initialization pattern used intentionally
#![allow(clippy::field_reassign_with_default)]
// Generic store/notifier pairs produce long signatures
#![allow(clippy::type_complexity)]

pub mod catalog;
pub mod config;
pub mod daily_gate;
pub mod dedup;
pub mod error;
pub mod locks;
pub mod lottery;
pub mod notify;
pub mod orchestrator;
pub mod reward;
pub mod sampler;
pub mod store;
pub mod types;

// Re-export catalog types
pub use catalog::{
    card_catalog, reload_card_catalog, CardCatalog, CardDefinition, CardType, CatalogService,
    PublicCard, Rarity, RarityWeights,
};

pub use config::{NotificationSettings, RewardConfig};
pub use error::{ConfigError, NotifyError, Result, RewardError, StoreError};

// Re-export the submission cycle
pub use lottery::LotteryDraw;
pub use notify::{LogSink, NotificationJob, NotificationQueue, NotificationSink, Notifier};
pub use orchestrator::SubmissionOrchestrator;
pub use reward::{GrantOptions, GrantedReward, RewardGranter};
pub use sampler::{FixedRolls, RandomSource, RngSource};
pub use store::{DuplicateCriteria, DuplicateMatch, InMemoryStore, RewardStore};
pub use types::{
    CardEntry, LotteryResult, RewardCard, SubmissionOutcome, SubmissionRecord, SubmissionRequest,
    UserRewardState,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_public_api_end_to_end() {
        let store = InMemoryStore::new();
        let config = RewardConfig { lottery_enabled: true, ..RewardConfig::default() };
        let engine = SubmissionOrchestrator::new(store.clone(), NoopNotifier, config)
            .with_catalog(std::sync::Arc::new(CardCatalog::embedded()))
            .with_random_source(RngSource::seeded(7));

        let request =
            SubmissionRequest::new("u1", "Draw your breakfast", ["sketch", "ink", "color"], "square");
        let outcome = engine.submit(request).await.unwrap();

        assert_ne!(outcome.result, LotteryResult::None);
        assert!(outcome.reward_card_id.is_some());
        assert_eq!(store.user_state("u1").unwrap().card_collection.len(), 1);
    }

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    struct NoopNotifier;

    impl Notifier for NoopNotifier {
        fn enqueue(&self, _job: NotificationJob) -> std::result::Result<(), NotifyError> {
            Ok(())
        }
    }
}
