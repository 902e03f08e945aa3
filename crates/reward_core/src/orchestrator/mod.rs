//! Submission cycle
//!
//! validate → lock user → duplicate check → load-or-create state → daily gate →
//! jackpot draw (when enabled) → persist record → grant reward → save state → notify.
//!
//! Persistence errors abort the cycle. Notification errors are logged and ignored.

use crate::catalog::{CardCatalog, CatalogService};
use crate::config::RewardConfig;
use crate::daily_gate;
use crate::dedup;
use crate::error::{Result, StoreError};
use crate::locks::UserLocks;
use crate::lottery::{self, LotteryDraw};
use crate::notify::{NotificationJob, Notifier};
use crate::reward::{GrantOptions, GrantedReward, RewardGranter};
use crate::sampler::{RandomSource, RngSource};
use crate::store::RewardStore;
use crate::types::{
    LotteryResult, RewardCard, SubmissionOutcome, SubmissionRecord, SubmissionRequest, UserRewardState,
};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};


type SharedRandom = Mutex<Box<dyn RandomSource + Send>>;

pub struct SubmissionOrchestrator<S, N> {
    store: S,
    notifier: N,
    catalog: Arc<CardCatalog>,
    granter: RewardGranter,
    config: RewardConfig,
    rng: SharedRandom,
    locks: UserLocks,
}

impl<S: RewardStore, N: Notifier> SubmissionOrchestrator<S, N> {
    /// Orchestrator over the catalog at `config.catalog_path`, with an entropy-seeded source.
    pub fn new(store: S, notifier: N, config: RewardConfig) -> Self {
        let global = CatalogService::global();
        let catalog = if global.path() == config.catalog_path.as_path() {
            global.get()
        } else {
            Arc::new(CardCatalog::load_or_default(&config.catalog_path))
        };

        Self {
            store,
            notifier,
            catalog,
            granter: RewardGranter::new().with_title_ttl(config.title_ttl()),
            config,
            rng: Mutex::new(Box::new(RngSource::from_entropy())),
            locks: UserLocks::new(),
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<CardCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_random_source(mut self, rng: impl RandomSource + Send + 'static) -> Self {
        self.rng = Mutex::new(Box::new(rng));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }

    pub async fn submit(&self, request: SubmissionRequest) -> Result<SubmissionOutcome> {
        self.submit_at(request, Utc::now()).await
    }

    /// Run one submission cycle as of `now`.
    pub async fn submit_at(&self, request: SubmissionRequest, now: DateTime<Utc>) -> Result<SubmissionOutcome> {
        request.validate()?;
        let submitter_id = request.submitter_id.as_str();
        let _user_lock = self.locks.acquire(submitter_id).await;

        if dedup::is_duplicate(&self.store, &request, self.config.dedup_window(), now).await? {
            let bonus_count =
                self.store.get_user_state(submitter_id).await?.map(|s| s.bonus_count).unwrap_or(0);
            return Ok(SubmissionOutcome::duplicate(bonus_count));
        }

        let mut state = self.load_or_create(submitter_id).await?;

        // counted before this submission is stored, so it only sees earlier ones
        let submitted_today = daily_gate::has_submitted_today(&self.store, submitter_id, now).await?;
        let draw = self.draw_lottery(&mut state, submitted_today, now);
        let result = draw.map(|d| d.result()).unwrap_or(LotteryResult::None);

        let record = SubmissionRecord::from_request(&request, result, now);
        let record = self.store.create_submission(record).await?;
        debug!(submitter_id, record_id = %record.id, ?result, submitted_today, "submission stored");

        let options = GrantOptions { boost_rarity: request.has_game_asset() };
        let reward = self.with_rng(|rng| self.granter.grant(&mut state, &self.catalog, options, rng, now));
        self.store.save_user_state(&state).await?;

        self.notify(&state, &reward);

        Ok(SubmissionOutcome {
            result,
            probability: draw.map(|d| d.probability).unwrap_or(0.0),
            bonus_count: state.bonus_count,
            reward_title: Some(reward.title.clone()),
            reward_card_id: Some(reward.card_id.clone()),
            reward_card: reward.card.as_ref().map(RewardCard::from),
            jackpot_recorded_at: draw.filter(|d| d.won).map(|_| now),
        })
    }

    async fn load_or_create(&self, user_id: &str) -> Result<UserRewardState> {
        if let Some(state) = self.store.get_user_state(user_id).await? {
            return Ok(state);
        }

        match self.store.create_user_state(UserRewardState::new(user_id)).await {
            Ok(state) => {
                info!(user_id, "reward state created");
                Ok(state)
            }
            // created concurrently elsewhere
            Err(StoreError::Conflict { .. }) => self
                .store
                .get_user_state(user_id)
                .await?
                .ok_or_else(|| StoreError::NotFound(user_id.to_string()).into()),
            Err(e) => Err(e.into()),
        }
    }

    /// One jackpot roll per JST day while the lottery is enabled.
    fn draw_lottery(
        &self,
        state: &mut UserRewardState,
        submitted_today: bool,
        now: DateTime<Utc>,
    ) -> Option<LotteryDraw> {
        if !self.config.lottery_enabled || submitted_today {
            return None;
        }
        let draw = self.with_rng(|rng| lottery::evaluate(state.bonus_count, rng));
        lottery::apply_outcome(state, draw.won, now);
        info!(user_id = %state.user_id, won = draw.won, probability = draw.probability, "jackpot drawn");
        Some(draw)
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut (dyn RandomSource + Send)) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut **rng)
    }

    fn notify(&self, state: &UserRewardState, reward: &GrantedReward) {
        let card_name = reward.card.as_ref().map(|c| c.card_name.as_str()).unwrap_or(&reward.card_id);
        let job = NotificationJob {
            recipient_id: state.user_id.clone(),
            message: format!("You earned the title \"{}\" and the card {}", reward.title, card_name),
            title: Some(reward.title.clone()),
            card_id: Some(reward.card_id.clone()),
        };
        if let Err(e) = self.notifier.enqueue(job) {
            warn!(user_id = %state.user_id, error = %e, "notification enqueue failed");
        }
    }
}
