//! Submission reward: a title and one card on every accepted submission.
//!
//! Card category is a coin flip between Character and Effect. Characters are drawn by
//! rarity weight; Effects come from the reserved `E101`..=`E136` range. Packaged game
//! submissions draw with boosted SSR/SR weights for both categories.

use crate::catalog::{draw_uniform, draw_weighted, CardCatalog, CardDefinition, CardType, PublicCard, RarityWeights};
use crate::config::TITLE_TTL_DAYS;
use crate::sampler::RandomSource;
use crate::types::UserRewardState;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

/// Flavor titles, one picked uniformly per grant.
pub const REWARD_TITLES: [&str; 5] =
    ["Rising Creator", "Idea Alchemist", "Daily Challenger", "Spark Seeker", "Frame Breaker"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrantOptions {
    /// Shift draw weight toward SSR/SR
    pub boost_rarity: bool,
}

/// What one grant handed out.
#[derive(Debug, Clone, PartialEq)]
pub struct GrantedReward {
    pub title: String,
    pub title_expires_at: DateTime<Utc>,
    pub card_id: String,
    /// `None` when the catalog had nothing to draw and a placeholder id was issued
    pub card: Option<PublicCard>,
    pub category: CardType,
    pub granted_at: DateTime<Utc>,
}

pub struct RewardGranter {
    weights: RarityWeights,
    title_ttl: Duration,
}

impl Default for RewardGranter {
    fn default() -> Self {
        Self::new()
    }
}

impl RewardGranter {
    pub fn new() -> Self {
        Self { weights: RarityWeights::default(), title_ttl: Duration::days(TITLE_TTL_DAYS) }
    }

    pub fn with_weights(weights: RarityWeights) -> Self {
        Self { weights, ..Self::new() }
    }

    /// How long a granted title stays active.
    pub fn with_title_ttl(mut self, title_ttl: Duration) -> Self {
        self.title_ttl = title_ttl;
        self
    }

    /// Weights used for a draw in the given mode.
    pub fn weights_for(&self, options: GrantOptions) -> RarityWeights {
        if options.boost_rarity {
            self.weights.boosted()
        } else {
            self.weights
        }
    }

    /// Draw a title and a card and apply both to `state`.
    ///
    /// The title always replaces the current one. The card is appended to the collection.
    /// Persisting `state` is the caller's job.
    pub fn grant<S: RandomSource + ?Sized>(
        &self,
        state: &mut UserRewardState,
        catalog: &CardCatalog,
        options: GrantOptions,
        rng: &mut S,
        now: DateTime<Utc>,
    ) -> GrantedReward {
        let title = REWARD_TITLES[rng.index(REWARD_TITLES.len())].to_string();
        let title_expires_at = now + self.title_ttl;
        state.set_title(title.clone(), title_expires_at);

        let category = if rng.coin_flip() { CardType::Character } else { CardType::Effect };
        let drawn = self.draw_card(catalog, category, options, rng);

        let (card_id, card) = match drawn {
            Some(definition) => (definition.card_id.clone(), Some(definition.to_public_view())),
            None => {
                let placeholder = placeholder_card_id(now);
                warn!(card_id = %placeholder, "catalog has no cards, issuing placeholder");
                (placeholder, None)
            }
        };
        state.add_card(card_id.clone(), now);

        info!(
            user_id = %state.user_id,
            card_id = %card_id,
            title = %title,
            boost = options.boost_rarity,
            "submission reward granted"
        );

        GrantedReward { title, title_expires_at, card_id, card, category, granted_at: now }
    }

    /// Card of `category`, falling back to any card of that category.
    pub fn draw_card<'a, S: RandomSource + ?Sized>(
        &self,
        catalog: &'a CardCatalog,
        category: CardType,
        options: GrantOptions,
        rng: &mut S,
    ) -> Option<&'a CardDefinition> {
        let weights = self.weights_for(options);

        let primary = match category {
            CardType::Character => catalog.draw_character_with(&weights, rng),
            CardType::Effect => {
                let reserved = catalog.reserved_effects();
                if options.boost_rarity {
                    draw_weighted(&reserved, &weights, rng)
                } else {
                    draw_uniform(&reserved, rng)
                }
            }
        };

        primary.or_else(|| draw_uniform(&catalog.by_type(category), rng))
    }
}

/// Synthetic id used when the catalog is empty.
pub fn placeholder_card_id(now: DateTime<Utc>) -> String {
    format!("card_{}", now.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::test_catalog;
    use crate::catalog::Rarity;
    use crate::sampler::{FixedRolls, RngSource};

    #[test]
    fn test_grant_sets_title_and_appends_card() {
        let catalog = test_catalog();
        let granter = RewardGranter::new();
        let mut state = UserRewardState::new("u1");
        state.add_card("C004", Utc::now());
        let now = Utc::now();

        let mut rng = RngSource::seeded(9);
        let reward = granter.grant(&mut state, &catalog, GrantOptions::default(), &mut rng, now);

        assert!(REWARD_TITLES.contains(&reward.title.as_str()));
        assert_eq!(state.active_title.as_deref(), Some(reward.title.as_str()));
        assert_eq!(state.active_title_expires_at, Some(now + Duration::milliseconds(7 * 24 * 60 * 60 * 1000)));
        assert_eq!(state.card_collection.len(), 2);
        assert_eq!(state.card_collection[1].card_id, reward.card_id);
        assert_eq!(state.card_collection[1].obtained_at, now);
        assert!(reward.card.is_some());
    }

    #[test]
    fn test_title_ttl_sets_expiry() {
        let catalog = test_catalog();
        let now = Utc::now();
        let mut state = UserRewardState::new("u1");
        let granter = RewardGranter::new().with_title_ttl(Duration::days(3));

        let mut rng = RngSource::seeded(5);
        let reward = granter.grant(&mut state, &catalog, GrantOptions::default(), &mut rng, now);

        assert_eq!(reward.title_expires_at, now + Duration::days(3));
        assert_eq!(state.active_title_at(now + Duration::days(3)), None);
        assert!(state.active_title_at(now + Duration::days(2)).is_some());
    }

    #[test]
    fn test_title_is_overwritten_even_if_longer_lived() {
        let catalog = test_catalog();
        let now = Utc::now();
        let mut state = UserRewardState::new("u1");
        state.set_title("Legacy Title", now + Duration::days(365));

        let mut rng = RngSource::seeded(2);
        let reward = RewardGranter::new().grant(&mut state, &catalog, GrantOptions::default(), &mut rng, now);

        assert_ne!(state.active_title.as_deref(), Some("Legacy Title"));
        assert_eq!(state.active_title_expires_at, Some(reward.title_expires_at));
    }

    #[test]
    fn test_roll_order_title_category_card() {
        let catalog = test_catalog();
        let mut state = UserRewardState::new("u1");

        // title index 0, coin 0.1 -> Character, tier 0.005 -> SSR, index 0
        let mut rolls = FixedRolls::new(vec![0.0, 0.1, 0.005, 0.0]);
        let reward =
            RewardGranter::new().grant(&mut state, &catalog, GrantOptions::default(), &mut rolls, Utc::now());
        assert_eq!(reward.title, REWARD_TITLES[0]);
        assert_eq!(reward.category, CardType::Character);
        assert_eq!(reward.card_id, "C001");

        // title index 4, coin 0.7 -> Effect, reserved pool index 1
        let mut rolls = FixedRolls::new(vec![0.99, 0.7, 0.9]);
        let reward =
            RewardGranter::new().grant(&mut state, &catalog, GrantOptions::default(), &mut rolls, Utc::now());
        assert_eq!(reward.title, REWARD_TITLES[4]);
        assert_eq!(reward.category, CardType::Effect);
        assert_eq!(reward.card_id, "E136");
    }

    #[test]
    fn test_effect_draws_stay_in_reserved_range() {
        let catalog = test_catalog();
        let granter = RewardGranter::new();
        let mut rng = RngSource::seeded(77);

        for boost_rarity in [false, true] {
            for _ in 0..500 {
                let card = granter
                    .draw_card(&catalog, CardType::Effect, GrantOptions { boost_rarity }, &mut rng)
                    .unwrap();
                assert!(card.is_reserved_effect(), "drew {}", card.card_id);
            }
        }
    }

    #[test]
    fn test_effect_falls_back_to_any_effect_without_reserved_range() {
        let table = "\
card_id,card_type,card_name,rarity
C001,Character,Only Character,N
E001,Effect,Plain Effect,-
";
        let catalog = CardCatalog::from_csv_str(table);
        let mut rng = RngSource::seeded(1);
        let card = RewardGranter::new()
            .draw_card(&catalog, CardType::Effect, GrantOptions::default(), &mut rng)
            .unwrap();
        assert_eq!(card.card_id, "E001");
    }

    #[test]
    fn test_empty_catalog_issues_placeholder() {
        let catalog = CardCatalog::default();
        let now = Utc::now();
        let mut state = UserRewardState::new("u1");
        let mut rng = RngSource::seeded(1);

        let reward = RewardGranter::new().grant(&mut state, &catalog, GrantOptions::default(), &mut rng, now);
        assert_eq!(reward.card_id, format!("card_{}", now.timestamp_millis()));
        assert!(reward.card.is_none());
        assert_eq!(state.card_collection.len(), 1);
    }

    #[test]
    fn test_boost_raises_high_rarity_character_share() {
        let catalog = test_catalog();
        let granter = RewardGranter::new();
        let trials = 100_000;

        let high_share = |boost_rarity: bool, seed: u64| {
            let mut rng = RngSource::seeded(seed);
            let high = (0..trials)
                .filter_map(|_| {
                    granter.draw_card(&catalog, CardType::Character, GrantOptions { boost_rarity }, &mut rng)
                })
                .filter(|c| matches!(c.rarity, Some(Rarity::Ssr) | Some(Rarity::Sr)))
                .count();
            high as f64 / trials as f64
        };

        let normal = high_share(false, 100);
        let boosted = high_share(true, 200);
        // expected 0.05 vs 0.07, standard error is ~0.0008
        assert!(boosted - normal > 0.01, "boosted {} vs normal {}", boosted, normal);
    }
}
