//! Card master catalog
//!
//! Static card definitions loaded once from the card master table, with the
//! filtered views and draw functions the reward granter uses.

pub mod loader;
pub mod service;

use crate::sampler::{pick, RandomSource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use tracing::{debug, warn};

pub use loader::{CatalogStats, EMBEDDED_CARD_MASTER};
pub use service::{card_catalog, reload_card_catalog, CatalogService};

/// Effect ids handed out by submission rewards (`E101`..=`E136`).
pub const RESERVED_EFFECT_RANGE: RangeInclusive<u32> = 101..=136;

/// Rarity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rarity {
    #[serde(rename = "SSR")]
    Ssr,
    #[serde(rename = "SR")]
    Sr,
    #[serde(rename = "R")]
    R,
    #[serde(rename = "N")]
    N,
}

impl Rarity {
    pub const ALL: [Rarity; 4] = [Rarity::Ssr, Rarity::Sr, Rarity::R, Rarity::N];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SSR" => Some(Rarity::Ssr),
            "SR" => Some(Rarity::Sr),
            "R" => Some(Rarity::R),
            "N" => Some(Rarity::N),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Ssr => "SSR",
            Rarity::Sr => "SR",
            Rarity::R => "R",
            Rarity::N => "N",
        }
    }

    /// SSR or SR
    pub fn is_high(&self) -> bool {
        matches!(self, Rarity::Ssr | Rarity::Sr)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    Character,
    Effect,
}

impl CardType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "character" => Some(CardType::Character),
            "effect" => Some(CardType::Effect),
            _ => None,
        }
    }
}

/// Relative draw weights per rarity tier. Weights need not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RarityWeights {
    pub ssr: f64,
    pub sr: f64,
    pub r: f64,
    pub n: f64,
}

impl Default for RarityWeights {
    fn default() -> Self {
        Self { ssr: 0.01, sr: 0.04, r: 0.20, n: 0.75 }
    }
}

impl RarityWeights {
    /// Boost applied to SSR and SR when a submission carries a game asset.
    pub const BOOST: f64 = 0.01;

    /// SSR and SR gain `BOOST` each; N takes whatever is left of 1.0, floored at 0.
    pub fn boosted(&self) -> Self {
        let ssr = self.ssr + Self::BOOST;
        let sr = self.sr + Self::BOOST;
        let n = (1.0 - (ssr + sr + self.r)).max(0.0);
        Self { ssr, sr, r: self.r, n }
    }

    pub fn weight(&self, rarity: Rarity) -> f64 {
        match rarity {
            Rarity::Ssr => self.ssr,
            Rarity::Sr => self.sr,
            Rarity::R => self.r,
            Rarity::N => self.n,
        }
    }

    pub fn entries(&self) -> [(Rarity, f64); 4] {
        Rarity::ALL.map(|rarity| (rarity, self.weight(rarity)))
    }
}

/// One row of the card master table. `None` marks a `-` (absent) or unparseable cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub card_id: String,
    pub card_type: CardType,
    pub card_name: String,
    pub rarity: Option<Rarity>,
    pub rarity_rate: Option<f64>,
    pub attribute: Option<String>,
    pub base_atk: Option<i32>,
    pub base_def: Option<i32>,
    pub effect_category: Option<String>,
    pub effect_target: Option<String>,
    pub effect_value: Option<f64>,
    pub duration_turn: Option<u32>,
    pub special_effect_code: Option<String>,
    pub initial_deck_count: Option<u32>,
    pub image_url: Option<String>,
}

impl CardDefinition {
    /// Effect card whose `E###` id falls inside the reserved reward range.
    pub fn is_reserved_effect(&self) -> bool {
        self.card_type == CardType::Effect && is_reserved_effect_id(&self.card_id)
    }

    /// Client-facing view without the balancing fields.
    pub fn to_public_view(&self) -> PublicCard {
        PublicCard {
            card_id: self.card_id.clone(),
            card_type: self.card_type,
            card_name: self.card_name.clone(),
            rarity: self.rarity,
            attribute: self.attribute.clone(),
            base_atk: self.base_atk,
            base_def: self.base_def,
            effect_category: self.effect_category.clone(),
            effect_target: self.effect_target.clone(),
            effect_value: self.effect_value,
            duration_turn: self.duration_turn,
            image_url: self.image_url.clone(),
        }
    }
}

pub fn is_reserved_effect_id(card_id: &str) -> bool {
    card_id
        .strip_prefix('E')
        .filter(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        .and_then(|digits| digits.parse::<u32>().ok())
        .map(|number| RESERVED_EFFECT_RANGE.contains(&number))
        .unwrap_or(false)
}

/// Card as shown to clients. Absent values are omitted when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicCard {
    pub card_id: String,
    pub card_type: CardType,
    pub card_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rarity: Option<Rarity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_atk: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_def: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_turn: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Loaded card master table
#[derive(Debug, Clone, Default)]
pub struct CardCatalog {
    cards: Vec<CardDefinition>,
    index: HashMap<String, usize>,
    stats: CatalogStats,
}

impl CardCatalog {
    /// Build from parsed rows. Later rows with an already seen `card_id` are dropped.
    pub fn from_cards(cards: Vec<CardDefinition>) -> Self {
        let mut stats = CatalogStats { rows_read: cards.len(), ..CatalogStats::default() };
        let mut catalog = Self::default();
        for card in cards {
            if catalog.index.contains_key(&card.card_id) {
                warn!(card_id = %card.card_id, "duplicate card id in catalog, keeping first row");
                stats.duplicates_dropped += 1;
                continue;
            }
            catalog.index.insert(card.card_id.clone(), catalog.cards.len());
            catalog.cards.push(card);
        }
        catalog.stats = stats;
        catalog
    }

    pub(crate) fn with_stats(mut self, stats: CatalogStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn cards(&self) -> &[CardDefinition] {
        &self.cards
    }

    pub fn stats(&self) -> &CatalogStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, card_id: &str) -> Option<&CardDefinition> {
        self.index.get(card_id).map(|&i| &self.cards[i])
    }

    pub fn by_type(&self, card_type: CardType) -> Vec<&CardDefinition> {
        self.cards.iter().filter(|c| c.card_type == card_type).collect()
    }

    pub fn characters(&self) -> Vec<&CardDefinition> {
        self.by_type(CardType::Character)
    }

    pub fn effects(&self) -> Vec<&CardDefinition> {
        self.by_type(CardType::Effect)
    }

    /// Effects inside [`RESERVED_EFFECT_RANGE`]
    pub fn reserved_effects(&self) -> Vec<&CardDefinition> {
        self.cards.iter().filter(|c| c.is_reserved_effect()).collect()
    }

    /// Rarity-weighted Character draw with the default weight table.
    pub fn draw_character<S: RandomSource + ?Sized>(&self, rng: &mut S) -> Option<&CardDefinition> {
        self.draw_character_with(&RarityWeights::default(), rng)
    }

    pub fn draw_character_with<S: RandomSource + ?Sized>(
        &self,
        weights: &RarityWeights,
        rng: &mut S,
    ) -> Option<&CardDefinition> {
        draw_weighted(&self.characters(), weights, rng)
    }

    /// Uniform pick across every Effect card.
    pub fn draw_effect<S: RandomSource + ?Sized>(&self, rng: &mut S) -> Option<&CardDefinition> {
        draw_uniform(&self.effects(), rng)
    }
}

/// Choose a tier by `weights`, then a card uniformly inside that tier.
/// An empty tier falls back to a uniform pick across the whole pool.
pub fn draw_weighted<'a, S: RandomSource + ?Sized>(
    pool: &[&'a CardDefinition],
    weights: &RarityWeights,
    rng: &mut S,
) -> Option<&'a CardDefinition> {
    if pool.is_empty() {
        return None;
    }

    let tier = pick(&weights.entries(), rng)?;
    let tier_pool: Vec<&CardDefinition> =
        pool.iter().copied().filter(|c| c.rarity == Some(tier)).collect();

    if tier_pool.is_empty() {
        debug!(tier = tier.as_str(), pool = pool.len(), "empty rarity tier, drawing from whole pool");
        return draw_uniform(pool, rng);
    }
    draw_uniform(&tier_pool, rng)
}

pub fn draw_uniform<'a, S: RandomSource + ?Sized>(
    pool: &[&'a CardDefinition],
    rng: &mut S,
) -> Option<&'a CardDefinition> {
    if pool.is_empty() {
        return None;
    }
    Some(pool[rng.index(pool.len())])
}
