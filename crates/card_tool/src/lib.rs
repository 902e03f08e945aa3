//! Card Tool Library
//!
//! Card master checks, draw simulation and the jackpot probability table.

use anyhow::{Context, Result};
use reward_core::catalog::{CatalogStats, RESERVED_EFFECT_RANGE};
use reward_core::lottery;
use reward_core::sampler::{RandomSource, RngSource};
use reward_core::{CardCatalog, CardType, GrantOptions, Rarity, RarityWeights, RewardGranter};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Summary of one card master file.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogReport {
    pub source: String,
    /// RFC3339
    pub generated_at: String,
    pub stats: CatalogStats,
    pub total: usize,
    pub characters: usize,
    pub effects: usize,
    pub reserved_effects: usize,
    /// Character count per rarity
    pub character_rarity: BTreeMap<&'static str, usize>,
    pub issues: Vec<String>,
}

impl CatalogReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Load `path` strictly; unreadable files are an error here, not a fallback.
pub fn load_catalog(path: &Path) -> Result<CardCatalog> {
    CardCatalog::load_from_path(path)
        .with_context(|| format!("Failed to read card master: {}", path.display()))
}

pub fn inspect_catalog(path: &Path) -> Result<CatalogReport> {
    let catalog = load_catalog(path)?;
    Ok(build_report(&catalog, &path.display().to_string()))
}

/// Count cards and collect anything that would degrade reward draws.
pub fn build_report(catalog: &CardCatalog, source: &str) -> CatalogReport {
    let characters = catalog.characters();
    let reserved = catalog.reserved_effects();
    let defaults = RarityWeights::default();
    let mut issues = Vec::new();

    let mut character_rarity = BTreeMap::new();
    for rarity in Rarity::ALL {
        let count = characters.iter().filter(|c| c.rarity == Some(rarity)).count();
        if count == 0 {
            issues.push(format!("no {} characters, draws for that tier fall back to the whole pool", rarity.as_str()));
        }
        character_rarity.insert(rarity.as_str(), count);
    }

    for card in &characters {
        match (card.rarity, card.rarity_rate) {
            (None, _) => issues.push(format!("{}: character without rarity is never drawn by tier", card.card_id)),
            (Some(rarity), Some(rate)) if (rate - defaults.weight(rarity)).abs() > 1e-9 => issues.push(format!(
                "{}: rarity_rate {} differs from the {} draw weight {}",
                card.card_id,
                rate,
                rarity.as_str(),
                defaults.weight(rarity)
            )),
            _ => {}
        }
    }

    let missing: Vec<String> = RESERVED_EFFECT_RANGE
        .map(|n| format!("E{}", n))
        .filter(|id| catalog.get(id).map(|c| c.card_type != CardType::Effect).unwrap_or(true))
        .collect();
    if !missing.is_empty() {
        issues.push(format!("missing reserved effects: {}", missing.join(", ")));
    }

    let stats = catalog.stats().clone();
    if stats.rows_skipped > 0 {
        issues.push(format!("{} rows skipped (missing id or unknown type)", stats.rows_skipped));
    }
    if stats.duplicates_dropped > 0 {
        issues.push(format!("{} duplicate card ids dropped", stats.duplicates_dropped));
    }

    debug!(source, issues = issues.len(), "catalog report built");

    CatalogReport {
        source: source.to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        stats,
        total: catalog.len(),
        characters: characters.len(),
        effects: catalog.effects().len(),
        reserved_effects: reserved.len(),
        character_rarity,
        issues,
    }
}

/// Result of a batch of simulated reward draws.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationSummary {
    pub draws: u32,
    pub boost: bool,
    pub seed: u64,
    pub characters: u32,
    pub effects: u32,
    /// Draws per rarity across both categories; unrated cards land under "-"
    pub by_rarity: BTreeMap<&'static str, u32>,
    /// Draws that found nothing in the catalog
    pub empty: u32,
}

impl SimulationSummary {
    pub fn share(&self, rarity: Rarity) -> f64 {
        if self.draws == 0 {
            return 0.0;
        }
        self.by_rarity.get(rarity.as_str()).copied().unwrap_or(0) as f64 / self.draws as f64
    }
}

/// Draw `draws` reward cards the way a submission does, without touching any user state.
pub fn simulate_draws(catalog: &CardCatalog, draws: u32, boost: bool, seed: u64) -> SimulationSummary {
    let granter = RewardGranter::new();
    let options = GrantOptions { boost_rarity: boost };
    let mut rng = RngSource::seeded(seed);
    let mut summary = SimulationSummary { draws, boost, seed, ..SimulationSummary::default() };

    for _ in 0..draws {
        let category = if rng.coin_flip() { CardType::Character } else { CardType::Effect };
        match category {
            CardType::Character => summary.characters += 1,
            CardType::Effect => summary.effects += 1,
        }
        match granter.draw_card(catalog, category, options, &mut rng) {
            Some(card) => {
                let key = card.rarity.map(|r| r.as_str()).unwrap_or("-");
                *summary.by_rarity.entry(key).or_insert(0) += 1;
            }
            None => summary.empty += 1,
        }
    }

    info!(draws, boost, seed, empty = summary.empty, "simulation finished");
    summary
}

/// `(losses, win probability)` for streaks `0..=max_losses`.
pub fn probability_table(max_losses: u32) -> Vec<(u32, f64)> {
    (0..=max_losses).map(|k| (k, lottery::probability(k as i64))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "card_id,card_type,card_name,rarity,rarity_rate,attribute,base_atk,base_def,effect_category,effect_target,effect_value,duration_turn,special_effect_code,initial_deck_count,image_url";

    #[test]
    fn test_bundled_master_is_clean() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../reward_core/data/card_master.csv");
        let report = inspect_catalog(&path).unwrap();
        assert!(report.is_clean(), "issues: {:?}", report.issues);
        assert_eq!(report.reserved_effects, 36);
        assert_eq!(report.characters + report.effects, report.total);
    }

    #[test]
    fn test_report_flags_gaps() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "C001,Character,Only SSR,SSR,0.5,-,-,-,-,-,-,-,-,-,-").unwrap();
        writeln!(file, "C001,Character,Duplicate,N,0.75,-,-,-,-,-,-,-,-,-,-").unwrap();
        writeln!(file, "C002,Character,Unrated,-,-,-,-,-,-,-,-,-,-,-,-").unwrap();
        writeln!(file, "E101,Effect,Lone Reserved,-,-,-,-,-,-,-,-,-,-,-,-").unwrap();

        let report = inspect_catalog(file.path()).unwrap();
        let joined = report.issues.join("\n");

        assert!(joined.contains("no SR characters"));
        assert!(joined.contains("C001: rarity_rate 0.5"));
        assert!(joined.contains("C002: character without rarity"));
        assert!(joined.contains("missing reserved effects: E102"));
        assert!(!joined.contains("E101,"));
        assert!(joined.contains("1 duplicate card ids dropped"));
        assert_eq!(report.character_rarity["SSR"], 1);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = inspect_catalog(Path::new("/nonexistent/cards.csv")).unwrap_err();
        assert!(err.to_string().contains("Failed to read card master"));
    }

    #[test]
    fn test_simulation_is_reproducible() {
        let catalog = CardCatalog::embedded();
        let a = simulate_draws(&catalog, 2_000, false, 11);
        let b = simulate_draws(&catalog, 2_000, false, 11);

        assert_eq!(a.by_rarity, b.by_rarity);
        assert_eq!(a.characters + a.effects, 2_000);
        assert_eq!(a.empty, 0);
    }

    #[test]
    fn test_boost_shifts_simulated_share() {
        let catalog = CardCatalog::embedded();
        let normal = simulate_draws(&catalog, 100_000, false, 3);
        let boosted = simulate_draws(&catalog, 100_000, true, 3);
        let high = |s: &SimulationSummary| s.share(Rarity::Ssr) + s.share(Rarity::Sr);
        assert!(high(&boosted) > high(&normal));
    }

    #[test]
    fn test_empty_catalog_simulation() {
        let summary = simulate_draws(&CardCatalog::default(), 10, false, 1);
        assert_eq!(summary.empty, 10);
        assert_eq!(summary.share(Rarity::N), 0.0);
    }

    #[test]
    fn test_probability_table_caps() {
        let table = probability_table(25);
        assert_eq!(table.len(), 26);
        assert!((table[0].1 - 0.008).abs() < 1e-12);
        assert!((table[10].1 - 0.028).abs() < 1e-12);
        assert!((table[25].1 - 0.05).abs() < 1e-12);
    }
}
