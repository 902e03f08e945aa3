//! Card master table parsing
//!
//! Header + rows CSV with the columns
//! `card_id,card_type,card_name,rarity,rarity_rate,attribute,base_atk,base_def,
//! effect_category,effect_target,effect_value,duration_turn,special_effect_code,
//! initial_deck_count,image_url`. A `-` (or empty) cell marks an absent value.

use super::{CardCatalog, CardDefinition, CardType, Rarity};
use csv::StringRecord;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Minimal table compiled into the binary, used when the backing file is unreadable.
pub const EMBEDDED_CARD_MASTER: &str = "\
card_id,card_type,card_name,rarity,rarity_rate,attribute,base_atk,base_def,effect_category,effect_target,effect_value,duration_turn,special_effect_code,initial_deck_count,image_url
C001,Character,Morning Sketcher,SSR,0.01,Light,120,100,-,-,-,-,SP_DAWN,1,-
C002,Character,Night Inker,SR,0.04,Dark,100,85,-,-,-,-,-,1,-
C003,Character,Brush Apprentice,R,0.20,Wind,75,60,-,-,-,-,-,2,-
C004,Character,Doodle Sprite,N,0.75,Earth,50,50,-,-,-,-,-,3,-
E101,Effect,First Spark,-,-,-,-,-,buff,self,10,2,-,1,-
E102,Effect,Second Wind,-,-,-,-,-,heal,self,15,1,-,1,-
";

const ABSENT: &str = "-";

/// Load statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub duplicates_dropped: usize,
    pub fallback_used: bool,
}

/// Header positions of the table columns. Columns missing from the header or
/// cells missing from a short row read as empty.
struct Columns {
    positions: HashMap<String, usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        let positions = headers.iter().enumerate().map(|(i, name)| (name.trim().to_string(), i)).collect();
        Self { positions }
    }

    fn cell<'r>(&self, record: &'r StringRecord, name: &str) -> &'r str {
        self.positions.get(name).and_then(|&i| record.get(i)).unwrap_or("")
    }
}

fn text(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    if trimmed.is_empty() || trimmed == ABSENT {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Malformed numbers degrade to `None` instead of failing the row.
fn number<T: FromStr>(cell: &str) -> Option<T> {
    text(cell).and_then(|value| value.parse::<T>().ok())
}

/// `None` for rows without an id or with an unknown card type.
fn parse_row(columns: &Columns, record: &StringRecord) -> Option<CardDefinition> {
    let cell = |name: &str| columns.cell(record, name);
    let card_id = text(cell("card_id"))?;
    let card_type = CardType::parse(cell("card_type"))?;

    Some(CardDefinition {
        card_name: text(cell("card_name")).unwrap_or_else(|| card_id.clone()),
        card_id,
        card_type,
        rarity: text(cell("rarity")).and_then(|r| Rarity::parse(&r)),
        rarity_rate: number(cell("rarity_rate")),
        attribute: text(cell("attribute")),
        base_atk: number(cell("base_atk")),
        base_def: number(cell("base_def")),
        effect_category: text(cell("effect_category")),
        effect_target: text(cell("effect_target")),
        effect_value: number(cell("effect_value")),
        duration_turn: number(cell("duration_turn")),
        special_effect_code: text(cell("special_effect_code")),
        initial_deck_count: number(cell("initial_deck_count")),
        image_url: text(cell("image_url")),
    })
}

impl CardCatalog {
    /// Parse a table from text. Unusable rows are skipped, never fatal.
    pub fn from_csv_str(table: &str) -> Self {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(table.as_bytes());

        let columns = match reader.headers() {
            Ok(headers) => Columns::from_headers(headers),
            Err(e) => {
                warn!(error = %e, "card master header unreadable, table is empty");
                return CardCatalog::default();
            }
        };

        let mut cards = Vec::new();
        let mut rows_read = 0;
        let mut rows_skipped = 0;

        for (line, record) in reader.records().enumerate() {
            rows_read += 1;
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    rows_skipped += 1;
                    warn!(line = line + 2, error = %e, "unreadable card row skipped");
                    continue;
                }
            };
            match parse_row(&columns, &record) {
                Some(card) => cards.push(card),
                None => {
                    rows_skipped += 1;
                    warn!(
                        line = line + 2,
                        card_id = columns.cell(&record, "card_id"),
                        "card row without id or known type skipped"
                    );
                }
            }
        }

        let catalog = CardCatalog::from_cards(cards);
        let stats = CatalogStats {
            rows_read,
            rows_skipped,
            duplicates_dropped: catalog.stats().duplicates_dropped,
            fallback_used: false,
        };
        catalog.with_stats(stats)
    }

    /// Read and parse the table at `path`.
    pub fn load_from_path(path: &Path) -> std::io::Result<Self> {
        let table = std::fs::read_to_string(path)?;
        Ok(Self::from_csv_str(&table))
    }

    /// The embedded fallback table.
    pub fn embedded() -> Self {
        let catalog = Self::from_csv_str(EMBEDDED_CARD_MASTER);
        let stats = CatalogStats { fallback_used: true, ..catalog.stats().clone() };
        catalog.with_stats(stats)
    }

    /// Load `path`, falling back to the embedded table if it cannot be read.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from_path(path) {
            Ok(catalog) => {
                info!(path = %path.display(), cards = catalog.len(), "card master loaded");
                catalog
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "card master unreadable, using embedded table");
                Self::embedded()
            }
        }
    }
}
