//! Column role detection by bounded sampling.
//!
//! Both detectors read at most [`SAMPLE_LIMIT`] values per column, so their
//! cost is independent of row count. Absence of a qualifying column is a
//! valid result, not an error; callers decide fallback policy. The thresholds
//! here are domain-tuned against real warehouse exports; adjust the constants
//! rather than the scan logic.

use log::{debug, info};

use crate::{dates::parse_fuzzy_datetime, table::CleanTable};

/// Upper bound on sampled values per column for every detector.
pub const SAMPLE_LIMIT: usize = 10;

/// Fraction of sampled values that must parse as dates for a column to be
/// tagged as the date axis.
pub const DATE_RATIO_THRESHOLD: f64 = 0.8;

/// Minimum keyword hits for a content-based product column match.
pub const PRODUCT_MATCH_MIN: usize = 3;

/// Positional fallback when no column passes the keyword test: the third
/// column, where exports conventionally put the product description.
pub const PRODUCT_FALLBACK_INDEX: usize = 2;

/// Lowercase material/shape stems that mark product description text.
pub const PRODUCT_KEYWORDS: &[&str] = &[
    "труба",
    "лист",
    "уголок",
    "круг",
    "полоса",
    "арматура",
    "швеллер",
    "проф",
];

/// Returns the first column, scanning left to right, whose sampled values
/// parse as dates at [`DATE_RATIO_THRESHOLD`] or better. The scan
/// short-circuits on the first hit: ambiguous tables resolve to the leftmost
/// candidate, deliberately.
pub fn find_date_column(table: &CleanTable) -> Option<String> {
    for (idx, name) in table.names().iter().enumerate() {
        let sample: Vec<String> = table
            .column_at(idx)
            .iter()
            .filter(|cell| !cell.is_missing())
            .take(SAMPLE_LIMIT)
            .map(|cell| cell.as_display())
            .collect();
        if sample.is_empty() {
            continue;
        }
        let parsed = sample
            .iter()
            .filter(|value| parse_fuzzy_datetime(value).is_some())
            .count();
        let ratio = parsed as f64 / sample.len() as f64;
        debug!(
            "Column '{name}': {parsed}/{} sampled value(s) parse as dates",
            sample.len()
        );
        if ratio >= DATE_RATIO_THRESHOLD {
            info!(
                "Date column '{name}' detected ({parsed}/{} sampled values)",
                sample.len()
            );
            return Some(name.clone());
        }
    }
    info!("No column with date-like values found");
    None
}

/// A product column pick, recording whether content or position chose it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductMatch {
    pub index: usize,
    pub name: String,
    pub by_keywords: bool,
}

/// Returns the column most likely to hold product descriptions.
///
/// Two tiers: the column with the most keyword hits wins when it reaches
/// [`PRODUCT_MATCH_MIN`]; otherwise tables wider than two columns fall back
/// to [`PRODUCT_FALLBACK_INDEX`] by position. Ties keep the leftmost column.
pub fn detect_product_column(table: &CleanTable) -> Option<ProductMatch> {
    let sample_size = SAMPLE_LIMIT.min(table.row_count());
    let mut best: Option<(usize, String)> = None;
    let mut best_matches = 0usize;

    for (idx, name) in table.names().iter().enumerate() {
        let matches = table
            .column_at(idx)
            .iter()
            .take(sample_size)
            .filter(|cell| !cell.is_missing())
            .filter(|cell| {
                let text = cell.as_display().to_lowercase();
                PRODUCT_KEYWORDS.iter().any(|kw| text.contains(kw))
            })
            .count();
        if matches > best_matches {
            best_matches = matches;
            best = Some((idx, name.clone()));
        }
    }

    if let Some((index, name)) = best {
        if best_matches >= PRODUCT_MATCH_MIN {
            info!("Product column '{name}' detected ({best_matches} keyword match(es))");
            return Some(ProductMatch {
                index,
                name,
                by_keywords: true,
            });
        }
    }

    if table.column_count() > PRODUCT_FALLBACK_INDEX {
        let name = table.names()[PRODUCT_FALLBACK_INDEX].clone();
        info!("Falling back to positional product column '{name}'");
        return Some(ProductMatch {
            index: PRODUCT_FALLBACK_INDEX,
            name,
            by_keywords: false,
        });
    }
    None
}
