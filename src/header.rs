//! Header reconciliation for raw exports.
//!
//! Spreadsheet exports put title rows, blank spacer rows, and merged-cell
//! annotations above the real header, and sometimes split the header across
//! two adjacent rows (the second carrying "Ссылка" reference annotations).
//! [`reconcile`] finds the true header row, folds the annotation row into it,
//! strips markup tokens from the names, and returns a [`CleanTable`] holding
//! only data rows.

use std::collections::HashSet;

use log::debug;

use crate::{
    error::PipelineError,
    table::{Cell, CleanTable, RawTable},
};

/// A row qualifies as the header once this many cells past the first column
/// are populated. Tuned against real warehouse exports.
pub const HEADER_MIN_FILLED: usize = 6;

/// Marker token (lowercase) identifying the secondary annotation header row.
pub const SECONDARY_HEADER_TOKEN: &str = "ссылка";

/// Locates and merges the header, returning a table of data rows only.
/// Fails with [`PipelineError::HeaderNotFound`] when no row qualifies.
pub fn reconcile(raw: RawTable) -> Result<CleanTable, PipelineError> {
    let width = raw.width();
    let mut rows = raw.rows;

    let mut primary = rows
        .iter()
        .position(|row| {
            row.iter().skip(1).filter(|cell| !cell.is_missing()).count() >= HEADER_MIN_FILLED
        })
        .ok_or(PipelineError::HeaderNotFound {
            min_filled: HEADER_MIN_FILLED,
        })?;
    debug!("Primary header located at row {primary}");

    let mut header = rows[primary].clone();
    header.resize(width, Cell::Missing);

    // The annotation row, when present, sits immediately above or below the
    // primary header. Scan in index order so the row above wins ties.
    let last = rows.len() - 1;
    let secondary = (primary.saturating_sub(1)..=(primary + 1).min(last))
        .filter(|&i| i != primary)
        .find(|&i| {
            rows[i].iter().any(|cell| {
                cell.as_display()
                    .to_lowercase()
                    .contains(SECONDARY_HEADER_TOKEN)
            })
        });

    if let Some(sec) = secondary {
        debug!("Merging secondary header row {sec}");
        // Primary wins per cell; the annotation fills only gaps.
        for (idx, slot) in header.iter_mut().enumerate() {
            if slot.is_missing() {
                if let Some(value) = rows[sec].get(idx) {
                    *slot = value.clone();
                }
            }
        }
        rows.remove(sec);
        if sec < primary {
            primary -= 1;
        }
    }

    let data_rows = rows.split_off(primary + 1);
    let names = finalize_names(&header);

    let columns = (0..width)
        .map(|c| {
            data_rows
                .iter()
                .map(|row| row.get(c).cloned().unwrap_or(Cell::Missing))
                .collect()
        })
        .collect();
    Ok(CleanTable::new(names, columns))
}

/// Strips annotation tokens and punctuation from a header cell's text:
/// case-insensitive removals of the "ссылка" marker, then periods and commas,
/// then surrounding whitespace.
pub fn clean_header_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let token: Vec<char> = SECONDARY_HEADER_TOKEN.chars().collect();
    let mut out = String::with_capacity(name.len());
    let mut i = 0;
    while i < chars.len() {
        let token_here = i + token.len() <= chars.len()
            && chars[i..i + token.len()]
                .iter()
                .zip(&token)
                .all(|(a, b)| a.to_lowercase().eq(b.to_lowercase()));
        if token_here {
            i += token.len();
            continue;
        }
        let ch = chars[i];
        if ch != '.' && ch != ',' {
            out.push(ch);
        }
        i += 1;
    }
    out.trim().to_string()
}

/// Derives final column names from the merged header row: string cells are
/// cleaned, non-string cells pass through via their display form, blanks get
/// positional names, and duplicates get numeric suffixes so names stay unique.
fn finalize_names(header: &[Cell]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let base = match cell {
                Cell::Str(s) => clean_header_name(s),
                Cell::Missing => String::new(),
                other => other.as_display(),
            };
            let base = if base.is_empty() {
                format!("column_{}", idx + 1)
            } else {
                base
            };
            let mut name = base.clone();
            let mut n = 2;
            while !used.insert(name.clone()) {
                name = format!("{base}_{n}");
                n += 1;
            }
            name
        })
        .collect()
}
