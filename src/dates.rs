//! Fuzzy date parsing and the date-index normalization stage.
//!
//! Export dates are predominantly day-first Russian forms ("15.03.2023",
//! "15.03.2023 10:30:00") but ISO and slash-separated variants show up too.
//! Parsing is tolerant of surrounding non-date tokens: when a cell does not
//! parse whole, its whitespace tokens are tried individually and as adjacent
//! date+time pairs, leftmost match first.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use log::info;

use crate::{
    error::PipelineError,
    table::{Cell, CleanTable},
};

const DATETIME_FORMATS: &[&str] = &[
    "%d.%m.%Y %H:%M:%S%.f",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%d.%m.%Y",
    "%d.%m.%y",
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%m/%d/%Y",
];

/// Characters trimmed off token edges before a parse attempt.
const TOKEN_TRIM: &[char] = &['.', ',', ';', ':', '(', ')', '[', ']', '"', '\''];

fn parse_exact(text: &str) -> Option<NaiveDateTime> {
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(truncate_seconds(parsed));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(text, fmt) {
            return parsed.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Drops sub-second components; the pipeline's index is second-granularity.
pub fn truncate_seconds(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// Parses a date out of arbitrary text. The whole (trimmed) string is tried
/// first, then adjacent token pairs (for split date + time), then single
/// tokens. Returns `None` when nothing in the text looks like a date.
pub fn parse_fuzzy_datetime(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(parsed) = parse_exact(trimmed) {
        return Some(parsed);
    }

    let tokens: Vec<&str> = trimmed
        .split_whitespace()
        .map(|token| token.trim_matches(TOKEN_TRIM))
        .filter(|token| !token.is_empty())
        .collect();
    for i in 0..tokens.len() {
        if i + 1 < tokens.len() {
            let pair = format!("{} {}", tokens[i], tokens[i + 1]);
            if let Some(parsed) = parse_exact(&pair) {
                return Some(parsed);
            }
        }
        if let Some(parsed) = parse_exact(tokens[i]) {
            return Some(parsed);
        }
    }
    None
}

/// Promotes the named column to the table's timestamp index, consuming it.
///
/// Missing cells and unparseable text both become missing index entries; a
/// per-cell failure never aborts the run. Rows keep their original order;
/// sorting by the new index is the caller's call.
pub fn normalize(table: &mut CleanTable, date_column: &str) -> Result<(), PipelineError> {
    let cells = table
        .column(date_column)
        .ok_or_else(|| PipelineError::ColumnNotFound(date_column.to_string()))?;

    let index: Vec<Option<NaiveDateTime>> = cells
        .iter()
        .map(|cell| match cell {
            Cell::Missing => None,
            Cell::DateTime(dt) => Some(truncate_seconds(*dt)),
            other => parse_fuzzy_datetime(&other.as_display()),
        })
        .collect();

    let missing = index.iter().filter(|slot| slot.is_none()).count();
    info!(
        "Indexed table by '{date_column}' ({missing} of {} entries missing)",
        index.len()
    );
    table.set_index(index);
    table.remove_column(date_column)?;
    Ok(())
}
