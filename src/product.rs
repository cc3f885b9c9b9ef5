//! Product description cleaning and decomposition.
//!
//! Free-text product cells ("Труба  Проф 40 x 20, 1,5 L=6") are first pushed
//! through an ordered sequence of rewrites and then split at the first digit
//! into a `(product_type, product_spec)` pair. The rewrite order matters:
//! decimal-comma normalization must run before comma stripping, and period
//! handling before the dimension-separator rewrite.

use log::info;

use crate::{
    error::PipelineError,
    table::{Cell, CleanTable},
};

pub const PRODUCT_TYPE_COLUMN: &str = "product_type";
pub const PRODUCT_SPEC_COLUMN: &str = "product_spec";

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rewrites a comma sitting between two digits into a period ("1,5" → "1.5").
fn normalize_decimal_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .map(|(i, &ch)| {
            if ch == ','
                && i > 0
                && chars[i - 1].is_ascii_digit()
                && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())
            {
                '.'
            } else {
                ch
            }
        })
        .collect()
}

/// Removes periods that touch no digit on either side (abbreviation dots).
fn strip_bare_periods(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .filter(|&(i, &ch)| {
            ch != '.'
                || (i > 0 && chars[i - 1].is_ascii_digit())
                || chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())
        })
        .map(|(_, &ch)| ch)
        .collect()
}

/// Turns a period that splits an abbreviation from an adjoining number
/// ("проф.40") into a space, so the digit run starts its own token.
fn split_abbreviation_periods(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .map(|(i, &ch)| {
            if ch == '.'
                && i > 0
                && !chars[i - 1].is_ascii_digit()
                && !chars[i - 1].is_whitespace()
                && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())
            {
                ' '
            } else {
                ch
            }
        })
        .collect()
}

/// Rewrites a Latin "x" or Cyrillic "х" strictly between two digits
/// (optionally space-padded) into "*": "40 x 20" → "40*20". Neighbouring
/// digits are not consumed, so chains like "2x3x4" rewrite fully.
fn star_dimension_separators(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if ch == 'x' || ch == 'х' {
            let left_digit = chars[..i]
                .iter()
                .rev()
                .find(|c| **c != ' ')
                .is_some_and(|c| c.is_ascii_digit());
            let right_start = (i + 1..chars.len())
                .find(|&j| chars[j] != ' ')
                .unwrap_or(chars.len());
            let right_digit = chars.get(right_start).is_some_and(|c| c.is_ascii_digit());
            if left_digit && right_digit {
                while out.ends_with(' ') {
                    out.pop();
                }
                out.push('*');
                i = right_start;
                continue;
            }
        }
        out.push(ch);
        i += 1;
    }
    out
}

/// Canonicalizes a raw product description. Missing/empty input yields the
/// empty string. Idempotent: running it on its own output changes nothing.
pub fn clean_product_name(text: &str) -> String {
    let lowered = text.to_lowercase();
    let collapsed = collapse_whitespace(lowered.trim());
    let decimals = normalize_decimal_commas(&collapsed);
    let unpunctuated: String = decimals.chars().filter(|c| *c != ',' && *c != ';').collect();
    let bare_stripped = strip_bare_periods(&unpunctuated);
    let split = split_abbreviation_periods(&bare_stripped);
    let starred = star_dimension_separators(&split);
    collapse_whitespace(&starred)
}

/// Splits a cleaned name at its first digit: everything before it (minus
/// trailing punctuation) is the product type, and the first
/// whitespace-delimited token from the digit onward is the spec. A name with
/// no digit is all type and has an empty spec.
pub fn extract_product_type_and_specs(cleaned: &str) -> (String, String) {
    let Some(byte_idx) = cleaned.find(|c: char| c.is_ascii_digit()) else {
        return (cleaned.to_string(), String::new());
    };
    let product_type = cleaned[..byte_idx]
        .trim_end_matches(['.', ',', ' '])
        .trim()
        .to_string();
    let spec = cleaned[byte_idx..]
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_string();
    (product_type, spec)
}

/// Decomposes the designated product column into two appended columns,
/// [`PRODUCT_TYPE_COLUMN`] and [`PRODUCT_SPEC_COLUMN`].
pub fn decompose(table: &mut CleanTable, column: &str) -> Result<(), PipelineError> {
    let cells = table
        .column(column)
        .ok_or_else(|| PipelineError::ColumnNotFound(column.to_string()))?;

    let mut types = Vec::with_capacity(cells.len());
    let mut specs = Vec::with_capacity(cells.len());
    for cell in cells {
        let cleaned = match cell {
            Cell::Missing => String::new(),
            other => clean_product_name(&other.as_display()),
        };
        let (product_type, spec) = extract_product_type_and_specs(&cleaned);
        types.push(Cell::Str(product_type));
        specs.push(Cell::Str(spec));
    }
    table.push_column(PRODUCT_TYPE_COLUMN, types);
    table.push_column(PRODUCT_SPEC_COLUMN, specs);
    info!("Decomposed product column '{column}' into type/spec pair");
    Ok(())
}
