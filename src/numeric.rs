//! Locale-formatted numeric normalization.
//!
//! Export numbers arrive as text with space-grouped thousands and a comma
//! decimal separator ("1 234,56"). A column is converted only when every
//! sampled value parses after the transform; mixed columns are left exactly
//! as they were. Conversion is whole-column and rounds to two decimals.

use log::info;

use crate::{
    classify::SAMPLE_LIMIT,
    table::{Cell, CleanTable},
};

/// Strips internal whitespace (including non-breaking spaces) and replaces
/// the comma decimal separator with a period.
fn normalize_numeric_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect()
}

/// Attempts to read a cell as a locale-formatted number. Already-numeric
/// cells pass through; text goes through the separator transform first.
pub fn parse_locale_float(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Int(i) => Some(*i as f64),
        Cell::Float(f) => Some(*f),
        Cell::Str(s) => normalize_numeric_text(s).parse().ok(),
        Cell::DateTime(_) | Cell::Missing => None,
    }
}

fn is_numeric_like(cells: &[Cell]) -> bool {
    let sample: Vec<&Cell> = cells
        .iter()
        .filter(|cell| !cell.is_missing())
        .take(SAMPLE_LIMIT)
        .collect();
    !sample.is_empty() && sample.iter().all(|cell| parse_locale_float(cell).is_some())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Names of the columns whose sampled values all parse as locale-formatted
/// numbers. Detection only; nothing is mutated.
pub fn detect(table: &CleanTable) -> Vec<String> {
    (0..table.column_count())
        .filter(|&idx| is_numeric_like(table.column_at(idx)))
        .map(|idx| table.names()[idx].clone())
        .collect()
}

/// Converts every numeric-like column to floats rounded to two decimals and
/// returns the names of the converted columns. Cells outside the sample that
/// still fail to parse degrade to missing rather than aborting the column.
pub fn normalize(table: &mut CleanTable) -> Vec<String> {
    let numeric: Vec<usize> = (0..table.column_count())
        .filter(|&idx| is_numeric_like(table.column_at(idx)))
        .collect();

    let mut converted = Vec::with_capacity(numeric.len());
    for idx in numeric {
        for cell in table.column_at_mut(idx) {
            if cell.is_missing() {
                continue;
            }
            *cell = match parse_locale_float(cell) {
                Some(value) => Cell::Float(round2(value)),
                None => Cell::Missing,
            };
        }
        converted.push(table.names()[idx].clone());
    }
    if !converted.is_empty() {
        info!("Normalized numeric column(s): {}", converted.join(", "));
    }
    converted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_float_handles_grouped_thousands_and_comma_decimals() {
        assert_eq!(
            parse_locale_float(&Cell::Str("1 234,56".into())),
            Some(1234.56)
        );
        assert_eq!(
            parse_locale_float(&Cell::Str("12\u{a0}345".into())),
            Some(12345.0)
        );
        assert_eq!(parse_locale_float(&Cell::Str("труба".into())), None);
        assert_eq!(parse_locale_float(&Cell::Int(7)), Some(7.0));
    }

    #[test]
    fn rounding_is_two_decimal_places() {
        assert_eq!(round2(1234.567), 1234.57);
        assert_eq!(round2(10.0), 10.0);
    }
}
