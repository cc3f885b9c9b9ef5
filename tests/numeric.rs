mod common;

use salesprep::numeric::{detect, normalize, parse_locale_float};
use salesprep::table::{Cell, CleanTable};

fn s(text: &str) -> Cell {
    Cell::Str(text.to_string())
}

#[test]
fn locale_formatted_text_round_trips_to_rounded_floats() {
    let mut table = CleanTable::new(
        vec!["Сумма".into()],
        vec![vec![s("1 234,56"), s("2 000,00"), s("987,654"), Cell::Missing]],
    );
    let converted = normalize(&mut table);
    assert_eq!(converted, vec!["Сумма".to_string()]);
    assert_eq!(
        table.column("Сумма").unwrap(),
        &[
            Cell::Float(1234.56),
            Cell::Float(2000.0),
            Cell::Float(987.65),
            Cell::Missing,
        ]
    );
}

#[test]
fn one_unparseable_sampled_value_leaves_the_column_untouched() {
    let original = vec![s("1 234,56"), s("труба"), s("10")];
    let mut table = CleanTable::new(vec!["mixed".into()], vec![original.clone()]);
    let converted = normalize(&mut table);
    assert!(converted.is_empty());
    assert_eq!(table.column("mixed").unwrap(), original.as_slice());
}

#[test]
fn failures_outside_the_sample_degrade_to_missing() {
    // Ten clean values fill the sample; the eleventh is junk and must not
    // abort the conversion.
    let mut cells: Vec<Cell> = (1..=10).map(|i| s(&format!("{i},50"))).collect();
    cells.push(s("мусор"));
    let mut table = CleanTable::new(vec!["Цена".into()], vec![cells]);
    let converted = normalize(&mut table);
    assert_eq!(converted, vec!["Цена".to_string()]);
    let column = table.column("Цена").unwrap();
    assert_eq!(column[0], Cell::Float(1.5));
    assert_eq!(column[9], Cell::Float(10.5));
    assert_eq!(column[10], Cell::Missing);
}

#[test]
fn already_numeric_columns_become_rounded_floats() {
    let mut table = CleanTable::new(
        vec!["qty".into()],
        vec![vec![Cell::Int(10), Cell::Float(3.333), Cell::Int(-2)]],
    );
    normalize(&mut table);
    assert_eq!(
        table.column("qty").unwrap(),
        &[Cell::Float(10.0), Cell::Float(3.33), Cell::Float(-2.0)]
    );
}

#[test]
fn detection_reports_without_mutating() {
    let table = CleanTable::new(
        vec!["Сумма".into(), "Менеджер".into()],
        vec![
            vec![s("1 234,56"), s("2,50")],
            vec![s("Иванов"), s("Петров")],
        ],
    );
    assert_eq!(detect(&table), vec!["Сумма".to_string()]);
    assert_eq!(table.column("Сумма").unwrap()[0], s("1 234,56"));
}

#[test]
fn all_missing_columns_are_not_numeric_like() {
    let mut table = CleanTable::new(
        vec!["empty".into()],
        vec![vec![Cell::Missing, Cell::Missing]],
    );
    assert!(normalize(&mut table).is_empty());
}

#[test]
fn locale_float_parses_spaces_and_commas() {
    assert_eq!(parse_locale_float(&s("12 345 678,90")), Some(12_345_678.90));
    assert_eq!(parse_locale_float(&s("-1,5")), Some(-1.5));
    assert_eq!(parse_locale_float(&s("1.234")), Some(1.234));
    assert_eq!(parse_locale_float(&Cell::Missing), None);
}
