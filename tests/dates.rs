mod common;

use chrono::{NaiveDate, NaiveDateTime};
use salesprep::dates::{normalize, parse_fuzzy_datetime};
use salesprep::error::PipelineError;
use salesprep::table::{Cell, CleanTable};

fn s(text: &str) -> Cell {
    Cell::Str(text.to_string())
}

fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[test]
fn unparseable_and_missing_cells_coerce_to_missing_timestamps() {
    let mut table = CleanTable::new(
        vec!["Дата".into(), "Сумма".into()],
        vec![
            vec![s("15.03.2023"), s("not a date"), Cell::Missing],
            vec![Cell::Float(1.0), Cell::Float(2.0), Cell::Float(3.0)],
        ],
    );
    normalize(&mut table, "Дата").expect("date column exists");

    assert_eq!(
        table.index().unwrap(),
        &[Some(midnight(2023, 3, 15)), None, None]
    );
    // The source column is consumed; remaining columns keep their order.
    assert_eq!(table.names(), &["Сумма".to_string()]);
    assert_eq!(table.row_count(), 3);
}

#[test]
fn a_missing_date_column_is_a_structural_error() {
    let mut table = CleanTable::new(vec!["Сумма".into()], vec![vec![Cell::Float(1.0)]]);
    let err = normalize(&mut table, "Дата").unwrap_err();
    assert!(matches!(err, PipelineError::ColumnNotFound(name) if name == "Дата"));
}

#[test]
fn row_order_is_preserved_not_sorted() {
    let mut table = CleanTable::new(
        vec!["Дата".into()],
        vec![vec![s("20.03.2023"), s("15.03.2023"), s("18.03.2023")]],
    );
    normalize(&mut table, "Дата").expect("date column exists");
    assert_eq!(
        table.index().unwrap(),
        &[
            Some(midnight(2023, 3, 20)),
            Some(midnight(2023, 3, 15)),
            Some(midnight(2023, 3, 18)),
        ]
    );
}

#[test]
fn timestamps_are_truncated_to_whole_seconds() {
    let mut table = CleanTable::new(
        vec!["Дата".into()],
        vec![vec![s("2023-03-15T10:30:45.999"), s("15.03.2023 10:30:45")]],
    );
    normalize(&mut table, "Дата").expect("date column exists");
    let expected = NaiveDate::from_ymd_opt(2023, 3, 15)
        .unwrap()
        .and_hms_opt(10, 30, 45)
        .unwrap();
    assert_eq!(table.index().unwrap(), &[Some(expected), Some(expected)]);
}

#[test]
fn fuzzy_parsing_survives_annotation_noise() {
    assert_eq!(
        parse_fuzzy_datetime("счет от 15.03.2023, оплачен"),
        Some(midnight(2023, 3, 15))
    );
    assert_eq!(parse_fuzzy_datetime("итого за период"), None);
}
