mod common;

use salesprep::classify::{
    PRODUCT_FALLBACK_INDEX, SAMPLE_LIMIT, detect_product_column, find_date_column,
};
use salesprep::table::{Cell, CleanTable};

fn s(text: &str) -> Cell {
    Cell::Str(text.to_string())
}

fn text_column(values: &[&str]) -> Vec<Cell> {
    values.iter().map(|v| s(v)).collect()
}

/// Ten sampled values, `good` of which parse as dates.
fn date_column_with(good: usize) -> Vec<Cell> {
    (0..SAMPLE_LIMIT)
        .map(|i| {
            if i < good {
                s(&format!("{:02}.03.2023", i + 1))
            } else {
                s("не дата")
            }
        })
        .collect()
}

#[test]
fn date_ratio_boundary_accepts_eight_of_ten_and_rejects_seven() {
    let accepted = CleanTable::new(vec!["Дата".into()], vec![date_column_with(8)]);
    assert_eq!(find_date_column(&accepted), Some("Дата".to_string()));

    let rejected = CleanTable::new(vec!["Дата".into()], vec![date_column_with(7)]);
    assert_eq!(find_date_column(&rejected), None);
}

#[test]
fn leftmost_qualifying_date_column_wins() {
    let table = CleanTable::new(
        vec!["first".into(), "second".into()],
        vec![date_column_with(10), date_column_with(10)],
    );
    assert_eq!(find_date_column(&table), Some("first".to_string()));
}

#[test]
fn date_sampling_skips_missing_cells() {
    // Two parseable values among many missing: ratio is 2/2, not 2/12.
    let mut cells = vec![Cell::Missing; 10];
    cells.push(s("15.03.2023"));
    cells.push(s("16.03.2023"));
    let table = CleanTable::new(vec!["Дата".into()], vec![cells]);
    assert_eq!(find_date_column(&table), Some("Дата".to_string()));
}

#[test]
fn numeric_and_text_columns_are_not_dates() {
    let table = CleanTable::new(
        vec!["qty".into(), "name".into()],
        vec![
            vec![Cell::Int(10), Cell::Int(20), Cell::Int(30)],
            text_column(&["труба", "лист", "круг"]),
        ],
    );
    assert_eq!(find_date_column(&table), None);
}

#[test]
fn product_column_found_by_keyword_content() {
    let table = CleanTable::new(
        vec!["id".into(), "desc".into()],
        vec![
            text_column(&["1", "2", "3", "4"]),
            text_column(&[
                "Труба Проф 40х20",
                "Лист 2мм",
                "Швеллер 10П",
                "прочее",
            ]),
        ],
    );
    let found = detect_product_column(&table).expect("detected");
    assert_eq!(found.index, 1);
    assert_eq!(found.name, "desc");
    assert!(found.by_keywords);
}

#[test]
fn fewer_than_three_matches_falls_back_to_third_column() {
    let table = CleanTable::new(
        vec!["a".into(), "b".into(), "c".into(), "d".into()],
        vec![
            text_column(&["x", "y", "z"]),
            text_column(&["Труба", "нет", "нет"]),
            text_column(&["p", "q", "r"]),
            text_column(&["u", "v", "w"]),
        ],
    );
    let found = detect_product_column(&table).expect("positional fallback");
    assert_eq!(found.index, PRODUCT_FALLBACK_INDEX);
    assert_eq!(found.name, "c");
    assert!(!found.by_keywords);
}

#[test]
fn narrow_tables_without_matches_detect_nothing() {
    let table = CleanTable::new(
        vec!["a".into(), "b".into()],
        vec![text_column(&["x", "y"]), text_column(&["p", "q"])],
    );
    assert_eq!(detect_product_column(&table), None);
}

#[test]
fn keyword_tie_keeps_the_leftmost_column() {
    let products = &["Труба 40", "Лист 2", "Круг 12"];
    let table = CleanTable::new(
        vec!["left".into(), "right".into()],
        vec![text_column(products), text_column(products)],
    );
    let found = detect_product_column(&table).expect("detected");
    assert_eq!(found.index, 0);
}
