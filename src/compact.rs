//! Memory-compacting table encoding.
//!
//! The final pipeline stage re-encodes columns without changing any
//! observable value: low-cardinality text becomes dictionary-coded, integers
//! narrow to the smallest width that holds their range, and floats drop to
//! `f32` only when every value round-trips exactly. [`CompactTable::value`]
//! answers with the same [`Cell`] the source table held, so comparison and
//! equality semantics downstream are untouched.

use chrono::NaiveDateTime;
use itertools::Itertools;
use log::debug;

use crate::table::{Cell, CleanTable};

/// A text column is dictionary-coded when its distinct-value count is below
/// this fraction of the row count.
pub const CATEGORICAL_MAX_DISTINCT_RATIO: f64 = 0.5;

#[derive(Debug, Clone)]
pub enum CompactColumn {
    /// Mixed or already-minimal columns pass through unchanged.
    Cells(Vec<Cell>),
    Text(Vec<Option<String>>),
    Categorical {
        dict: Vec<String>,
        codes: Vec<Option<u32>>,
    },
    Int8(Vec<Option<i8>>),
    Int16(Vec<Option<i16>>),
    Int32(Vec<Option<i32>>),
    Int64(Vec<Option<i64>>),
    Float32(Vec<Option<f32>>),
    Float64(Vec<Option<f64>>),
    DateTime(Vec<Option<NaiveDateTime>>),
}

impl CompactColumn {
    pub fn len(&self) -> usize {
        match self {
            CompactColumn::Cells(v) => v.len(),
            CompactColumn::Text(v) => v.len(),
            CompactColumn::Categorical { codes, .. } => codes.len(),
            CompactColumn::Int8(v) => v.len(),
            CompactColumn::Int16(v) => v.len(),
            CompactColumn::Int32(v) => v.len(),
            CompactColumn::Int64(v) => v.len(),
            CompactColumn::Float32(v) => v.len(),
            CompactColumn::Float64(v) => v.len(),
            CompactColumn::DateTime(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reconstructs the logical cell at `row`.
    pub fn value(&self, row: usize) -> Cell {
        match self {
            CompactColumn::Cells(v) => v[row].clone(),
            CompactColumn::Text(v) => match &v[row] {
                Some(s) => Cell::Str(s.clone()),
                None => Cell::Missing,
            },
            CompactColumn::Categorical { dict, codes } => match codes[row] {
                Some(code) => Cell::Str(dict[code as usize].clone()),
                None => Cell::Missing,
            },
            CompactColumn::Int8(v) => v[row].map_or(Cell::Missing, |i| Cell::Int(i as i64)),
            CompactColumn::Int16(v) => v[row].map_or(Cell::Missing, |i| Cell::Int(i as i64)),
            CompactColumn::Int32(v) => v[row].map_or(Cell::Missing, |i| Cell::Int(i as i64)),
            CompactColumn::Int64(v) => v[row].map_or(Cell::Missing, Cell::Int),
            CompactColumn::Float32(v) => v[row].map_or(Cell::Missing, |f| Cell::Float(f as f64)),
            CompactColumn::Float64(v) => v[row].map_or(Cell::Missing, Cell::Float),
            CompactColumn::DateTime(v) => v[row].map_or(Cell::Missing, Cell::DateTime),
        }
    }
}

/// The pipeline's end product: same names, rows, index, and logical values as
/// the [`CleanTable`] it came from, in a narrower encoding.
#[derive(Debug, Clone)]
pub struct CompactTable {
    names: Vec<String>,
    columns: Vec<CompactColumn>,
    index: Option<Vec<Option<NaiveDateTime>>>,
}

impl CompactTable {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(CompactColumn::len).unwrap_or(0)
    }

    pub fn column_at(&self, idx: usize) -> &CompactColumn {
        &self.columns[idx]
    }

    pub fn index(&self) -> Option<&[Option<NaiveDateTime>]> {
        self.index.as_deref()
    }

    /// Logical cell at (`row`, `col`), identical to the source table's.
    pub fn value(&self, row: usize, col: usize) -> Cell {
        self.columns[col].value(row)
    }

    /// Clones row `row` across all columns.
    pub fn row(&self, row: usize) -> Vec<Cell> {
        self.columns.iter().map(|col| col.value(row)).collect()
    }
}

/// Re-encodes a table for memory. Consumes the input; the result is the
/// pipeline's final, analysis-ready form.
pub fn compact(mut table: CleanTable) -> CompactTable {
    let row_count = table.row_count();
    let index = table.take_index();
    let names = table.names().to_vec();
    let columns = (0..names.len())
        .map(|idx| {
            let column = compact_column(table.column_at(idx), row_count);
            debug!("Column '{}' encoded as {}", names[idx], variant_name(&column));
            column
        })
        .collect();
    CompactTable {
        names,
        columns,
        index,
    }
}

fn variant_name(column: &CompactColumn) -> &'static str {
    match column {
        CompactColumn::Cells(_) => "cells",
        CompactColumn::Text(_) => "text",
        CompactColumn::Categorical { .. } => "categorical",
        CompactColumn::Int8(_) => "int8",
        CompactColumn::Int16(_) => "int16",
        CompactColumn::Int32(_) => "int32",
        CompactColumn::Int64(_) => "int64",
        CompactColumn::Float32(_) => "float32",
        CompactColumn::Float64(_) => "float64",
        CompactColumn::DateTime(_) => "datetime",
    }
}

fn compact_column(cells: &[Cell], row_count: usize) -> CompactColumn {
    let non_missing: Vec<&Cell> = cells.iter().filter(|c| !c.is_missing()).collect();
    if non_missing.is_empty() {
        return CompactColumn::Cells(cells.to_vec());
    }

    if non_missing.iter().all(|c| matches!(c, Cell::Str(_))) {
        return compact_text(cells, row_count);
    }
    if non_missing.iter().all(|c| matches!(c, Cell::Int(_))) {
        return compact_ints(cells);
    }
    if non_missing.iter().all(|c| matches!(c, Cell::Float(_))) {
        return compact_floats(cells);
    }
    if non_missing.iter().all(|c| matches!(c, Cell::DateTime(_))) {
        let values = cells
            .iter()
            .map(|c| match c {
                Cell::DateTime(dt) => Some(*dt),
                _ => None,
            })
            .collect();
        return CompactColumn::DateTime(values);
    }
    CompactColumn::Cells(cells.to_vec())
}

fn compact_text(cells: &[Cell], row_count: usize) -> CompactColumn {
    let values: Vec<Option<String>> = cells
        .iter()
        .map(|c| match c {
            Cell::Str(s) => Some(s.clone()),
            _ => None,
        })
        .collect();

    let distinct = values.iter().flatten().unique().count();
    if (distinct as f64) < row_count as f64 * CATEGORICAL_MAX_DISTINCT_RATIO {
        let mut dict: Vec<String> = Vec::with_capacity(distinct);
        let codes = values
            .iter()
            .map(|value| {
                value.as_ref().map(|s| {
                    match dict.iter().position(|d| d == s) {
                        Some(pos) => pos as u32,
                        None => {
                            dict.push(s.clone());
                            (dict.len() - 1) as u32
                        }
                    }
                })
            })
            .collect();
        CompactColumn::Categorical { dict, codes }
    } else {
        CompactColumn::Text(values)
    }
}

fn compact_ints(cells: &[Cell]) -> CompactColumn {
    let values: Vec<Option<i64>> = cells
        .iter()
        .map(|c| match c {
            Cell::Int(i) => Some(*i),
            _ => None,
        })
        .collect();
    let present = values.iter().flatten();
    let (min, max) = match present.minmax().into_option() {
        Some((min, max)) => (*min, *max),
        None => return CompactColumn::Int64(values),
    };
    if i8::try_from(min).is_ok() && i8::try_from(max).is_ok() {
        CompactColumn::Int8(values.iter().map(|v| v.map(|i| i as i8)).collect())
    } else if i16::try_from(min).is_ok() && i16::try_from(max).is_ok() {
        CompactColumn::Int16(values.iter().map(|v| v.map(|i| i as i16)).collect())
    } else if i32::try_from(min).is_ok() && i32::try_from(max).is_ok() {
        CompactColumn::Int32(values.iter().map(|v| v.map(|i| i as i32)).collect())
    } else {
        CompactColumn::Int64(values)
    }
}

fn compact_floats(cells: &[Cell]) -> CompactColumn {
    let values: Vec<Option<f64>> = cells
        .iter()
        .map(|c| match c {
            Cell::Float(f) => Some(*f),
            _ => None,
        })
        .collect();
    // Narrow only when exact: f32 rounding would change observable values.
    let lossless = values
        .iter()
        .flatten()
        .all(|&f| (f as f32) as f64 == f || f.is_nan());
    if lossless {
        CompactColumn::Float32(values.iter().map(|v| v.map(|f| f as f32)).collect())
    } else {
        CompactColumn::Float64(values)
    }
}
