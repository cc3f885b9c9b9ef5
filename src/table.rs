//! In-memory tabular data model shared by every pipeline stage.
//!
//! Two shapes exist: [`RawTable`], a row-major grid of untyped cells straight
//! out of the file decoder (no column identity, ragged rows allowed), and
//! [`CleanTable`], a column-major table with unique column names, equal-length
//! columns, and an optional timestamp row index. Each pipeline stage takes
//! exclusive ownership of the table it receives and hands it (possibly
//! mutated in place) to the next stage.

use std::fmt;

use chrono::NaiveDateTime;

use crate::error::PipelineError;

/// A single untyped-ish cell. The file decoder types cells on read (empty
/// field becomes `Missing`, integer-looking text becomes `Int`, and so on);
/// later stages refine them further.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Str(String),
    Int(i64),
    Float(f64),
    DateTime(NaiveDateTime),
    Missing,
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Text rendition used for classification and output. `Missing` renders
    /// as the empty string; integral floats drop their fraction.
    pub fn as_display(&self) -> String {
        match self {
            Cell::Str(s) => s.clone(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => {
                if f.fract() == 0.0 && f.is_finite() {
                    // The cast saturates beyond i64 range; format instead.
                    if f.abs() < i64::MAX as f64 {
                        (*f as i64).to_string()
                    } else {
                        format!("{f:.0}")
                    }
                } else {
                    f.to_string()
                }
            }
            Cell::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Cell::Missing => String::new(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Row-major grid produced by the file decoder. Rows may be ragged; column
/// identity does not exist yet.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Widest row in the grid; the header reconciler pads every data row out
    /// to this width.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Column-major table with named columns of equal length and an optional
/// row-aligned timestamp index.
#[derive(Debug, Clone, Default)]
pub struct CleanTable {
    names: Vec<String>,
    columns: Vec<Vec<Cell>>,
    index: Option<Vec<Option<NaiveDateTime>>>,
}

impl CleanTable {
    pub fn new(names: Vec<String>, columns: Vec<Vec<Cell>>) -> Self {
        debug_assert_eq!(names.len(), columns.len());
        Self {
            names,
            columns,
            index: None,
        }
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(Vec::len).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Cell]> {
        self.column_index(name)
            .map(|idx| self.columns[idx].as_slice())
    }

    pub fn column_at(&self, idx: usize) -> &[Cell] {
        &self.columns[idx]
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Vec<Cell>> {
        let idx = self.column_index(name)?;
        Some(&mut self.columns[idx])
    }

    pub fn column_at_mut(&mut self, idx: usize) -> &mut Vec<Cell> {
        &mut self.columns[idx]
    }

    /// Appends a new column. The caller is responsible for the cells being
    /// row-aligned with the existing columns.
    pub fn push_column(&mut self, name: impl Into<String>, cells: Vec<Cell>) {
        debug_assert!(self.columns.is_empty() || cells.len() == self.row_count());
        self.names.push(name.into());
        self.columns.push(cells);
    }

    /// Removes a column and returns its cells, or `ColumnNotFound`.
    pub fn remove_column(&mut self, name: &str) -> Result<Vec<Cell>, PipelineError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| PipelineError::ColumnNotFound(name.to_string()))?;
        self.names.remove(idx);
        Ok(self.columns.remove(idx))
    }

    pub fn index(&self) -> Option<&[Option<NaiveDateTime>]> {
        self.index.as_deref()
    }

    pub fn set_index(&mut self, index: Vec<Option<NaiveDateTime>>) {
        debug_assert_eq!(index.len(), self.row_count());
        self.index = Some(index);
    }

    pub fn take_index(&mut self) -> Option<Vec<Option<NaiveDateTime>>> {
        self.index.take()
    }

    /// Clones row `row` across all columns, in column order.
    pub fn row(&self, row: usize) -> Vec<Cell> {
        self.columns.iter().map(|col| col[row].clone()).collect()
    }

    /// Keeps only the first `limit` rows of every column and the index.
    pub fn truncate_rows(&mut self, limit: usize) {
        for column in &mut self.columns {
            column.truncate(limit);
        }
        if let Some(index) = &mut self.index {
            index.truncate(limit);
        }
    }

    /// Reorders all columns and the index by the given row permutation.
    pub fn reorder_rows(&mut self, order: &[usize]) {
        debug_assert_eq!(order.len(), self.row_count());
        for column in &mut self.columns {
            let reordered = order.iter().map(|&i| column[i].clone()).collect();
            *column = reordered;
        }
        if let Some(index) = &mut self.index {
            let reordered = order.iter().map(|&i| index[i]).collect();
            *index = reordered;
        }
    }
}
