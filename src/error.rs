//! Structural errors the pipeline can surface to callers.

use thiserror::Error;

/// Failures that make an export unusable as tabular data. Value-level
/// problems (unparseable dates, junk numbers) are not errors; they degrade
/// to missing values instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No row had enough populated cells to qualify as the header.
    #[error("no header row found: no row has at least {min_filled} populated cells past the first")]
    HeaderNotFound { min_filled: usize },

    /// A caller named a column the reconciled table does not have.
    #[error("column '{0}' not found in the reconciled table")]
    ColumnNotFound(String),

    /// A ZIP archive was given but held nothing to parse.
    #[error("no CSV entry found in archive {0}")]
    NoCsvEntry(String),
}
