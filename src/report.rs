//! Probe report: the classifier's findings serialized to JSON.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// How the product column was chosen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProductDetection {
    /// Content-based: enough keyword hits in the sample.
    Keywords,
    /// Positional fallback to the conventional third column.
    Positional,
    /// Decoded from the legacy composite `product` tuple column.
    Composite,
    /// Named explicitly by the caller.
    Specified,
    /// Nothing qualified.
    Undetected,
}

/// Column roles established by sampling. Detection can mis-tag adversarial
/// data; these are the pipeline's working assumptions, not guarantees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnRoles {
    pub date_column: Option<String>,
    pub product_column: Option<String>,
    pub product_detection: ProductDetection,
    pub numeric_columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeReport {
    pub columns: Vec<String>,
    pub data_rows: usize,
    pub roles: ColumnRoles,
}

impl ProbeReport {
    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Creating report file {path:?}"))?;
        serde_json::to_writer_pretty(file, self).context("Writing report JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening report file {path:?}"))?;
        let reader = BufReader::new(file);
        let report = serde_json::from_reader(reader).context("Parsing report JSON")?;
        Ok(report)
    }
}
