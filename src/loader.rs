//! File decoding for raw sales exports.
//!
//! Exports arrive as semicolon-delimited text in Windows-1251, sometimes
//! wrapped in a ZIP archive. This module turns such a file into a
//! [`RawTable`] before the pipeline proper runs: archive extraction, charset
//! decoding, field typing (empty/integer/float/text), and decoding of the
//! legacy composite `product` tuple column. All I/O happens here, once per
//! file; the pipeline stages themselves never touch the filesystem.

use std::{fs::File, io::Read, path::Path};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1251};
use log::{debug, info};
use zip::ZipArchive;

use crate::{
    error::PipelineError,
    table::{Cell, CleanTable, RawTable},
};

/// Sales exports are semicolon-delimited unless told otherwise.
pub const DEFAULT_EXPORT_DELIMITER: u8 = b';';

/// Name of the legacy composite column carrying `('<type>', '<spec>')` text.
pub const PRODUCT_TUPLE_COLUMN: &str = "product";

/// Resolves an input encoding label, defaulting to Windows-1251.
pub fn resolve_input_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'")),
        None => Ok(WINDOWS_1251),
    }
}

/// Resolves an output encoding label, defaulting to UTF-8.
pub fn resolve_output_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'")),
        None => Ok(UTF_8),
    }
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

/// Reads a plain CSV file or the first CSV entry of a ZIP archive into a
/// [`RawTable`]. An archive without any `.csv` entry is an error, never a
/// silent empty table.
pub fn load_raw_table(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<RawTable> {
    let is_zip = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
    let bytes = if is_zip {
        extract_first_csv(path)?
    } else {
        std::fs::read(path).with_context(|| format!("Reading input file {path:?}"))?
    };
    let table = parse_export_bytes(&bytes, delimiter, encoding)?;
    info!(
        "Decoded {} row(s) ({} encoding) from '{}'",
        table.row_count(),
        encoding.name(),
        path.display()
    );
    Ok(table)
}

fn extract_first_csv(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).with_context(|| format!("Opening archive {path:?}"))?;
    let mut archive =
        ZipArchive::new(file).with_context(|| format!("Reading ZIP archive {path:?}"))?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if !entry.name().to_lowercase().ends_with(".csv") {
            continue;
        }
        debug!("Using archive entry '{}'", entry.name());
        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut buf)?;
        return Ok(buf);
    }
    Err(PipelineError::NoCsvEntry(path.display().to_string()).into())
}

/// Parses delimiter-separated bytes into typed cells. The reader is headerless
/// and flexible: header discovery is the pipeline's job, and exports routinely
/// carry short title rows above the real header.
fn parse_export_bytes(
    bytes: &[u8],
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    let mut record = csv::ByteRecord::new();
    while reader
        .read_byte_record(&mut record)
        .context("Reading CSV record")?
    {
        let row = record
            .iter()
            .map(|field| Ok(type_field(&decode_bytes(field, encoding)?)))
            .collect::<Result<Vec<Cell>>>()?;
        rows.push(row);
    }
    Ok(RawTable::from_rows(rows))
}

/// Types a decoded field: empty becomes `Missing`, integer text `Int`, float
/// text `Float`, everything else stays `Str`.
pub fn type_field(text: &str) -> Cell {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Cell::Missing;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Cell::Int(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return Cell::Float(f);
    }
    Cell::Str(text.to_string())
}

/// Parses the textual 2-tuple form `('Труба', '40x20x1.5')` into its parts.
/// Only the two quoted segments matter; quoting may use `'` or `"`.
pub fn parse_product_tuple(text: &str) -> Option<(String, String)> {
    let inner = text.trim().strip_prefix('(')?.strip_suffix(')')?;
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for ch in inner.chars() {
        match quote {
            Some(q) if ch == q => {
                quote = None;
                parts.push(std::mem::take(&mut current));
            }
            Some(_) => current.push(ch),
            None if ch == '\'' || ch == '"' => quote = Some(ch),
            None => {}
        }
    }
    if quote.is_some() || parts.len() != 2 {
        return None;
    }
    let mut parts = parts.into_iter();
    Some((parts.next().unwrap(), parts.next().unwrap()))
}

/// Decodes a legacy composite `product` column, if present, into
/// `product_type` / `product_spec` columns ahead of classification. Returns
/// whether a decode happened. Cells that fail to parse as tuples degrade to
/// missing in both derived columns.
pub fn decode_product_tuples(table: &mut CleanTable) -> bool {
    let Some(cells) = table.column(PRODUCT_TUPLE_COLUMN) else {
        return false;
    };
    let looks_composite = cells
        .iter()
        .filter(|cell| !cell.is_missing())
        .take(10)
        .any(|cell| parse_product_tuple(&cell.as_display()).is_some());
    if !looks_composite {
        return false;
    }

    let mut types = Vec::with_capacity(cells.len());
    let mut specs = Vec::with_capacity(cells.len());
    for cell in cells {
        match parse_product_tuple(&cell.as_display()) {
            Some((ty, spec)) => {
                types.push(Cell::Str(ty));
                specs.push(Cell::Str(spec));
            }
            None => {
                types.push(Cell::Missing);
                specs.push(Cell::Missing);
            }
        }
    }
    table.push_column(crate::product::PRODUCT_TYPE_COLUMN, types);
    table.push_column(crate::product::PRODUCT_SPEC_COLUMN, specs);
    info!("Decoded composite '{PRODUCT_TUPLE_COLUMN}' column into type/spec pair");
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_field_distinguishes_numbers_and_text() {
        assert_eq!(type_field(""), Cell::Missing);
        assert_eq!(type_field("  "), Cell::Missing);
        assert_eq!(type_field("42"), Cell::Int(42));
        assert_eq!(type_field("3.5"), Cell::Float(3.5));
        assert_eq!(type_field("Труба"), Cell::Str("Труба".to_string()));
    }

    #[test]
    fn product_tuple_parses_quoted_pairs() {
        assert_eq!(
            parse_product_tuple("('Труба', '40x20x1.5')"),
            Some(("Труба".to_string(), "40x20x1.5".to_string()))
        );
        assert_eq!(
            parse_product_tuple("(\"Лист\", \"3мм\")"),
            Some(("Лист".to_string(), "3мм".to_string()))
        );
        assert_eq!(parse_product_tuple("('solo')"), None);
        assert_eq!(parse_product_tuple("not a tuple"), None);
        assert_eq!(parse_product_tuple("('unterminated, 'x')"), None);
    }
}
