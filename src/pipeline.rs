//! Pipeline composition and the `normalize`/`preview` command entry points.
//!
//! [`run`] is a pure function from a decoded [`RawTable`] to a
//! [`PipelineOutput`]; stages execute strictly in sequence (header
//! reconciliation, classification, numeric normalization, date indexing,
//! product decomposition, compaction), each owning the table until it
//! returns. Callers own persistence of the result; nothing here is shared or
//! retained between runs, so concurrent files are the caller's parallelism.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use chrono::Datelike;
use encoding_rs::Encoding;
use log::{info, warn};

use crate::{
    classify::{self, ProductMatch},
    cli::{NormalizeArgs, PreviewArgs},
    compact::{self, CompactTable},
    dates,
    error::PipelineError,
    header, loader, numeric, product, render,
    report::{ColumnRoles, ProbeReport, ProductDetection},
    table::{Cell, CleanTable, RawTable},
};

/// Timestamp format used for the index column in CSV output.
const INDEX_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Overrides date column detection.
    pub date_column: Option<String>,
    /// Overrides product column detection.
    pub product_column: Option<String>,
    /// Derive year/month/quarter columns from the date index.
    pub calendar: bool,
    /// Sort rows ascending by the date index (missing timestamps last).
    pub sort_index: bool,
    /// Keep only the first N data rows.
    pub limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: CompactTable,
    pub roles: ColumnRoles,
}

/// Runs the full pipeline over a decoded raw table.
pub fn run(raw: RawTable, options: &PipelineOptions) -> Result<PipelineOutput> {
    let mut table = header::reconcile(raw)?;
    let tuple_decoded = loader::decode_product_tuples(&mut table);

    let date_column = match &options.date_column {
        Some(name) => Some(name.clone()),
        None => classify::find_date_column(&table),
    };
    // A decoded composite column already yields the type/spec pair; running
    // the decomposer on top would duplicate the derived columns.
    let product_match = if tuple_decoded {
        if options.product_column.is_some() {
            warn!("Ignoring --product-column: composite 'product' column already decoded");
        }
        None
    } else {
        resolve_product_column(&table, options)?
    };

    let numeric_columns = numeric::normalize(&mut table);

    if let Some(name) = &date_column {
        dates::normalize(&mut table, name)?;
    } else {
        warn!("No date column detected; table keeps positional row order only");
    }

    if let Some(found) = &product_match {
        product::decompose(&mut table, &found.name)?;
    }

    if options.sort_index {
        sort_by_index(&mut table);
    }
    if options.calendar {
        derive_calendar(&mut table);
    }
    if let Some(limit) = options.limit {
        table.truncate_rows(limit);
    }

    let product_detection = if tuple_decoded {
        ProductDetection::Composite
    } else {
        match &product_match {
            Some(_) if options.product_column.is_some() => ProductDetection::Specified,
            Some(found) if found.by_keywords => ProductDetection::Keywords,
            Some(_) => ProductDetection::Positional,
            None => ProductDetection::Undetected,
        }
    };
    let roles = ColumnRoles {
        date_column,
        product_column: if tuple_decoded {
            Some(loader::PRODUCT_TUPLE_COLUMN.to_string())
        } else {
            product_match.map(|found| found.name)
        },
        product_detection,
        numeric_columns,
    };

    Ok(PipelineOutput {
        table: compact::compact(table),
        roles,
    })
}

/// Header reconciliation plus classification only; nothing is converted.
pub fn probe(raw: RawTable) -> Result<ProbeReport> {
    let mut table = header::reconcile(raw)?;
    let tuple_decoded = loader::decode_product_tuples(&mut table);

    let date_column = classify::find_date_column(&table);
    let (product_column, product_detection) = if tuple_decoded {
        (
            Some(loader::PRODUCT_TUPLE_COLUMN.to_string()),
            ProductDetection::Composite,
        )
    } else {
        match classify::detect_product_column(&table) {
            Some(found) if found.by_keywords => (Some(found.name), ProductDetection::Keywords),
            Some(found) => (Some(found.name), ProductDetection::Positional),
            None => (None, ProductDetection::Undetected),
        }
    };

    Ok(ProbeReport {
        columns: table.names().to_vec(),
        data_rows: table.row_count(),
        roles: ColumnRoles {
            date_column,
            product_column,
            product_detection,
            numeric_columns: numeric::detect(&table),
        },
    })
}

fn resolve_product_column(
    table: &CleanTable,
    options: &PipelineOptions,
) -> Result<Option<ProductMatch>> {
    match &options.product_column {
        Some(name) => {
            let index = table
                .column_index(name)
                .ok_or_else(|| PipelineError::ColumnNotFound(name.clone()))?;
            Ok(Some(ProductMatch {
                index,
                name: name.clone(),
                by_keywords: false,
            }))
        }
        None => Ok(classify::detect_product_column(table)),
    }
}

fn sort_by_index(table: &mut CleanTable) {
    let Some(index) = table.index() else {
        warn!("--sort-index requested but no date index exists");
        return;
    };
    let mut order: Vec<usize> = (0..index.len()).collect();
    order.sort_by_key(|&i| (index[i].is_none(), index[i]));
    table.reorder_rows(&order);
}

/// Appends year/month/quarter/year-month/year-quarter columns derived from
/// the date index; rows without a timestamp get missing components.
fn derive_calendar(table: &mut CleanTable) {
    let Some(index) = table.index() else {
        warn!("--calendar requested but no date index exists");
        return;
    };
    let index = index.to_vec();
    let rows = index.len();
    let mut years = Vec::with_capacity(rows);
    let mut months = Vec::with_capacity(rows);
    let mut quarters = Vec::with_capacity(rows);
    let mut year_months = Vec::with_capacity(rows);
    let mut year_quarters = Vec::with_capacity(rows);
    for slot in index {
        match slot {
            Some(dt) => {
                let quarter = (dt.month() - 1) / 3 + 1;
                years.push(Cell::Str(dt.year().to_string()));
                months.push(Cell::Int(dt.month() as i64));
                quarters.push(Cell::Int(quarter as i64));
                year_months.push(Cell::Str(dt.format("%Y-%m").to_string()));
                year_quarters.push(Cell::Str(format!("{}-Q{quarter}", dt.year())));
            }
            None => {
                years.push(Cell::Missing);
                months.push(Cell::Missing);
                quarters.push(Cell::Missing);
                year_months.push(Cell::Missing);
                year_quarters.push(Cell::Missing);
            }
        }
    }
    table.push_column("year", years);
    table.push_column("month", months);
    table.push_column("quarter", quarters);
    table.push_column("year_month", year_months);
    table.push_column("year_quarter", year_quarters);
}

/// Writes the normalized table as CSV, the date index first when present.
/// Fields are transcoded per the requested output encoding.
pub fn write_csv(
    output: &PipelineOutput,
    path: Option<&Path>,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<()> {
    let sink: Box<dyn Write> = match path {
        Some(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        None => Box::new(std::io::stdout()),
    };
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(sink);

    let (headers, rows) = tabulate(output, output.table.row_count());
    write_encoded_record(&mut writer, &headers, encoding)?;
    for row in &rows {
        write_encoded_record(&mut writer, row, encoding)?;
    }
    writer.flush().context("Flushing output writer")?;
    Ok(())
}

fn write_encoded_record<W: Write>(
    writer: &mut csv::Writer<W>,
    fields: &[String],
    encoding: &'static Encoding,
) -> Result<()> {
    let mut record = csv::ByteRecord::new();
    for field in fields {
        let (encoded, _, had_errors) = encoding.encode(field);
        if had_errors {
            anyhow::bail!("Failed to encode '{field}' using {}", encoding.name());
        }
        record.push_field(&encoded);
    }
    writer.write_byte_record(&record).context("Writing record")
}

/// Renders the table into header and row strings, index column included.
pub fn tabulate(output: &PipelineOutput, limit: usize) -> (Vec<String>, Vec<Vec<String>>) {
    let table = &output.table;
    let index = table.index();
    let mut headers = Vec::with_capacity(table.column_count() + 1);
    if index.is_some() {
        headers.push(
            output
                .roles
                .date_column
                .clone()
                .unwrap_or_else(|| "date".to_string()),
        );
    }
    headers.extend(table.names().iter().cloned());

    let rows = (0..table.row_count().min(limit))
        .map(|row| {
            let mut fields = Vec::with_capacity(headers.len());
            if let Some(index) = index {
                fields.push(
                    index[row]
                        .map(|dt| dt.format(INDEX_FORMAT).to_string())
                        .unwrap_or_default(),
                );
            }
            fields.extend(table.row(row).iter().map(Cell::as_display));
            fields
        })
        .collect();
    (headers, rows)
}

pub fn execute(args: &NormalizeArgs) -> Result<()> {
    let delimiter = args.delimiter.unwrap_or(loader::DEFAULT_EXPORT_DELIMITER);
    let input_encoding = loader::resolve_input_encoding(args.input_encoding.as_deref())?;
    let output_encoding = loader::resolve_output_encoding(args.output_encoding.as_deref())?;

    let raw = loader::load_raw_table(&args.input, delimiter, input_encoding)?;
    let options = PipelineOptions {
        date_column: args.date_column.clone(),
        product_column: args.product_column.clone(),
        calendar: args.calendar,
        sort_index: args.sort_index,
        limit: args.limit,
    };
    let output = run(raw, &options)?;

    if args.table && args.output.is_none() {
        let (headers, rows) = tabulate(&output, output.table.row_count());
        render::print_table(&headers, &rows);
    } else {
        write_csv(&output, args.output.as_deref(), delimiter, output_encoding)?;
    }
    info!(
        "Normalized {} row(s) across {} column(s) -> {}",
        output.table.row_count(),
        output.table.column_count(),
        args.output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdout".to_string())
    );
    Ok(())
}

pub fn execute_preview(args: &PreviewArgs) -> Result<()> {
    let delimiter = args.delimiter.unwrap_or(loader::DEFAULT_EXPORT_DELIMITER);
    let input_encoding = loader::resolve_input_encoding(args.input_encoding.as_deref())?;

    let raw = loader::load_raw_table(&args.input, delimiter, input_encoding)?;
    let output = run(raw, &PipelineOptions::default())?;
    let (headers, rows) = tabulate(&output, args.rows);
    render::print_table(&headers, &rows);
    Ok(())
}
