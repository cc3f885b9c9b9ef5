use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Normalize raw sales exports into clean tables", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full normalization pipeline and write a clean CSV
    Normalize(NormalizeArgs),
    /// Locate the header and report detected column roles as JSON
    Probe(ProbeArgs),
    /// Normalize and display the first rows as a formatted table
    Preview(PreviewArgs),
}

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// Input export file (.csv, or .zip containing one)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Use this column as the date axis instead of detecting one
    #[arg(long = "date-column")]
    pub date_column: Option<String>,
    /// Use this column as the product descriptor instead of detecting one
    #[arg(long = "product-column")]
    pub product_column: Option<String>,
    /// Derive year/month/quarter columns from the date index
    #[arg(long)]
    pub calendar: bool,
    /// Sort rows ascending by the date index (missing timestamps last)
    #[arg(long = "sort-index")]
    pub sort_index: bool,
    /// Keep only the first N data rows
    #[arg(long)]
    pub limit: Option<usize>,
    /// Field delimiter (supports ';', ',', 'tab', '|'; defaults to ';')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to windows-1251)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Character encoding for the output file/stdout (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
    /// Render output as a fixed-width table to stdout
    #[arg(long)]
    pub table: bool,
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Input export file (.csv, or .zip containing one)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Destination report JSON path
    #[arg(short = 'r', long = "report")]
    pub report: PathBuf,
    /// Field delimiter (supports ';', ',', 'tab', '|'; defaults to ';')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to windows-1251)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input export file (.csv, or .zip containing one)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Field delimiter (supports ';', ',', 'tab', '|'; defaults to ';')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to windows-1251)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        ";" | "semicolon" => Ok(b';'),
        "," | "comma" => Ok(b','),
        "tab" | "\t" => Ok(b'\t'),
        "|" | "pipe" => Ok(b'|'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
