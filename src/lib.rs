pub mod classify;
pub mod cli;
pub mod compact;
pub mod dates;
pub mod error;
pub mod header;
pub mod loader;
pub mod numeric;
pub mod pipeline;
pub mod product;
pub mod render;
pub mod report;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("salesprep", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Normalize(args) => pipeline::execute(&args),
        Commands::Probe(args) => handle_probe(&args),
        Commands::Preview(args) => pipeline::execute_preview(&args),
    }
}

fn handle_probe(args: &cli::ProbeArgs) -> Result<()> {
    let delimiter = args.delimiter.unwrap_or(loader::DEFAULT_EXPORT_DELIMITER);
    let encoding = loader::resolve_input_encoding(args.input_encoding.as_deref())?;
    info!(
        "Probing '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(delimiter)
    );
    let raw = loader::load_raw_table(&args.input, delimiter, encoding)
        .with_context(|| format!("Decoding {:?}", args.input))?;
    let report = pipeline::probe(raw).with_context(|| format!("Probing {:?}", args.input))?;
    report
        .save(&args.report)
        .with_context(|| format!("Writing report to {:?}", args.report))?;
    info!(
        "Probed {} data row(s) across {} column(s); report written to {:?}",
        report.data_rows,
        report.columns.len(),
        args.report
    );
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
