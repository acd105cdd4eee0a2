//! Asset-class listing command.

use super::{init_logging, OutputFormat};
use anyhow::{Context, Result};
use clap::Parser;
use fixedledger_core::AssetClassTable;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// List the asset-class table.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON file with the class table (defaults to the built-in table)
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, short = 'F', value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Show debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Load a class table from a JSON file.
pub fn load_classes(path: &Path) -> Result<AssetClassTable> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    AssetClassTable::from_json_str(&json)
        .with_context(|| format!("invalid class table in {}", path.display()))
}

/// Run the command, writing to `out`.
pub fn run(args: &Args, out: &mut impl Write) -> Result<ExitCode> {
    let table = match &args.file {
        Some(path) => load_classes(path)?,
        None => AssetClassTable::builtin(),
    };

    match args.format {
        OutputFormat::Text => {
            writeln!(
                out,
                "{:<24} {:<16} {:>6} {:<12} {:>8}  method",
                "category", "subcategory", "life", "cadence", "salvage"
            )?;
            for class in table.classes() {
                writeln!(
                    out,
                    "{:<24} {:<16} {:>6} {:<12} {:>7}%  {}",
                    class.category,
                    class.subcategory.as_deref().unwrap_or("-"),
                    class.default_life_periods,
                    class.default_cadence,
                    (class.default_salvage_rate * rust_decimal::Decimal::ONE_HUNDRED).normalize(),
                    class.default_method.label()
                )?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, table.classes())?;
            writeln!(out)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Main entry point for the classes command.
pub fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let stdout = io::stdout();
    match run(&args, &mut stdout.lock()) {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
