//! Schedule preview command.
//!
//! Builds a single book from command-line flags and prints the schedule the
//! generator projects for it, without recording an asset.

use super::{init_logging, OutputFormat};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use fixedledger_core::{AssetBook, BookType, DepreciationMethod, PostingCadence};
use fixedledger_depreciation::ScheduleGenerator;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::{self, Write};
use std::process::ExitCode;

/// Preview a depreciation schedule.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Acquisition cost
    #[arg(long)]
    pub cost: Decimal,

    /// Salvage value
    #[arg(long, default_value = "0")]
    pub salvage: Decimal,

    /// Useful life in periods
    #[arg(long)]
    pub life: u32,

    /// Method: sl, db:<rate>, db-sl:<rate> or uop:<total units>
    #[arg(long, short, default_value = "sl")]
    pub method: DepreciationMethod,

    /// Planned units per period for units of production (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub usage: Vec<Decimal>,

    /// In-service date (YYYY-MM-DD)
    #[arg(long)]
    pub in_service: NaiveDate,

    /// Posting cadence: monthly, quarterly, semi-annual or annual
    #[arg(long, default_value = "monthly")]
    pub cadence: PostingCadence,

    /// Book type shown in the output
    #[arg(long, default_value = "statutory")]
    pub book: BookType,

    /// Output format (text or json)
    #[arg(long, short = 'f', value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Show debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Serialize)]
struct JsonSchedule<'a> {
    book: BookType,
    method: &'a DepreciationMethod,
    label: String,
    cadence: PostingCadence,
    total_depreciation: Decimal,
    entries: &'a [fixedledger_core::ScheduleEntry],
}

/// Build the book described by the arguments.
pub fn book_from_args(args: &Args) -> Result<AssetBook> {
    let mut method = args.method.clone();
    match &mut method {
        DepreciationMethod::UnitsOfProduction { usage, .. } => {
            anyhow::ensure!(
                !args.usage.is_empty(),
                "units of production needs --usage figures"
            );
            usage.clone_from(&args.usage);
        }
        _ => anyhow::ensure!(
            args.usage.is_empty(),
            "--usage only applies to units of production"
        ),
    }
    Ok(AssetBook::new(
        args.book,
        args.cost,
        args.salvage,
        args.life,
        method,
        args.in_service,
    )
    .with_cadence(args.cadence))
}

/// Run the command, writing to `out`.
pub fn run(args: &Args, out: &mut impl Write) -> Result<ExitCode> {
    let book = book_from_args(args)?;
    let schedule = ScheduleGenerator::default()
        .generate(&book)
        .with_context(|| format!("cannot build a schedule for the {} book", book.book_type))?;

    match args.format {
        OutputFormat::Text => {
            writeln!(
                out,
                "{} book, {}, {} × {}",
                book.book_type,
                book.method.label(),
                schedule.len(),
                book.cadence
            )?;
            writeln!(
                out,
                "cost {}  salvage {}  in service {}",
                book.acquisition_cost, book.salvage_value, book.in_service_date
            )?;
            writeln!(out)?;
            write!(out, "{schedule}")?;
            writeln!(out, "total {}", schedule.total_depreciation())?;
        }
        OutputFormat::Json => {
            let json = JsonSchedule {
                book: book.book_type,
                method: &book.method,
                label: book.method.label(),
                cadence: book.cadence,
                total_depreciation: schedule.total_depreciation(),
                entries: schedule.entries(),
            };
            serde_json::to_writer_pretty(&mut *out, &json)?;
            writeln!(out)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Main entry point for the schedule command.
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

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec![
            "fixedledger-schedule",
            "--cost",
            "12000",
            "--life",
            "4",
            "--in-service",
            "2024-01-01",
            "--cadence",
            "annual",
        ];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_usage_requires_units_method() {
        assert!(book_from_args(&args(&["--usage", "1,2"])).is_err());
        assert!(book_from_args(&args(&["--method", "uop:100"])).is_err());
        let book = book_from_args(&args(&["--method", "uop:100", "--usage", "50,50"])).unwrap();
        assert!(matches!(
            book.method,
            DepreciationMethod::UnitsOfProduction { ref usage, .. } if usage.len() == 2
        ));
    }

    #[test]
    fn test_text_output() {
        let mut out = Vec::new();
        run(&args(&[]), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Straight-line"));
        assert!(text.contains("total 12000"));
        let rows = text
            .lines()
            .filter(|l| l.trim_start().starts_with(|c: char| c.is_ascii_digit()))
            .count();
        assert_eq!(rows, 4);
    }
}
