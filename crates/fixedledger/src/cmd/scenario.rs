//! Scenario runner.
//!
//! Reads a JSON scenario describing assets and an ordered list of steps,
//! applies every step through an asset registry, and reports the outcome of
//! each step followed by the final state of every asset.
//!
//! ```json
//! {
//!   "actor": "month-end",
//!   "assets": [
//!     { "key": "press", "asset_number": "FA-001", "name": "Press",
//!       "classification": { "category": "Machinery" },
//!       "created_on": "2024-01-01",
//!       "books": [ { "book_type": "statutory", "useful_life_periods": 4,
//!                    "salvage_value": "0", "cadence": "annual" } ] }
//!   ],
//!   "steps": [
//!     { "asset": "press", "command": "acquire_and_capitalize",
//!       "acquisition_date": "2024-01-01", "cost": "12000" },
//!     { "post_all_due": "2024-12-31" },
//!     { "asset": "press", "command": "post_depreciation", "book": "statutory",
//!       "period_end": "2024-12-31", "expect_error": "FA3001" }
//!   ]
//! }
//! ```
//!
//! A step with `expect_error` passes only if the command is rejected with that
//! error code. The exit code is 1 when any step fails.

use super::classes::load_classes;
use super::{init_logging, OutputFormat};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use fixedledger_core::{
    AssetClassTable, AssetEvent, AssetId, AssetStatus, BookType, DepreciationSchedule, Disposal,
    PostingCadence,
};
use fixedledger_lifecycle::{
    AssetCommand, AssetRegistry, CommandOutcome, LedgerOptions, LifecycleEngine, NewAsset,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

/// Apply a scenario of assets and lifecycle commands.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The scenario file (JSON)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// JSON file with the asset-class table (defaults to the built-in table)
    #[arg(long, value_name = "FILE")]
    pub classes: Option<PathBuf>,

    /// Report book values as of this date instead of the current values
    #[arg(long, value_name = "DATE")]
    pub as_of: Option<NaiveDate>,

    /// Print every book's schedule in text output
    #[arg(short, long)]
    pub schedules: bool,

    /// Output format (text or json)
    #[arg(long, short = 'f', value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Show debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

// ===== Scenario file =====

/// A scenario file.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Actor recorded on every event.
    #[serde(default = "default_actor")]
    pub actor: String,
    /// Engine options.
    #[serde(default)]
    pub options: ScenarioOptions,
    /// Assets to create, in order.
    #[serde(default)]
    pub assets: Vec<ScenarioAsset>,
    /// Steps to apply, in order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_actor() -> String {
    "scenario".to_string()
}

/// Engine options a scenario may override.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioOptions {
    /// Longest schedule any book may have.
    pub max_schedule_periods: Option<u32>,
    /// Reject classifications missing from the class table.
    pub require_known_class: Option<bool>,
    /// Fallback posting cadence.
    pub default_cadence: Option<PostingCadence>,
}

impl ScenarioOptions {
    /// Engine options with these overrides applied.
    #[must_use]
    pub fn ledger_options(&self) -> LedgerOptions {
        let mut options = LedgerOptions::default();
        if let Some(periods) = self.max_schedule_periods {
            options = options.with_max_schedule_periods(periods);
        }
        if let Some(require) = self.require_known_class {
            options = options.with_require_known_class(require);
        }
        if let Some(cadence) = self.default_cadence {
            options = options.with_default_cadence(cadence);
        }
        options
    }
}

/// An asset to create, addressed by `key` in later steps.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioAsset {
    /// Key used by steps.
    pub key: String,
    /// The creation request.
    #[serde(flatten)]
    pub request: NewAsset,
}

/// One scenario step.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Step {
    /// Post every due period of every asset.
    Batch {
        /// Posting date.
        post_all_due: NaiveDate,
    },
    /// Apply a command to one asset.
    Command {
        /// Asset key.
        asset: String,
        /// Error code the command must fail with.
        #[serde(default)]
        expect_error: Option<String>,
        /// The command.
        #[serde(flatten)]
        command: AssetCommand,
    },
}

/// Read and parse a scenario file.
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("invalid scenario in {}", path.display()))
}

// ===== Report =====

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// 1-based step number.
    pub step: usize,
    /// Asset key, for command steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    /// Command name.
    pub command: String,
    /// Whether the step went as the scenario expected.
    pub ok: bool,
    /// Error code, when the command was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// What happened.
    pub detail: String,
}

/// Final state of one book.
#[derive(Debug, Clone, Serialize)]
pub struct BookReport {
    /// Book type.
    pub book: BookType,
    /// Method label.
    pub method: String,
    /// Carrying value, as of the requested date if any.
    pub book_value: Decimal,
    /// Accumulated depreciation.
    pub accumulated_depreciation: Decimal,
    /// Salvage value.
    pub salvage_value: Decimal,
    /// Posted periods.
    pub posted_periods: u32,
    /// Scheduled periods.
    pub scheduled_periods: usize,
    /// The schedule.
    pub schedule: DepreciationSchedule,
}

/// Final state of one asset.
#[derive(Debug, Clone, Serialize)]
pub struct AssetReport {
    /// Scenario key.
    pub key: String,
    /// Asset id.
    pub id: AssetId,
    /// Asset number.
    pub asset_number: String,
    /// Name.
    pub name: String,
    /// Status.
    pub status: AssetStatus,
    /// Location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Books.
    pub books: Vec<BookReport>,
    /// Disposal record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disposal: Option<Disposal>,
    /// Event log.
    pub events: Vec<AssetEvent>,
}

/// Everything a scenario run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Step outcomes, in order.
    pub steps: Vec<StepReport>,
    /// Final asset states, in creation order.
    pub assets: Vec<AssetReport>,
    /// Number of failed steps.
    pub failures: usize,
}

// ===== Execution =====

/// Apply a scenario to a registry.
///
/// Rejected commands are reported, not returned as errors. Errors are for a
/// malformed scenario: a duplicate or unknown asset key, or an asset that
/// cannot be created.
pub fn execute(
    scenario: &Scenario,
    registry: &AssetRegistry,
    as_of: Option<NaiveDate>,
) -> Result<ScenarioReport> {
    let actor = scenario.actor.as_str();
    let mut ids = HashMap::new();
    let mut created = Vec::with_capacity(scenario.assets.len());
    for asset in &scenario.assets {
        let id = registry
            .create_asset(asset.request.clone(), actor)
            .with_context(|| format!("cannot create asset '{}'", asset.key))?
            .id;
        if ids.insert(asset.key.as_str(), id).is_some() {
            bail!("duplicate asset key '{}'", asset.key);
        }
        created.push((asset.key.as_str(), id));
    }

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let report = match step {
            Step::Batch { post_all_due } => {
                let batch = registry.post_all_due(*post_all_due, actor);
                let failures: Vec<_> = batch
                    .failures()
                    .map(|f| format!("{} {}: {}", f.asset_number, f.book, f.stopped_by))
                    .collect();
                StepReport {
                    step: index + 1,
                    asset: None,
                    command: "post all due".to_string(),
                    ok: failures.is_empty(),
                    code: None,
                    detail: if failures.is_empty() {
                        format!(
                            "{} entries posted, total {}",
                            batch.entries_posted(),
                            batch.total_posted()
                        )
                    } else {
                        failures.join("; ")
                    },
                }
            }
            Step::Command {
                asset,
                expect_error,
                command,
            } => {
                let Some(&id) = ids.get(asset.as_str()) else {
                    bail!("step {}: unknown asset key '{asset}'", index + 1);
                };
                let result = registry.execute(id, command, actor);
                let (ok, code, detail) = match (result, expect_error) {
                    (Ok(outcome), None) => (true, None, describe(&outcome)),
                    (Ok(_), Some(expected)) => (
                        false,
                        None,
                        format!("expected {expected} but the command succeeded"),
                    ),
                    (Err(e), expected) => {
                        let ok = expected.as_deref() == Some(e.code());
                        (ok, Some(e.code().to_string()), e.to_string())
                    }
                };
                StepReport {
                    step: index + 1,
                    asset: Some(asset.clone()),
                    command: command.name().to_string(),
                    ok,
                    code,
                    detail,
                }
            }
        };
        debug!(step = report.step, ok = report.ok, detail = %report.detail, "scenario step");
        steps.push(report);
    }

    let mut assets = Vec::with_capacity(created.len());
    for (key, id) in created {
        let asset = registry.get_asset(id)?;
        let mut books = Vec::with_capacity(asset.books.len());
        for book in asset.books.values() {
            let book_value = match as_of {
                Some(date) => asset.book_value_as_of(book.book_type, date)?,
                None => book.book_value(),
            };
            books.push(BookReport {
                book: book.book_type,
                method: book.method.label(),
                book_value,
                accumulated_depreciation: book.accumulated_depreciation,
                salvage_value: book.salvage_value,
                posted_periods: book.posted_periods(),
                scheduled_periods: book.schedule.len(),
                schedule: book.schedule.clone(),
            });
        }
        assets.push(AssetReport {
            key: key.to_string(),
            id,
            asset_number: asset.asset_number.clone(),
            name: asset.name.clone(),
            status: asset.status,
            location: asset.location.clone(),
            books,
            disposal: asset.disposal.clone(),
            events: asset.events().to_vec(),
        });
    }

    let failures = steps.iter().filter(|s| !s.ok).count();
    Ok(ScenarioReport {
        steps,
        assets,
        failures,
    })
}

fn describe(outcome: &CommandOutcome) -> String {
    match outcome {
        CommandOutcome::Events(events) => match events.as_slice() {
            [event] => event.to_string(),
            events => format!("{} events", events.len()),
        },
        CommandOutcome::Posted(entry) => format!(
            "period {} charged {}, closing {}",
            entry.period_number, entry.depreciation_amount, entry.closing_book_value
        ),
        CommandOutcome::Disposed(disposal) => format!(
            "{} for {}, carrying {}, {} {}",
            disposal.disposal_type,
            disposal.proceeds(),
            disposal.carrying_amount,
            if disposal.is_gain { "gain" } else { "loss" },
            disposal.gain_or_loss.abs()
        ),
    }
}

// ===== Output =====

fn write_text(
    report: &ScenarioReport,
    as_of: Option<NaiveDate>,
    schedules: bool,
    out: &mut impl Write,
) -> Result<()> {
    writeln!(out, "steps")?;
    for step in &report.steps {
        writeln!(
            out,
            "{:>4} {:<12} {:<24} {:<4} {}{}",
            step.step,
            step.asset.as_deref().unwrap_or("*"),
            step.command,
            if step.ok { "ok" } else { "FAIL" },
            step.code.as_deref().map(|c| format!("{c} ")).unwrap_or_default(),
            step.detail
        )?;
    }

    for asset in &report.assets {
        writeln!(out)?;
        writeln!(
            out,
            "{} {} ({}){}",
            asset.asset_number,
            asset.name,
            asset.status,
            asset
                .location
                .as_deref()
                .map(|l| format!(" @ {l}"))
                .unwrap_or_default()
        )?;
        for book in &asset.books {
            writeln!(
                out,
                "  {:<10} value {:>14}{}  accumulated {:>14}  salvage {:>12}  posted {}/{}  {}",
                book.book,
                book.book_value,
                as_of.map(|d| format!(" @ {d}")).unwrap_or_default(),
                book.accumulated_depreciation,
                book.salvage_value,
                book.posted_periods,
                book.scheduled_periods,
                book.method
            )?;
            if schedules {
                for line in book.schedule.to_string().lines() {
                    writeln!(out, "    {line}")?;
                }
            }
        }
        if let Some(disposal) = &asset.disposal {
            writeln!(
                out,
                "  disposed {} ({}): proceeds {}, gain/loss {}",
                disposal.disposal_date,
                disposal.disposal_type,
                disposal.proceeds(),
                disposal.gain_or_loss
            )?;
        }
        for event in &asset.events {
            writeln!(out, "  {event}")?;
        }
    }

    writeln!(out)?;
    writeln!(
        out,
        "{} steps, {} failed",
        report.steps.len(),
        report.failures
    )?;
    Ok(())
}

/// Run the command, writing to `out`.
pub fn run(args: &Args, out: &mut impl Write) -> Result<ExitCode> {
    let scenario = load_scenario(&args.file)?;
    let classes = match &args.classes {
        Some(path) => load_classes(path)?,
        None => AssetClassTable::builtin(),
    };
    let engine = LifecycleEngine::with_options(scenario.options.ledger_options(), classes);
    let registry = AssetRegistry::new(engine);
    let report = execute(&scenario, &registry, args.as_of)?;

    match args.format {
        OutputFormat::Text => write_text(&report, args.as_of, args.schedules, out)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
    }

    if report.failures == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

/// Main entry point for the scenario command.
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

    #[test]
    fn test_step_forms() {
        let batch: Step = serde_json::from_str(r#"{ "post_all_due": "2024-12-31" }"#).unwrap();
        assert!(matches!(batch, Step::Batch { .. }));

        let command: Step = serde_json::from_str(
            r#"{ "asset": "a", "command": "write_off", "date": "2024-06-01", "reason": "lost",
                 "expect_error": "FA2001" }"#,
        )
        .unwrap();
        match command {
            Step::Command {
                asset,
                expect_error,
                command,
            } => {
                assert_eq!(asset, "a");
                assert_eq!(expect_error.as_deref(), Some("FA2001"));
                assert_eq!(command.name(), "write off");
            }
            Step::Batch { .. } => panic!("parsed as batch"),
        }
    }

    #[test]
    fn test_options_override_defaults() {
        let options: ScenarioOptions =
            serde_json::from_str(r#"{ "require_known_class": false }"#).unwrap();
        let ledger = options.ledger_options();
        assert!(!ledger.require_known_class);
        assert_eq!(ledger.max_schedule_periods, LedgerOptions::default().max_schedule_periods);
    }
}
