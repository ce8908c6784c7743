//! Command-line transport over `massledger_core`.
//!
//! # Responsibility
//! - Map one subcommand to one core operation.
//! - Resolve database, logging and celebrant configuration.
//!
//! # Invariants
//! - Failures exit non-zero and print `error[<reason_code>]: <message>`.
//! - `--json` output is the serde form of the core result type.

mod config;
mod error;
mod render;

use chrono::{Datelike, Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use config::{CliConfig, ConfigFlags};
use error::CliError;
use log::warn;
use massledger_core::db::open_db;
use massledger_core::{
    core_version, init_logging, CelebrantId, DashboardService, FulfillmentRequest,
    HistoricalImportService, HistoricalRow, ImportReport, IntentionId, IntentionKindTag,
    LifecycleService, NewIntention, SqliteObligationStore, SqliteRecords, YearBounds,
    DEFAULT_IMPORT_START_YEAR,
};
use rusqlite::Connection;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "massledger",
    version,
    about = "Mass intention lifecycle and obligation ledger"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GlobalArgs {
    /// SQLite database file (env: MASSLEDGER_DB_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Celebrant id the command acts for (env: MASSLEDGER_CELEBRANT)
    #[arg(long, global = true, value_name = "UUID")]
    celebrant: Option<String>,

    /// Log level: trace|debug|info|warn|error (env: MASSLEDGER_LOG_LEVEL)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Directory for rolling log files; logging is off without it (env: MASSLEDGER_LOG_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Args)]
struct IntentionDetails {
    /// Intention title
    title: String,

    #[arg(long)]
    description: Option<String>,

    /// Who requested the intention
    #[arg(long)]
    source: Option<String>,
}

impl From<IntentionDetails> for NewIntention {
    fn from(value: IntentionDetails) -> Self {
        Self {
            title: value.title,
            description: value.description,
            source: value.source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Periodic,
    FixedDate,
    Bulk,
}

impl From<KindArg> for IntentionKindTag {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Periodic => Self::Periodic,
            KindArg::FixedDate => Self::FixedDate,
            KindArg::Bulk => Self::Bulk,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Create a periodic intention for one month
    AddPeriodic {
        #[command(flatten)]
        details: IntentionDetails,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,
        #[arg(long)]
        year: i32,
    },
    /// Create a fixed-date intention
    AddFixed {
        #[command(flatten)]
        details: IntentionDetails,
        /// Date in YYYY-MM-DD form
        #[arg(long)]
        date: NaiveDate,
    },
    /// Create a bulk series
    AddBulk {
        #[command(flatten)]
        details: IntentionDetails,
        #[arg(long)]
        total: u32,
        /// Start date (default: today)
        #[arg(long)]
        start: Option<NaiveDate>,
    },
    /// Record one fulfillment of an intention
    Celebrate {
        intention: IntentionId,
        /// Fulfillment date (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Pause a bulk series, or resume it with --resume
    Pause {
        intention: IntentionId,
        #[arg(long)]
        resume: bool,
    },
    /// Flip the paused flag of a bulk series
    TogglePause { intention: IntentionId },
    /// Move a fixed-date intention to another date
    Reschedule {
        intention: IntentionId,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Record that the obligation was not met on a date
    NotMet {
        /// Date (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        reason: String,
    },
    /// Show the obligation dashboard
    Dashboard {
        /// Snapshot date (default: today)
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Import historical rows from a JSON array
    Import {
        file: PathBuf,
        #[arg(long, default_value_t = DEFAULT_IMPORT_START_YEAR)]
        start_year: i32,
        /// Last accepted year (default: current year)
        #[arg(long)]
        end_year: Option<i32>,
    },
    /// List intentions
    List {
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// Show one intention
    Show { intention: IntentionId },
    /// List fulfillment events
    Events {
        #[arg(long)]
        intention: Option<IntentionId>,
    },
    /// List daily records
    Days,
    /// Print the core version
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error[{}]: {err}", err.reason_code());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let json = cli.global.json;
    if let Command::Version = cli.command {
        return emit(json, &core_version(), |version| version.to_string());
    }

    let config = CliConfig::from_env(ConfigFlags {
        db: cli.global.db,
        log_level: cli.global.log_level,
        log_dir: cli.global.log_dir,
        celebrant: cli.global.celebrant,
    });
    setup_logging(&config);
    let celebrant = config.celebrant()?;
    let mut conn = open_db(&config.db_path)?;

    match cli.command {
        Command::Dashboard { as_of } => {
            let dashboard = DashboardService::new(SqliteRecords::try_new(&conn)?);
            let view = dashboard.snapshot(celebrant, as_of)?;
            emit(json, &view, render::dashboard)
        }
        Command::Import {
            file,
            start_year,
            end_year,
        } => {
            let end_year = end_year.unwrap_or_else(|| Local::now().year());
            let bounds = YearBounds::new(start_year, end_year)?;
            let report = import_file(&mut conn, celebrant, &file, bounds)?;
            emit(json, &report, render::import_report)
        }
        command => run_lifecycle(command, celebrant, &mut conn, json),
    }
}

fn run_lifecycle(
    command: Command,
    celebrant: CelebrantId,
    conn: &mut Connection,
    json: bool,
) -> Result<(), CliError> {
    let mut service = LifecycleService::new(SqliteObligationStore::try_new(conn)?);
    match command {
        Command::AddPeriodic {
            details,
            month,
            year,
        } => {
            let created = service.create_periodic(celebrant, details.into(), month, year)?;
            emit(json, &created, render::intention)
        }
        Command::AddFixed { details, date } => {
            let created = service.create_fixed_date(celebrant, details.into(), date)?;
            emit(json, &created, render::intention)
        }
        Command::AddBulk {
            details,
            total,
            start,
        } => {
            let created = service.create_bulk(celebrant, details.into(), total, start)?;
            emit(json, &created, render::intention)
        }
        Command::Celebrate {
            intention,
            date,
            notes,
        } => {
            let event =
                service.record_fulfillment(celebrant, intention, FulfillmentRequest { date, notes })?;
            emit(json, &event, render::event)
        }
        Command::Pause { intention, resume } => {
            let paused = service.set_bulk_paused(celebrant, intention, !resume)?;
            emit(json, &paused, pause_message)
        }
        Command::TogglePause { intention } => {
            let paused = service.toggle_bulk_paused(celebrant, intention)?;
            emit(json, &paused, pause_message)
        }
        Command::Reschedule {
            intention,
            date,
            reason,
        } => {
            let moved = service.reschedule_fixed_date(celebrant, intention, date, reason)?;
            emit(json, &moved, render::intention)
        }
        Command::NotMet { date, reason } => {
            let record = service.mark_not_met(celebrant, date, &reason)?;
            emit(json, &record, render::daily_record)
        }
        Command::List { kind } => {
            let items = service.list_intentions(celebrant, kind.map(Into::into))?;
            emit(json, &items, |items| render::intentions(items))
        }
        Command::Show { intention } => {
            let item = service.get_intention(celebrant, intention)?;
            emit(json, &item, render::intention)
        }
        Command::Events { intention } => {
            let items = service.list_events(celebrant, intention)?;
            emit(json, &items, |items| render::events(items))
        }
        Command::Days => {
            let records = service.list_daily_records(celebrant)?;
            emit(json, &records, |records| {
                if records.is_empty() {
                    "No daily records.".to_string()
                } else {
                    records
                        .iter()
                        .map(render::daily_record)
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            })
        }
        Command::Dashboard { .. } | Command::Import { .. } | Command::Version => Ok(()),
    }
}

fn setup_logging(config: &CliConfig) {
    let Some(log_dir) = config.log_dir.as_ref() else {
        return;
    };
    let log_dir = if log_dir.is_absolute() {
        log_dir.clone()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(log_dir),
            Err(err) => {
                eprintln!("warning: logging disabled: {err}");
                return;
            }
        }
    };
    if let Err(err) = init_logging(&config.log_level, &log_dir.to_string_lossy()) {
        eprintln!("warning: logging disabled: {err}");
    }
}

fn import_file(
    conn: &mut Connection,
    celebrant: CelebrantId,
    file: &Path,
    bounds: YearBounds,
) -> Result<ImportReport, CliError> {
    let rows = read_rows(file)?;
    let mut importer = HistoricalImportService::new(SqliteObligationStore::try_new(conn)?);
    Ok(importer.import_sheet(celebrant, &rows, bounds)?)
}

/// Reads a JSON array of rows. A row that does not decode is kept as its
/// decode error so the import can skip it.
fn read_rows(file: &Path) -> Result<Vec<Result<HistoricalRow, String>>, CliError> {
    let raw = std::fs::read_to_string(file)
        .map_err(|err| CliError::Input(format!("cannot read {}: {err}", file.display())))?;
    let values: Vec<serde_json::Value> = serde_json::from_str(&raw).map_err(|err| {
        warn!("event=historical_import_batch module=cli status=error error_code=malformed_sheet");
        CliError::Input(format!("malformed import sheet {}: {err}", file.display()))
    })?;
    Ok(values
        .into_iter()
        .map(|value| serde_json::from_value::<HistoricalRow>(value).map_err(|err| err.to_string()))
        .collect())
}

fn pause_message(paused: &bool) -> String {
    if *paused {
        "Bulk series paused.".to_string()
    } else {
        "Bulk series running.".to_string()
    }
}

fn emit<T: Serialize + ?Sized>(
    json: bool,
    value: &T,
    human: impl FnOnce(&T) -> String,
) -> Result<(), CliError> {
    let text = if json {
        serde_json::to_string_pretty(value).map_err(CliError::Output)?
    } else {
        human(value)
    };
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{import_file, run, Cli, Command};
    use clap::{CommandFactory, Parser};
    use massledger_core::db::open_db;
    use massledger_core::{IntentionKindTag, ObligationRecords, SqliteRecords, YearBounds};
    use uuid::Uuid;

    const CELEBRANT: &str = "6f1c2d3e-4b5a-4c6d-8e7f-901a2b3c4d5e";

    fn run_args(db: &str, args: &[&str]) -> Result<(), super::CliError> {
        let mut argv = vec!["massledger", "--db", db, "--celebrant", CELEBRANT];
        argv.extend_from_slice(args);
        run(Cli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn celebrate_parses_optional_date_and_notes() {
        let cli = Cli::try_parse_from([
            "massledger",
            "--celebrant",
            "6f1c2d3e-4b5a-4c6d-8e7f-901a2b3c4d5e",
            "celebrate",
            "11111111-2222-4333-8444-555555555555",
            "--date",
            "2024-03-09",
            "--notes",
            "requiem",
        ])
        .unwrap();

        let Command::Celebrate {
            intention,
            date,
            notes,
        } = cli.command
        else {
            panic!("expected celebrate");
        };
        assert_eq!(intention.to_string(), "11111111-2222-4333-8444-555555555555");
        assert_eq!(date.unwrap().to_string(), "2024-03-09");
        assert_eq!(notes.as_deref(), Some("requiem"));
    }

    #[test]
    fn add_periodic_rejects_month_out_of_range() {
        let parsed = Cli::try_parse_from([
            "massledger",
            "add-periodic",
            "monthly",
            "--month",
            "13",
            "--year",
            "2024",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn global_json_flag_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from(["massledger", "dashboard", "--json"]).unwrap();
        assert!(cli.global.json);
    }

    #[test]
    fn commands_persist_to_the_configured_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cli.sqlite3");
        let db = path.to_str().unwrap();

        run_args(db, &["add-bulk", "Gregorian", "--total", "30", "--start", "2024-01-01"]).unwrap();
        run_args(db, &["add-periodic", "monthly", "--month", "1", "--year", "2024"]).unwrap();
        run_args(db, &["--json", "dashboard", "--as-of", "2024-01-10"]).unwrap();

        let conn = open_db(&path).unwrap();
        let records = SqliteRecords::try_new(&conn).unwrap();
        let celebrant = Uuid::parse_str(CELEBRANT).unwrap();
        let bulk = records
            .list_intentions(celebrant, Some(IntentionKindTag::Bulk))
            .unwrap();
        assert_eq!(bulk.len(), 1);
        assert_eq!(bulk[0].as_bulk().unwrap().total, 30);
    }

    #[test]
    fn unknown_intention_maps_to_not_found_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cli.sqlite3");

        let err = run_args(
            path.to_str().unwrap(),
            &["celebrate", "11111111-2222-4333-8444-555555555555"],
        )
        .unwrap_err();
        assert_eq!(err.reason_code(), "not_found");
    }

    #[test]
    fn badly_typed_sheet_row_is_skipped_and_the_rest_imported() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = dir.path().join("sheet.json");
        std::fs::write(
            &sheet,
            r#"[
                {"kind": "Personal", "title": "A", "date": "2023-01-05", "source": "book"},
                {"kind": "Bulk", "title": "B", "date": "2023-01-06", "source": "book",
                 "bulk_total": "ten", "bulk_remaining": 2}
            ]"#,
        )
        .unwrap();
        let mut conn = open_db(&dir.path().join("cli.sqlite3")).unwrap();
        let celebrant = Uuid::parse_str(CELEBRANT).unwrap();

        let report = import_file(
            &mut conn,
            celebrant,
            &sheet,
            YearBounds::new(2000, 2024).unwrap(),
        )
        .unwrap();

        assert_eq!(report.accepted, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].row, 2);
        assert_eq!(report.skipped[0].reason_code, "invalid_input");

        let records = SqliteRecords::try_new(&conn).unwrap();
        let periodic = records
            .list_intentions(celebrant, Some(IntentionKindTag::Periodic))
            .unwrap();
        assert_eq!(periodic.len(), 1);
    }

    #[test]
    fn sheet_that_is_not_an_array_fails_the_import() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = dir.path().join("sheet.json");
        std::fs::write(&sheet, r#"{"kind": "Personal"}"#).unwrap();
        let mut conn = open_db(&dir.path().join("cli.sqlite3")).unwrap();

        let err = import_file(
            &mut conn,
            Uuid::parse_str(CELEBRANT).unwrap(),
            &sheet,
            YearBounds::new(2000, 2024).unwrap(),
        )
        .unwrap_err();
        assert_eq!(err.reason_code(), "invalid_input");
    }
}
