use anyhow::{anyhow, Context, Result};
use availability::config::AvailabilityConfig;
use availability::contract::client::AvailabilityApi;
use availability::contract::model::{
    DeleteOptions, Interval, SlotStatus, SlotUpdate, TimeRange,
};
use availability::AvailabilityModule;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MODULE_NAME: &str = "availability";
const DEFAULT_MAX_CONNS: u32 = 10;

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Adds `mode=rwc` when no query is given so the file is created on first use.
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case("sqlite::memory:") || dsn.eq_ignore_ascii_case("sqlite://:memory:")
    {
        return Ok("sqlite::memory:".to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if let Some(dir) = p.parent() {
        if create_dirs {
            std::fs::create_dir_all(dir)?;
        }
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    out.push('?');
    out.push_str(query.unwrap_or("mode=rwc"));
    Ok(out)
}

/// Availability CLI - inspect and edit provider schedules
#[derive(Parser)]
#[command(name = "availability-cli")]
#[command(about = "Availability CLI - inspect and edit provider schedules")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database URL (overrides config); without one the store is in memory
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// JSON file of day schedules loaded before the command runs
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug, Clone, Copy)]
struct DayArgs {
    /// Provider id
    #[arg(long)]
    owner: Uuid,
    /// Calendar day, YYYY-MM-DD
    #[arg(long)]
    date: NaiveDate,
}

#[derive(Args, Debug, Clone, Copy)]
struct PeriodArgs {
    #[arg(long)]
    owner: Uuid,
    /// First day, inclusive
    #[arg(long)]
    from: NaiveDate,
    /// Last day, inclusive
    #[arg(long)]
    to: NaiveDate,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check configuration
    Check,
    /// Add OPEN intervals to a day (BLOCKED with --blocked)
    Add {
        #[command(flatten)]
        day: DayArgs,
        /// HH:mm-HH:mm, repeatable
        #[arg(long = "range", value_parser = parse_range, required = true)]
        ranges: Vec<TimeRange>,
        #[arg(long)]
        blocked: bool,
    },
    /// Re-label a range inside the interval that contains it
    Update {
        #[command(flatten)]
        day: DayArgs,
        #[arg(long, value_parser = parse_range)]
        range: TimeRange,
        /// open | reserved | blocked
        #[arg(long, value_parser = parse_status)]
        status: SlotStatus,
        /// Booking reference, required for reserved
        #[arg(long)]
        reference: Option<String>,
    },
    /// Reserve an OPEN range
    Reserve {
        #[command(flatten)]
        day: DayArgs,
        #[arg(long, value_parser = parse_range)]
        range: TimeRange,
        #[arg(long)]
        reference: String,
    },
    /// Turn a reserved range back to OPEN
    Release {
        #[command(flatten)]
        day: DayArgs,
        #[arg(long, value_parser = parse_range)]
        range: TimeRange,
    },
    /// Remove or trim intervals
    Delete {
        #[command(flatten)]
        day: DayArgs,
        #[arg(long = "range", value_parser = parse_range)]
        ranges: Vec<TimeRange>,
        /// Trim intervals that only partially overlap a range
        #[arg(long)]
        partial: bool,
        /// Only remove exact boundary matches
        #[arg(long)]
        exact: bool,
        /// Clear the whole day
        #[arg(long)]
        all: bool,
        /// Remove reserved intervals too (needs allow_reservation_override)
        #[arg(long)]
        force: bool,
        /// Drop the day record once it is empty
        #[arg(long)]
        cleanup: bool,
    },
    /// Print one stored day
    Show {
        #[command(flatten)]
        day: DayArgs,
    },
    /// Check whether a range can be booked
    Available {
        #[command(flatten)]
        day: DayArgs,
        #[arg(long, value_parser = parse_range)]
        range: TimeRange,
    },
    /// Flip the active flag on every stored day of a provider
    SetActive {
        #[arg(long)]
        owner: Uuid,
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
    /// Stored days in a period, optionally filtered by status
    Query {
        #[command(flatten)]
        period: PeriodArgs,
        #[arg(long, value_parser = parse_status)]
        status: Option<SlotStatus>,
    },
    /// Interval counts and utilization for a period
    Stats {
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// First OPEN interval on or after a day
    NextOpen {
        #[arg(long)]
        owner: Uuid,
        #[arg(long)]
        from: NaiveDate,
    },
    /// Day-by-day report with a summary
    Schedule {
        #[command(flatten)]
        period: PeriodArgs,
    },
}

fn parse_range(raw: &str) -> Result<TimeRange, String> {
    let (start, end) = raw
        .split_once('-')
        .ok_or_else(|| format!("expected HH:mm-HH:mm, got '{raw}'"))?;
    TimeRange::parse(start.trim(), end.trim()).map_err(|e| e.to_string())
}

fn parse_status(raw: &str) -> Result<SlotStatus, String> {
    match raw.to_ascii_lowercase().as_str() {
        "open" => Ok(SlotStatus::Open),
        "reserved" => Ok(SlotStatus::Reserved),
        "blocked" => Ok(SlotStatus::Blocked),
        other => Err(format!(
            "unknown status '{other}', expected open, reserved or blocked"
        )),
    }
}

/// One entry of a `--fixture` file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureDay {
    owner_id: Uuid,
    date: NaiveDate,
    intervals: Vec<Interval>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        database_url: cli.database_url.clone(),
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Availability CLI starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let module_cfg: AvailabilityConfig = config.module_config(MODULE_NAME)?;

    let command = cli.command.unwrap_or(Commands::Check);
    if let Commands::Check = command {
        return check_config(&config, &module_cfg);
    }

    let client = build_client(&config, &module_cfg).await?;
    if let Some(path) = &cli.fixture {
        seed_from_fixture(client.as_ref(), path).await?;
    }
    execute(client.as_ref(), command).await
}

fn check_config(config: &AppConfig, module_cfg: &AvailabilityConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    println!("Configuration check passed");
    println!(
        "Store: {}",
        config
            .database
            .as_ref()
            .map_or("in-memory", |db| db.url.as_str())
    );
    println!(
        "Module: granularity={}, allow_reservation_override={}, next_open_horizon_days={}",
        module_cfg.granularity,
        module_cfg.allow_reservation_override,
        module_cfg.next_open_horizon_days
    );
    Ok(())
}

async fn connect(db_cfg: &DatabaseConfig, base_dir: &Path) -> Result<DatabaseConnection> {
    let mut dsn = db_cfg.url.trim().to_owned();
    if dsn.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    if dsn.starts_with("sqlite:") {
        dsn = absolutize_sqlite_dsn(&dsn, base_dir, true)?;
    }

    // Each pooled connection to an in-memory SQLite database is its own database.
    let max_conns = if dsn == "sqlite::memory:" {
        1
    } else {
        db_cfg.max_conns.unwrap_or(DEFAULT_MAX_CONNS)
    };

    let mut opts = ConnectOptions::new(dsn.clone());
    opts.max_connections(max_conns)
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    tracing::info!("Connecting to database: {}", dsn);
    let db = Database::connect(opts)
        .await
        .with_context(|| format!("Failed to connect to database {dsn}"))?;
    tracing::info!("Connected DB backend: {:?}", db.get_database_backend());
    Ok(db)
}

async fn build_client(
    config: &AppConfig,
    module_cfg: &AvailabilityConfig,
) -> Result<Arc<dyn AvailabilityApi>> {
    let db = match &config.database {
        Some(db_cfg) => {
            let conn = connect(db_cfg, Path::new(&config.server.home_dir)).await?;
            AvailabilityModule::migrate(&conn).await?;
            Some(conn)
        }
        None => {
            tracing::info!("No database configuration found, keeping schedules in memory");
            None
        }
    };

    let module = AvailabilityModule::new();
    module.init(module_cfg, db);
    module.client()
}

async fn seed_from_fixture(client: &dyn AvailabilityApi, path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixture {}", path.display()))?;
    let days: Vec<FixtureDay> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid fixture {}", path.display()))?;

    for day in &days {
        client
            .create_or_merge(day.owner_id, day.date, day.intervals.clone())
            .await
            .with_context(|| format!("Failed to seed {} {}", day.owner_id, day.date))?;
    }
    tracing::info!(days = days.len(), "Seeded schedules from fixture");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn execute(client: &dyn AvailabilityApi, command: Commands) -> Result<()> {
    match command {
        Commands::Check => Ok(()),
        Commands::Add {
            day,
            ranges,
            blocked,
        } => {
            let intervals = ranges
                .into_iter()
                .map(|r| {
                    if blocked {
                        Interval::blocked(r)
                    } else {
                        Interval::open(r)
                    }
                })
                .collect();
            print_json(&client.create_or_merge(day.owner, day.date, intervals).await?)
        }
        Commands::Update {
            day,
            range,
            status,
            reference,
        } => {
            let update = SlotUpdate {
                status,
                reservation_ref: reference,
            };
            print_json(
                &client
                    .update_range(day.owner, day.date, range, update)
                    .await?,
            )
        }
        Commands::Reserve {
            day,
            range,
            reference,
        } => print_json(&client.reserve(day.owner, day.date, range, reference).await?),
        Commands::Release { day, range } => {
            print_json(&client.release(day.owner, day.date, range).await?)
        }
        Commands::Delete {
            day,
            ranges,
            partial,
            exact,
            all,
            force,
            cleanup,
        } => {
            let options = DeleteOptions {
                exact_only: exact,
                allow_partial: partial,
                delete_all: all,
                force,
                remove_empty: cleanup,
            };
            print_json(
                &client
                    .delete_ranges(day.owner, day.date, ranges, options)
                    .await?,
            )
        }
        Commands::Show { day } => print_json(&client.read(day.owner, day.date).await?),
        Commands::Available { day, range } => {
            print_json(&client.check_available(day.owner, day.date, range).await?)
        }
        Commands::SetActive { owner, active } => {
            let changed = client.set_active(owner, active).await?;
            print_json(&serde_json::json!({ "changed": changed }))
        }
        Commands::Query { period, status } => print_json(
            &client
                .range_query(period.owner, period.from, period.to, status)
                .await?,
        ),
        Commands::Stats { period } => print_json(
            &client
                .statistics(period.owner, period.from, period.to)
                .await?,
        ),
        Commands::NextOpen { owner, from } => print_json(&client.next_open(owner, from).await?),
        Commands::Schedule { period } => print_json(
            &client
                .schedule(period.owner, period.from, period.to)
                .await?,
        ),
    }
}
