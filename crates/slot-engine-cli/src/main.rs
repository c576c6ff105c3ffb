//! `slots` CLI: compute meeting-slot availability from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Current month from Google Calendar (service account, domain-wide delegation)
//! slots month --credentials credentials.json --subject someone@example.com
//!
//! # A specific month, offline, from a busy-interval file
//! slots month --month 2025-11 --busy-file busy.json -o availability.json
//!
//! # One day
//! slots day --date 2025-11-03 --busy-file busy.json
//!
//! # Merge a JSON array of {start, end} intervals
//! echo '[{"start":"...","end":"..."}]' | slots merge
//! ```
//!
//! Logs go to stderr; set `RUST_LOG` or pass `-v` for more detail.

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use slot_engine::config::{parse_time_zone, parse_wall_clock, SlotConfig};
use slot_engine::google::{Credentials, GoogleFreeBusy};
use slot_engine::month::{day_slots, MonthOptions};
use slot_engine::payload::SlotTimes;
use slot_engine::{merge_intervals, monthly_availability, AvailabilitySource, Interval, Month};
use slot_engine::StaticSource;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Monthly meeting-slot availability from calendar free/busy data"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute availability for a whole month
    Month {
        /// Month as YYYY-MM (defaults to the current month in the configured timezone)
        #[arg(long)]
        month: Option<String>,
        #[command(flatten)]
        config: ConfigArgs,
        #[command(flatten)]
        source: SourceArgs,
        /// Drop slots that have already started
        #[arg(long)]
        hide_past: bool,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Compute availability for a single date from a busy file
    Day {
        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        #[command(flatten)]
        config: ConfigArgs,
        /// JSON file of busy intervals keyed by calendar id
        #[arg(long)]
        busy_file: Option<PathBuf>,
        /// Drop slots that have already started
        #[arg(long)]
        hide_past: bool,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Merge a JSON array of {start, end} intervals
    Merge {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Configuration file plus per-field overrides.
#[derive(Args)]
struct ConfigArgs {
    /// JSON configuration file
    #[arg(long, env = "SLOTS_CONFIG")]
    config: Option<PathBuf>,
    /// IANA timezone, e.g. America/New_York
    #[arg(long, env = "SLOTS_TIMEZONE")]
    timezone: Option<String>,
    /// Work day start, HH:MM
    #[arg(long)]
    work_start: Option<String>,
    /// Work day end, HH:MM
    #[arg(long)]
    work_end: Option<String>,
    /// Slot length in minutes
    #[arg(long)]
    slot_minutes: Option<u32>,
    /// Calendar id to query (repeatable; replaces the configured list)
    #[arg(long = "calendar")]
    calendars: Vec<String>,
    /// List Saturdays and Sundays without slots
    #[arg(long)]
    skip_weekends: bool,
    /// Leave out the flattened `events` list
    #[arg(long)]
    no_events: bool,
}

/// Where busy intervals come from.
#[derive(Args)]
struct SourceArgs {
    /// Read busy intervals from a JSON file instead of Google Calendar
    /// (Google credentials and tokens are then ignored)
    #[arg(long)]
    busy_file: Option<PathBuf>,
    /// Service-account key file
    #[arg(long, env = "SLOTS_CREDENTIALS", default_value = "credentials.json")]
    credentials: PathBuf,
    /// User to impersonate with domain-wide delegation
    #[arg(long, env = "SLOTS_SUBJECT")]
    subject: Option<String>,
    /// OAuth access token to use instead of a service account
    #[arg(long, env = "SLOTS_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,
}

#[derive(Serialize)]
struct DayOutput {
    date: NaiveDate,
    #[serde(rename = "timeZone")]
    time_zone: String,
    slots: Vec<SlotTimes>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Month {
            month,
            config,
            source,
            hide_past,
            output,
        } => {
            let config = load_config(&config)?;
            let month = match month {
                Some(m) => Month::parse(&m)?,
                None => Month::containing(Utc::now().with_timezone(&config.time_zone).date_naive()),
            };
            // Credentials are checked before anything is computed.
            let source = build_source(&source, &config)?;
            let options = month_options(hide_past);

            let payload = monthly_availability(source.as_ref(), &config, month, &options)
                .with_context(|| format!("Failed to compute availability for {month}"))?;
            write_json(output.as_deref(), &payload)?;
        }
        Commands::Day {
            date,
            config,
            busy_file,
            hide_past,
            output,
        } => {
            let config = load_config(&config)?;
            let source = match busy_file {
                Some(path) => StaticSource::from_json_file(&path)
                    .with_context(|| format!("Failed to load busy file: {}", path.display()))?,
                None => StaticSource::default(),
            };
            let range = Month::containing(date).query_range(&config.time_zone)?;
            let by_calendar = source.fetch_busy(&range, &config.calendar_ids)?;
            let busy = merge_intervals(by_calendar.into_values().flatten());

            let slots = day_slots(date, &config, &busy, &month_options(hide_past));
            let out = DayOutput {
                date,
                time_zone: config.time_zone.name().to_string(),
                slots: slots
                    .iter()
                    .map(|s| SlotTimes::from_slot(s, &config.time_zone))
                    .collect(),
            };
            write_json(output.as_deref(), &out)?;
        }
        Commands::Merge { input, output } => {
            let json = read_input(input.as_deref())?;
            let intervals: Vec<Interval> =
                serde_json::from_str(&json).context("Failed to parse intervals JSON")?;
            write_json(output.as_deref(), &merge_intervals(intervals))?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Build the configuration: file (or defaults), then command-line overrides.
fn load_config(args: &ConfigArgs) -> Result<SlotConfig> {
    let mut config = match &args.config {
        Some(path) => SlotConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => SlotConfig::default(),
    };

    if let Some(tz) = &args.timezone {
        config.time_zone = parse_time_zone(tz)?;
    }
    if let Some(start) = &args.work_start {
        config.work_start = parse_wall_clock(start)?;
    }
    if let Some(end) = &args.work_end {
        config.work_end = parse_wall_clock(end)?;
    }
    if let Some(minutes) = args.slot_minutes {
        config.slot_minutes = minutes;
    }
    if !args.calendars.is_empty() {
        config.calendar_ids = args.calendars.clone();
    }
    if args.skip_weekends {
        config.skip_weekends = true;
    }
    if args.no_events {
        config.include_events = false;
    }

    config.validate()?;
    tracing::info!(
        time_zone = config.time_zone.name(),
        slot_minutes = config.slot_minutes,
        calendars = config.calendar_ids.len(),
        "configuration loaded"
    );
    Ok(config)
}

fn build_source(args: &SourceArgs, config: &SlotConfig) -> Result<Box<dyn AvailabilitySource>> {
    if let Some(path) = &args.busy_file {
        tracing::debug!(path = %path.display(), "using busy file, Google source disabled");
        let source = StaticSource::from_json_file(path)
            .with_context(|| format!("Failed to load busy file: {}", path.display()))?;
        return Ok(Box::new(source));
    }

    let google = match &args.access_token {
        Some(token) => GoogleFreeBusy::new(Credentials::AccessToken(token.clone())),
        None => GoogleFreeBusy::from_service_account_file(&args.credentials, args.subject.clone())
            .with_context(|| {
                format!(
                    "Failed to load Google credentials: {}",
                    args.credentials.display()
                )
            })?,
    };
    Ok(Box::new(google.with_time_zone(config.time_zone.name())))
}

fn month_options(hide_past: bool) -> MonthOptions {
    if hide_past {
        MonthOptions::hide_past(Utc::now())
    } else {
        MonthOptions::default()
    }
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_json<T: Serialize>(path: Option<&str>, value: &T) -> Result<()> {
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
