//! `meetctl`: run the meeting engine against JSON documents from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Expand a recurrence rule (stdin → stdout)
//! meetctl expand < expand.json
//!
//! # Check a candidate schedule against existing ones
//! meetctl conflicts -i conflicts.json -o warnings.json
//!
//! # All-pairs warnings inside a schedule list
//! meetctl audit -i schedules.json
//!
//! # Week window containing an instant, in UTC+9
//! meetctl period --kind week --at 2024-04-03T15:30:00+09:00
//!
//! # Import an RRULE
//! meetctl rrule --id r1 --owner s1 --starts-on 2024-03-04T09:00:00+09:00 \
//!     "FREQ=WEEKLY;BYDAY=MO,WE,FR;UNTIL=20240318T000000Z"
//! ```

mod settings;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use clap::{Parser, Subcommand};
use meeting_engine::config::parse_utc_offset;
use meeting_engine::{
    detect_conflicts, detect_conflicts_among, generate_occurrences, period_range,
    ExpansionOptions, PeriodKind, RecurrenceRule, Schedule,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

#[derive(Parser)]
#[command(
    name = "meetctl",
    version,
    about = "Recurrence expansion and conflict detection for meeting schedules"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./meetctl.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// UTC offset for calendar math, e.g. "+09:00" (overrides configuration)
    #[arg(long, global = true, value_parser = parse_utc_offset)]
    utc_offset: Option<FixedOffset>,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand a recurrence rule into occurrences
    Expand {
        /// Input JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Detect conflicts between a candidate and existing schedules
    Conflicts {
        /// Input JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Report conflicts between every pair in a schedule list
    Audit {
        /// Input JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the day/week/month window containing an instant
    Period {
        /// Period granularity: day, week or month
        #[arg(long)]
        kind: PeriodKind,
        /// Reference instant (RFC 3339)
        #[arg(long)]
        at: DateTime<FixedOffset>,
    },
    /// Import an RFC 5545 RRULE into a recurrence rule
    Rrule {
        /// Rule id
        #[arg(long)]
        id: String,
        /// Owning schedule id
        #[arg(long)]
        owner: String,
        /// First instant the rule applies from (RFC 3339)
        #[arg(long)]
        starts_on: DateTime<FixedOffset>,
        /// The RRULE value, e.g. "FREQ=WEEKLY;BYDAY=MO;UNTIL=20240401T000000Z"
        rule: String,
    },
}

/// Input document for `expand`.
#[derive(Deserialize)]
struct ExpandRequest {
    rule: RecurrenceRule,
    base_start: DateTime<FixedOffset>,
    base_end: DateTime<FixedOffset>,
    #[serde(flatten)]
    options: ExpansionOptions,
}

/// Input document for `conflicts`.
#[derive(Deserialize)]
struct ConflictRequest {
    #[serde(default)]
    existing: Vec<Schedule>,
    candidate: Schedule,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(offset) = cli.utc_offset {
        settings.engine.utc_offset = offset;
    }
    init_tracing(&settings.logging.level);

    let zone = settings.engine.utc_offset;
    tracing::debug!(%zone, "resolved engine settings");

    match cli.command {
        Commands::Expand { input, output } => {
            let request: ExpandRequest = read_json(input.as_deref())?;
            let occurrences = generate_occurrences(
                &request.rule,
                request.base_start,
                request.base_end,
                &request.options,
                zone,
            )
            .context("Failed to expand recurrence rule")?;
            write_json(output.as_deref(), &occurrences)?;
        }
        Commands::Conflicts { input, output } => {
            let request: ConflictRequest = read_json(input.as_deref())?;
            let conflicts = detect_conflicts(&request.existing, &request.candidate);
            write_json(output.as_deref(), &conflicts)?;
        }
        Commands::Audit { input, output } => {
            let schedules: Vec<Schedule> = read_json(input.as_deref())?;
            let warnings = detect_conflicts_among(&schedules);
            write_json(output.as_deref(), &warnings)?;
        }
        Commands::Period { kind, at } => {
            let window = period_range(kind, &at, zone).context("Failed to compute period")?;
            write_json(None, &window)?;
        }
        Commands::Rrule {
            id,
            owner,
            starts_on,
            rule,
        } => {
            let imported = RecurrenceRule::from_rrule(id, owner, &rule, starts_on)
                .context("Failed to import RRULE")?;
            write_json(None, &imported)?;
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins over `level`.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_json<T: DeserializeOwned>(path: Option<&Path>) -> Result<T> {
    let raw = match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?,
        None => io::read_to_string(io::stdin().lock()).context("Failed to read from stdin")?,
    };
    serde_json::from_str(&raw).context("Failed to parse input JSON")
}

/// Pretty JSON with a trailing newline, to `path` or stdout.
fn write_json<T: Serialize>(path: Option<&Path>, value: &T) -> Result<()> {
    let mut rendered = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    rendered.push('\n');
    match path {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("Failed to write file: {}", path.display())),
        None => io::stdout()
            .lock()
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout"),
    }
}
