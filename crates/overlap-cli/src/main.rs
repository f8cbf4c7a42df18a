//! `overlap` CLI — run the conflict checks and leave proration on JSON requests.
//!
//! ## Usage
//!
//! ```sh
//! # Would this shift binding collide with the employee's other bindings?
//! overlap bindings -i request.json
//!
//! # Every overlapping pair in a whole roster
//! overlap audit -i roster.json
//!
//! # Room double-booking, failing the pipeline when a collision exists
//! overlap bookings --fail-on-conflict < booking.json
//!
//! # Free slots of a room
//! overlap free-slots -i room-day.json
//!
//! # Participant conflict severity
//! overlap participants -i meeting.json
//!
//! # Leave hours per week for a report window
//! overlap aggregate -i leave.json --granularity week
//! ```

mod config;

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use overlap_engine::binding::find_overlapping_bindings;
use overlap_engine::booking::room_free_slots;
use overlap_engine::participant::classify_participant_conflicts_with;
use overlap_engine::proration::{aggregate_by_subject, aggregate_with, Granularity};
use overlap_engine::{
    AmountSegment, Booking, ClosedDateInterval, DateRangeBinding, HalfOpenTimeInterval,
    SubjectCommitment,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Exit code used by `--fail-on-conflict` when conflicts were found.
const CONFLICT_EXIT_CODE: i32 = 2;

#[derive(Parser)]
#[command(
    name = "overlap",
    version,
    about = "Policy-binding, room-booking and participant conflict checks, leave proration"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args, Clone)]
struct Io {
    /// Input JSON file (reads from stdin if omitted)
    #[arg(short, long)]
    input: Option<String>,
    /// Output file (writes to stdout if omitted)
    #[arg(short, long)]
    output: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a candidate effective range against a subject's other bindings
    Bindings {
        #[command(flatten)]
        io: Io,
        /// Exit with code 2 when any conflict is found
        #[arg(long)]
        fail_on_conflict: bool,
    },
    /// Report every overlapping pair of same-subject bindings in a roster
    Audit {
        #[command(flatten)]
        io: Io,
        /// Exit with code 2 when any overlap is found
        #[arg(long)]
        fail_on_conflict: bool,
    },
    /// Check a candidate slot against confirmed bookings of a room
    Bookings {
        #[command(flatten)]
        io: Io,
        /// Exit with code 2 when any conflict is found
        #[arg(long)]
        fail_on_conflict: bool,
    },
    /// List free slots of a room within a window
    FreeSlots {
        #[command(flatten)]
        io: Io,
    },
    /// Grade participants' conflicting commitments by severity
    Participants {
        #[command(flatten)]
        io: Io,
        /// Exit with code 2 when any conflict is found
        #[arg(long)]
        fail_on_conflict: bool,
    },
    /// Prorate leave segments into buckets of a reporting window
    Aggregate {
        #[command(flatten)]
        io: Io,
        /// Bucket size of the output
        #[arg(long, value_enum, default_value_t = GranularityArg::Day)]
        granularity: GranularityArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GranularityArg {
    Day,
    Week,
    Month,
}

impl From<GranularityArg> for Granularity {
    fn from(arg: GranularityArg) -> Self {
        match arg {
            GranularityArg::Day => Granularity::Day,
            GranularityArg::Week => Granularity::Week,
            GranularityArg::Month => Granularity::Month,
        }
    }
}

// ---------------------------------------------------------------------------
// Request and response documents
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct BindingsRequest {
    candidate: ClosedDateInterval,
    #[serde(default)]
    others: Vec<DateRangeBinding>,
    #[serde(default)]
    exclude_id: Option<String>,
}

#[derive(Deserialize)]
struct AuditRequest {
    bindings: Vec<DateRangeBinding>,
}

#[derive(Deserialize)]
struct BookingsRequest {
    candidate: HalfOpenTimeInterval,
    resource_id: String,
    #[serde(default)]
    bookings: Vec<Booking>,
}

#[derive(Deserialize)]
struct FreeSlotsRequest {
    resource_id: String,
    window: HalfOpenTimeInterval,
    #[serde(default)]
    bookings: Vec<Booking>,
    #[serde(default)]
    min_minutes: Option<i64>,
}

#[derive(Deserialize)]
struct ParticipantsRequest {
    candidate: HalfOpenTimeInterval,
    subjects: BTreeMap<String, Vec<SubjectCommitment>>,
}

/// Either one flat list of segments or one list per subject.
#[derive(Deserialize)]
struct AggregateRequest {
    window: ClosedDateInterval,
    #[serde(default)]
    segments: Vec<AmountSegment>,
    #[serde(default)]
    subjects: Option<BTreeMap<String, Vec<AmountSegment>>>,
}

#[derive(Serialize)]
struct ConflictList<T: Serialize> {
    has_conflicts: bool,
    conflicts: Vec<T>,
}

impl<T: Serialize> ConflictList<T> {
    fn new(conflicts: Vec<T>) -> Self {
        Self {
            has_conflicts: !conflicts.is_empty(),
            conflicts,
        }
    }
}

#[derive(Serialize)]
struct FreeSlot {
    start: String,
    end: String,
    duration_minutes: i64,
}

impl From<HalfOpenTimeInterval> for FreeSlot {
    fn from(slot: HalfOpenTimeInterval) -> Self {
        Self {
            start: slot.start().to_rfc3339(),
            end: slot.end().to_rfc3339(),
            duration_minutes: slot.duration_minutes(),
        }
    }
}

#[derive(Serialize)]
struct Report {
    window: ClosedDateInterval,
    buckets: Vec<overlap_engine::proration::Bucket>,
    total: f64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // stdout carries the JSON result, so logs go to stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    if let Some(path) = &cli.config {
        anyhow::ensure!(path.exists(), "Config file not found: {}", path.display());
    }
    let config = Config::load_from(cli.config.as_deref()).context("Failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let found_conflicts = match cli.command {
        Commands::Bindings { io, fail_on_conflict } => {
            let request: BindingsRequest = read_request(&io)?;
            let conflicts = overlap_engine::check_date_range_overlap(
                &request.candidate,
                &request.others,
                request.exclude_id.as_deref(),
            );
            let response = ConflictList::new(conflicts);
            write_json(&io, &response)?;
            fail_on_conflict && response.has_conflicts
        }
        Commands::Audit { io, fail_on_conflict } => {
            let request: AuditRequest = read_request(&io)?;
            let response = ConflictList::new(find_overlapping_bindings(&request.bindings));
            write_json(&io, &response)?;
            fail_on_conflict && response.has_conflicts
        }
        Commands::Bookings { io, fail_on_conflict } => {
            let request: BookingsRequest = read_request(&io)?;
            let conflicts = overlap_engine::check_booking_overlap(
                &request.candidate,
                &request.resource_id,
                &request.bookings,
            );
            let response = ConflictList::new(conflicts);
            write_json(&io, &response)?;
            fail_on_conflict && response.has_conflicts
        }
        Commands::FreeSlots { io } => {
            let request: FreeSlotsRequest = read_request(&io)?;
            let min_minutes = request.min_minutes.unwrap_or(0);
            let free: Vec<FreeSlot> =
                room_free_slots(&request.resource_id, &request.bookings, &request.window)
                    .into_iter()
                    .filter(|slot| slot.duration_minutes() >= min_minutes)
                    .map(FreeSlot::from)
                    .collect();
            write_json(&io, &serde_json::json!({ "free": free }))?;
            false
        }
        Commands::Participants { io, fail_on_conflict } => {
            let request: ParticipantsRequest = read_request(&io)?;
            let result =
                classify_participant_conflicts_with(&request.candidate, &request.subjects, &config.severity);
            write_json(&io, &result)?;
            fail_on_conflict && result.has_conflicts
        }
        Commands::Aggregate { io, granularity } => {
            let request: AggregateRequest = read_request(&io)?;
            let granularity = Granularity::from(granularity);
            if request.subjects.is_some() && !request.segments.is_empty() {
                anyhow::bail!("Request has both `segments` and `subjects`; send one or the other");
            }
            match request.subjects {
                Some(subjects) => {
                    let results = aggregate_by_subject(&subjects, &request.window, &config.proration)
                        .context("Failed to aggregate segments")?;
                    let reports: BTreeMap<String, Report> = results
                        .into_iter()
                        .map(|(subject, result)| {
                            let report = Report {
                                window: result.window,
                                buckets: result.rollup(granularity),
                                total: result.total,
                            };
                            (subject, report)
                        })
                        .collect();
                    write_json(&io, &reports)?;
                }
                None => {
                    let result = aggregate_with(&request.segments, &request.window, &config.proration)
                        .context("Failed to aggregate segments")?;
                    let report = Report {
                        window: result.window,
                        buckets: result.rollup(granularity),
                        total: result.total,
                    };
                    write_json(&io, &report)?;
                }
            }
            false
        }
    };

    if found_conflicts {
        process::exit(CONFLICT_EXIT_CODE);
    }

    Ok(())
}

fn read_request<T: for<'de> Deserialize<'de>>(io: &Io) -> Result<T> {
    let json = read_input(io.input.as_deref())?;
    serde_json::from_str(&json).context("Failed to parse request JSON")
}

fn write_json<T: Serialize + ?Sized>(io: &Io, value: &T) -> Result<()> {
    let mut pretty = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    pretty.push('\n');
    write_output(io.output.as_deref(), &pretty)
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

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(content.as_bytes())
                .and_then(|()| stdout.flush())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}
