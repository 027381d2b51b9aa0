//! Heatseed - heat and lane seeding for athletics start lists
//!
//! The `heatseed` command exposes the seeding engine over JSON and TOML files.
//!
//! ## Commands
//!
//! - `parse`: Parse a performance string the way the ranker sees it
//! - `rank`: Print a start list ordered by a sort key
//! - `partition`: Show the heat plan for a number of athletes
//! - `seed`: Generate heats and lane assignments for an event
//! - `bibs`: Allocate bib numbers to registrations that have none

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use heatseed_core::{
    allocate_and_apply, partition, performance, start_list, BibAllocationResult,
    CompetitionLocks, CompetitorEntry, EventClassification, HeatPlan, MemoryRegistry,
    Registration, SeedingDraft, SeedingOutcome, SeedingRequest, SortKey, StartListRow,
    Traversal, DEFAULT_MAX_LANES,
};

#[derive(Parser)]
#[command(name = "heatseed")]
#[command(author = "Heatseed Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Heat partitioning, lane seeding and bib allocation", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Output format for command results
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Explicit classification, overriding the one derived from the event name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ClassArg {
    Time,
    Distance,
}

impl From<ClassArg> for EventClassification {
    fn from(arg: ClassArg) -> Self {
        match arg {
            ClassArg::Time => EventClassification::TimeBased,
            ClassArg::Distance => EventClassification::DistanceBased,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a performance string
    Parse {
        /// Raw mark, e.g. "1:02.50" or "7,45 m"
        mark: String,

        /// Event name used to classify the mark
        #[arg(short, long, default_value = "100m")]
        event: String,

        /// Force a classification instead of deriving it from the event
        #[arg(long, value_enum)]
        classification: Option<ClassArg>,
    },

    /// Print entries ordered by a sort key
    Rank {
        /// JSON file holding an array of competitor entries
        #[arg(short = 'i', long)]
        entries: PathBuf,

        /// Event name used to classify marks
        #[arg(short, long)]
        event: String,

        /// PB, SB, SEED_TIME, NAME, BIB or CLUB
        #[arg(short, long, default_value = "SEED_TIME")]
        sort_by: String,

        /// List the weakest competitor first
        #[arg(long)]
        weakest_first: bool,
    },

    /// Show the heat plan for a number of athletes
    Partition {
        /// Number of athletes to place
        athletes: usize,

        /// Lanes available at the venue
        #[arg(short, long, env = "HEATSEED_MAX_LANES", default_value_t = DEFAULT_MAX_LANES)]
        max_lanes: u32,

        /// Leave lane 1 empty in every heat
        #[arg(long)]
        skip_lane1: bool,

        /// Explicit lanes per heat, comma separated (e.g. 8,8,6)
        #[arg(long, value_delimiter = ',')]
        custom: Option<Vec<u32>>,
    },

    /// Generate heats and lane assignments
    Seed {
        /// JSON file holding an array of competitor entries
        #[arg(short = 'i', long)]
        entries: PathBuf,

        /// Event name used to classify marks
        #[arg(short, long)]
        event: String,

        /// TOML file with the seeding configuration
        #[arg(short, long, env = "HEATSEED_CONFIG")]
        config: Option<PathBuf>,

        /// Override the configured seeding method
        #[arg(long)]
        method: Option<String>,

        /// Seed for the random method
        #[arg(long)]
        random_seed: Option<u64>,
    },

    /// Allocate bib numbers to confirmed registrations without one
    Bibs {
        /// JSON file holding an array of registrations
        #[arg(short, long)]
        registrations: PathBuf,

        /// Competition to allocate for
        #[arg(short, long)]
        competition: String,

        /// Lowest number to hand out
        #[arg(long, default_value_t = 1)]
        start: u32,

        /// Write the updated registrations back to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    heatseed_core::init_tracing(cli.json, level);

    let format = cli.format;
    let output = match cli.command {
        Commands::Parse {
            mark,
            event,
            classification,
        } => cmd_parse(&mark, &event, classification.map(Into::into), format)?,
        Commands::Rank {
            entries,
            event,
            sort_by,
            weakest_first,
        } => cmd_rank(&entries, &event, &sort_by, weakest_first, format)?,
        Commands::Partition {
            athletes,
            max_lanes,
            skip_lane1,
            custom,
        } => cmd_partition(athletes, max_lanes, skip_lane1, custom.as_deref(), format)?,
        Commands::Seed {
            entries,
            event,
            config,
            method,
            random_seed,
        } => cmd_seed(
            &entries,
            &event,
            config.as_deref(),
            method,
            random_seed,
            format,
        )?,
        Commands::Bibs {
            registrations,
            competition,
            start,
            output,
        } => cmd_bibs(
            &registrations,
            &competition,
            start,
            output.as_deref(),
            format,
        )?,
    };

    print!("{output}");
    if cli.verbose {
        heatseed_core::METRICS.flush();
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    let mut out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    out.push('\n');
    Ok(out)
}

/// Load competitor entries from a JSON array.
fn load_entries(path: &Path) -> Result<Vec<CompetitorEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read entries file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse entries in {}", path.display()))
}

/// Load a seeding draft from TOML; defaults when no file is given.
fn load_draft(path: Option<&Path>) -> Result<SeedingDraft> {
    let Some(path) = path else {
        return Ok(SeedingDraft::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse seeding config in {}", path.display()))
}

#[derive(Debug, Serialize)]
struct ParseReport<'a> {
    input: &'a str,
    classification: EventClassification,
    value: Option<f64>,
    display: Option<String>,
}

fn cmd_parse(
    mark: &str,
    event: &str,
    classification: Option<EventClassification>,
    format: OutputFormat,
) -> Result<String> {
    let classification = classification.unwrap_or_else(|| EventClassification::for_event(event));
    let parsed = performance::parse(mark, classification);
    let report = ParseReport {
        input: mark,
        classification,
        value: parsed.mark_value(),
        display: parsed.display(classification),
    };

    match format {
        OutputFormat::Json => to_json(&report),
        OutputFormat::Text => Ok(match (report.value, report.display) {
            (Some(value), Some(display)) => {
                format!("{display} ({value} {classification})\n")
            }
            _ => format!("no mark ({classification})\n"),
        }),
    }
}

fn render_start_list(rows: &[StartListRow]) -> String {
    let mut out = String::new();
    for row in rows {
        let _ = writeln!(
            out,
            "{:>3}  {:<6} {:<28} {:<16} {}",
            row.position,
            row.bib.as_deref().unwrap_or("-"),
            row.name,
            row.club.as_deref().unwrap_or(""),
            row.mark.as_deref().unwrap_or(""),
        );
    }
    out
}

fn cmd_rank(
    entries_path: &Path,
    event: &str,
    sort_by: &str,
    weakest_first: bool,
    format: OutputFormat,
) -> Result<String> {
    let entries = load_entries(entries_path)?;
    let key: SortKey = sort_by.parse()?;
    let classification = EventClassification::for_event(event);
    let traversal = if weakest_first {
        Traversal::WeakestFirst
    } else {
        Traversal::BestFirst
    };
    let rows = start_list(&entries, key, classification, traversal);
    info!(entries = rows.len(), sort_by = %key, "start list ranked");

    match format {
        OutputFormat::Json => to_json(&rows),
        OutputFormat::Text => Ok(render_start_list(&rows)),
    }
}

fn render_plan(plan: &HeatPlan) -> String {
    let mut out = String::new();
    for heat in &plan.heats {
        let _ = writeln!(
            out,
            "Heat {}: {} athletes, {} lanes",
            heat.number, heat.athletes, heat.lanes
        );
    }
    if plan.skip_lane1 {
        out.push_str("Lane 1 left empty\n");
    }
    if plan.fallback {
        out.push_str("Warning: fallback layout, check venue capacity\n");
    }
    out
}

fn cmd_partition(
    athletes: usize,
    max_lanes: u32,
    skip_lane1: bool,
    custom: Option<&[u32]>,
    format: OutputFormat,
) -> Result<String> {
    let draft = SeedingDraft {
        max_lanes,
        skip_lane1,
        custom_lanes_per_heat: custom.map(<[u32]>::to_vec),
        ..Default::default()
    };
    let config = draft.resolve()?;
    let plan = partition::plan_for(athletes, &config)?;

    match format {
        OutputFormat::Json => to_json(&plan),
        OutputFormat::Text => Ok(render_plan(&plan)),
    }
}

fn render_seeding(outcome: &SeedingOutcome, entries: &[CompetitorEntry]) -> String {
    let by_id: HashMap<&str, &CompetitorEntry> =
        entries.iter().map(|e| (e.id.as_str(), e)).collect();

    let mut out = String::new();
    for heat in &outcome.plan.heats {
        let _ = writeln!(
            out,
            "Heat {} ({} athletes, {} lanes)",
            heat.number, heat.athletes, heat.lanes
        );
        for lane in outcome.heat_lanes(heat.number) {
            match lane.competitor_id.as_deref().and_then(|id| by_id.get(id)) {
                Some(entry) => {
                    let _ = writeln!(
                        out,
                        "  Lane {:>2}  {:<6} {}",
                        lane.lane,
                        entry.bib.as_deref().unwrap_or("-"),
                        entry.display_name()
                    );
                }
                None => {
                    let _ = writeln!(out, "  Lane {:>2}  -", lane.lane);
                }
            }
        }
    }
    for warning in &outcome.warnings {
        let _ = writeln!(out, "Warning: {warning}");
    }
    let _ = writeln!(out, "Digest: {}", outcome.digest);
    out
}

fn cmd_seed(
    entries_path: &Path,
    event: &str,
    config_path: Option<&Path>,
    method: Option<String>,
    random_seed: Option<u64>,
    format: OutputFormat,
) -> Result<String> {
    let mut draft = load_draft(config_path)?;
    if let Some(method) = method {
        draft.seeding_method = method;
    }
    if random_seed.is_some() {
        draft.random_seed = random_seed;
    }

    let request = SeedingRequest {
        event: event.to_string(),
        classification: None,
        config: draft,
        entries: load_entries(entries_path)?,
    };
    let outcome = request
        .run()
        .with_context(|| format!("Failed to seed {event}"))?;

    match format {
        OutputFormat::Json => to_json(&outcome),
        OutputFormat::Text => Ok(render_seeding(&outcome, &request.entries)),
    }
}

fn render_bibs(result: &BibAllocationResult) -> String {
    let mut out = String::new();
    match result.range {
        Some(range) => {
            let _ = writeln!(
                out,
                "Allocated {} bib(s): {}..={}",
                result.len(),
                range.first,
                range.last
            );
        }
        None => out.push_str("Every confirmed registration already has a bib\n"),
    }
    for assignment in &result.assignments {
        let _ = writeln!(out, "  {:<6} {}", assignment.bib, assignment.registration_id);
    }
    out
}

fn cmd_bibs(
    registrations_path: &Path,
    competition: &str,
    start: u32,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    let content = std::fs::read_to_string(registrations_path).with_context(|| {
        format!(
            "Failed to read registrations file: {}",
            registrations_path.display()
        )
    })?;
    let registrations: Vec<Registration> =
        serde_json::from_str(&content).context("Failed to parse registrations as JSON")?;

    let registry = MemoryRegistry::new();
    for registration in registrations {
        registry.insert(registration)?;
    }
    let locks = CompetitionLocks::new();
    let result = allocate_and_apply(&registry, &locks, competition, start)
        .with_context(|| format!("Failed to allocate bibs for {competition}"))?;

    if let Some(path) = output {
        let updated = serde_json::to_string_pretty(&registry.registrations()?)?;
        std::fs::write(path, updated)
            .with_context(|| format!("Failed to write registrations: {}", path.display()))?;
        info!(path = %path.display(), "registrations written");
    }

    match format {
        OutputFormat::Json => to_json(&result),
        OutputFormat::Text => Ok(render_bibs(&result)),
    }
}
