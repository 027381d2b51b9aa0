//! Seeding orchestration: rank → partition → seed.
//!
//! [`generate_seeding`] is the single request/response entry point a web or
//! CLI wrapper calls. It holds no state; every call recomputes the plan.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::domain::{
    CompetitorEntry, EventClassification, Result, SeedingConfig, SeedingDraft, SeedingError,
    SeedingMethod, SortKey,
};
use crate::metrics::METRICS;
use crate::obs;
use crate::partition::{self, HeatPlan};
use crate::performance;
use crate::ranking::{self, Traversal};
use crate::seeding::{self, LaneAssignment, Placement};

/// A self-contained seeding request as a wrapper would receive it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedingRequest {
    /// Event name, used to classify the event when `classification` is unset.
    pub event: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<EventClassification>,

    #[serde(default)]
    pub config: SeedingDraft,

    pub entries: Vec<CompetitorEntry>,
}

impl SeedingRequest {
    pub fn classification(&self) -> EventClassification {
        self.classification
            .unwrap_or_else(|| EventClassification::for_event(&self.event))
    }

    /// Resolve the draft configuration and generate the plan.
    pub fn run(&self) -> Result<SeedingOutcome> {
        let _span = obs::SeedingSpan::enter(&self.event);
        let config = self.config.resolve()?;
        generate_seeding(&self.entries, self.classification(), &config)
    }
}

/// Result of one seeding run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedingOutcome {
    pub classification: EventClassification,
    pub sort_by: SortKey,
    pub method: SeedingMethod,
    pub plan: HeatPlan,
    /// One record per lane of every heat, empty lanes included.
    pub lanes: Vec<LaneAssignment>,
    /// Operator-facing notes (fallback layout, unmarked competitors).
    pub warnings: Vec<String>,
    /// SHA-256 of the assignments; equal digests mean identical plans.
    pub digest: String,
}

impl SeedingOutcome {
    /// Lanes of one heat, in lane order.
    pub fn heat_lanes(&self, heat: u32) -> impl Iterator<Item = &LaneAssignment> {
        self.lanes.iter().filter(move |l| l.heat == heat)
    }

    /// Heat and lane of a competitor.
    pub fn position_of(&self, competitor_id: &str) -> Option<(u32, u32)> {
        self.lanes
            .iter()
            .find(|l| l.competitor_id.as_deref() == Some(competitor_id))
            .map(|l| (l.heat, l.lane))
    }
}

/// Deterministic digest of a lane assignment set.
pub fn plan_digest(lanes: &[LaneAssignment]) -> String {
    let mut hasher = Sha256::new();
    for lane in lanes {
        hasher.update(lane.heat.to_be_bytes());
        hasher.update(lane.lane.to_be_bytes());
        hasher.update(lane.competitor_id.as_deref().unwrap_or("").as_bytes());
        hasher.update(b"\0");
    }
    hex::encode(hasher.finalize())
}

fn check_unique_ids(entries: &[CompetitorEntry]) -> Result<()> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if !seen.insert(entry.id.as_str()) {
            return Err(SeedingError::invalid_config(
                "entries",
                format!("competitor {} is entered more than once", entry.id),
            ));
        }
    }
    Ok(())
}

/// Generate heats and lane assignments for one event.
pub fn generate_seeding(
    entries: &[CompetitorEntry],
    classification: EventClassification,
    config: &SeedingConfig,
) -> Result<SeedingOutcome> {
    check_unique_ids(entries)?;

    let sort_by = config.sort_by();
    let ranked = ranking::rank(entries, sort_by, classification, Traversal::BestFirst);
    let ranked_ids: Vec<&str> = ranked.iter().map(|e| e.id.as_str()).collect();

    let mut plan = partition::plan_for(entries.len(), config)?;
    let lanes = seeding::seed(&ranked_ids, &plan, Placement::from_config(config))?;

    if config.method() == SeedingMethod::Manual {
        let placed = seeding::occupancy(&plan, &lanes);
        for (heat, athletes) in plan.heats.iter_mut().zip(placed) {
            heat.athletes = athletes;
        }
    }

    let mut warnings = Vec::new();
    if plan.fallback {
        warnings.push(format!(
            "no heat count fits {} usable lane(s); using {} heats of {} lanes, check venue capacity",
            plan.usable_lanes(config.max_lanes()),
            plan.heat_count(),
            config.max_lanes()
        ));
    }
    if sort_by.is_performance() {
        let unmarked = entries
            .iter()
            .filter(|e| {
                !performance::parse_opt(ranking::raw_mark(e, sort_by), classification).has_mark
            })
            .count();
        if unmarked > 0 {
            warnings.push(format!(
                "{unmarked} competitor(s) have no {sort_by} mark and were seeded as weakest"
            ));
        }
    }

    obs::emit_plan_generated(
        entries.len(),
        plan.heat_count(),
        config.method().as_str(),
        sort_by.as_str(),
    );
    METRICS.record_plan(entries.len() as u64);
    info!(
        lanes = lanes.len(),
        warnings = warnings.len(),
        "seeding complete"
    );

    let digest = plan_digest(&lanes);
    Ok(SeedingOutcome {
        classification,
        sort_by,
        method: config.method(),
        plan,
        lanes,
        warnings,
        digest,
    })
}
