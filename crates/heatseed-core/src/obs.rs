//! Structured observability hooks for seeding runs.
//!
//! - `SeedingSpan`: RAII guard scoping logs to one event/round
//! - Emission functions for plan generation, partition fallback and bib
//!   allocation
//!
//! Events are emitted at `info!` level, the fallback at `warn!`.

use tracing::{info, warn};

/// RAII guard that enters a span tagged with the event being seeded.
///
/// ```ignore
/// let _span = SeedingSpan::enter("100m-heats");
/// // every log below carries event_id = "100m-heats"
/// ```
pub struct SeedingSpan {
    _span: tracing::span::EnteredSpan,
}

impl SeedingSpan {
    pub fn enter(event_id: &str) -> Self {
        let span = tracing::info_span!("heatseed.seeding", event_id = %event_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: a heat plan was generated.
pub fn emit_plan_generated(athletes: usize, heats: usize, method: &str, sort_by: &str) {
    info!(
        event = "seeding.plan_generated",
        athletes = athletes,
        heats = heats,
        method = %method,
        sort_by = %sort_by,
    );
}

/// Emit event: no heat count within the search bound fit the venue.
///
/// The plan still exists; callers should warn the operator that the venue
/// capacity may be exceeded.
pub fn emit_partition_fallback(athletes: usize, max_lanes: u32, heats: usize) {
    warn!(
        event = "seeding.partition_fallback",
        athletes = athletes,
        max_lanes = max_lanes,
        heats = heats,
    );
}

/// Emit event: a batch of bibs was proposed.
pub fn emit_bibs_allocated(count: usize, first: u32, last: u32) {
    info!(
        event = "bibs.allocated",
        count = count,
        first = first,
        last = last
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeding_span_create() {
        let _span = SeedingSpan::enter("test-event");
        emit_plan_generated(8, 1, "zigzag", "PB");
    }
}
