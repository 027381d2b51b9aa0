//! Heatseed Core Library
//!
//! Turns an event's confirmed entries into a start list: ranks competitors,
//! splits them into heats, assigns lanes and proposes bib numbers.

pub mod bib;
pub mod collation;
pub mod domain;
pub mod engine;
pub mod metrics;
pub mod obs;
pub mod partition;
pub mod performance;
pub mod ranking;
pub mod seeding;
pub mod store;
pub mod telemetry;

pub use domain::{
    CompetitorEntry, EventClassification, EventCode, HeatLayout, ManualPlacement, Mark, Result,
    SeedingConfig, SeedingDraft, SeedingError, SeedingMethod, SortKey, DEFAULT_MAX_LANES,
};

pub use bib::{
    allocate as allocate_bibs, BibAllocationResult, BibAssignment, BibCandidate, BibRange,
};
pub use engine::{generate_seeding, plan_digest, SeedingOutcome, SeedingRequest};
pub use partition::{HeatPlan, HeatSlot};
pub use performance::ParsedPerformance;
pub use ranking::{start_list, StartListRow, Traversal};
pub use seeding::{LaneAssignment, Placement};
pub use store::{
    allocate_and_apply, BibStore, CompetitionLocks, MemoryRegistry, Registration,
    RegistrationSource, RegistrationStatus,
};

pub use metrics::METRICS;
pub use obs::{emit_bibs_allocated, emit_partition_fallback, emit_plan_generated, SeedingSpan};
pub use telemetry::init_tracing;

/// Heatseed version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
