//! Observability tests for seeding and bib allocation tracing.
//!
//! These tests verify that structured tracing events are emitted for plan
//! generation, partition fallback and bib allocation.

use heatseed_core::{
    allocate_bibs, emit_bibs_allocated, emit_partition_fallback, emit_plan_generated,
    generate_seeding, BibCandidate, CompetitorEntry, EventClassification, SeedingDraft,
    SeedingSpan,
};
use tracing_test::traced_test;

/// Test: emit_plan_generated creates an info-level event
#[traced_test]
#[test]
fn test_emit_plan_generated_logs_method_and_sort_key() {
    emit_plan_generated(17, 3, "zigzag", "SEED_TIME");

    assert!(logs_contain("seeding.plan_generated"));
    assert!(logs_contain("zigzag"));
}

/// Test: emit_partition_fallback creates a warn-level event
#[traced_test]
#[test]
fn test_emit_partition_fallback_logs_warning() {
    emit_partition_fallback(9, 2, 9);

    assert!(logs_contain("seeding.partition_fallback"));
    assert!(logs_contain("WARN"));
}

/// Test: emit_bibs_allocated records the handed-out range
#[traced_test]
#[test]
fn test_emit_bibs_allocated_logs_range() {
    emit_bibs_allocated(3, 8, 10);

    assert!(logs_contain("bibs.allocated"));
}

/// Test: SeedingSpan::enter tags events with the event id
#[traced_test]
#[test]
fn test_seeding_span_tags_events() {
    let span = SeedingSpan::enter("100m-heats");
    emit_plan_generated(4, 1, "straight", "PB");
    drop(span);

    assert!(logs_contain("100m-heats"));
}

/// Test: a full seeding run emits its plan event
#[traced_test]
#[test]
fn test_generate_seeding_emits_plan_generated() {
    let entries: Vec<CompetitorEntry> = (1..=5)
        .map(|i| CompetitorEntry::new(format!("r{i}"), "Runner", format!("N{i}")))
        .collect();
    let config = SeedingDraft::default().resolve().expect("default config");

    generate_seeding(&entries, EventClassification::TimeBased, &config).expect("seeding");

    assert!(logs_contain("seeding.plan_generated"));
}

/// Test: existing duplicate bibs are reported while allocation proceeds
#[traced_test]
#[test]
fn test_duplicate_existing_bib_warns() {
    let candidates = [BibCandidate::new("n1", "Ann", "Adams")];
    let result = allocate_bibs(&candidates, ["4", "4"], 1).expect("allocation");

    assert_eq!(result.bib_for("n1"), Some("5"));
    assert!(logs_contain("already shared by two registrations"));
}
