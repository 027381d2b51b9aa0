//! Bib number allocation.
//!
//! Proposes sequential start numbers for confirmed registrations that have
//! none. Numbering starts at `max(starting_number, highest numeric bib + 1)`
//! and follows alphabetical order of athlete names. The allocator only
//! proposes; applying the result is the caller's job, and the read of
//! existing bibs plus the write of new ones must be serialized per
//! competition (see [`crate::store::allocate_and_apply`]).

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::collation;
use crate::domain::{Result, SeedingError};
use crate::metrics::METRICS;
use crate::obs;

/// A confirmed registration waiting for a bib.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BibCandidate {
    pub registration_id: String,
    pub first_name: String,
    pub last_name: String,
}

impl BibCandidate {
    pub fn new(
        registration_id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            registration_id: registration_id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BibAssignment {
    pub registration_id: String,
    pub bib: String,
}

/// Inclusive range of numbers handed out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BibRange {
    pub first: u32,
    pub last: u32,
}

/// Proposed bibs, in allocation order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BibAllocationResult {
    pub assignments: Vec<BibAssignment>,
    pub range: Option<BibRange>,
}

impl BibAllocationResult {
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Bib proposed for a registration.
    pub fn bib_for(&self, registration_id: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|a| a.registration_id == registration_id)
            .map(|a| a.bib.as_str())
    }
}

/// Numeric value of a bib string, if it is a plain positive integer.
pub fn numeric_bib(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok().filter(|&n| n > 0)
}

/// Allocate bibs to `candidates`, avoiding every numeric bib in `existing`.
///
/// Non-numeric existing bibs (`"X1"`) are ignored. Running twice on the same
/// snapshot yields the same result.
pub fn allocate<'a>(
    candidates: &[BibCandidate],
    existing: impl IntoIterator<Item = &'a str>,
    starting_number: u32,
) -> Result<BibAllocationResult> {
    if starting_number == 0 {
        return Err(SeedingError::invalid_config(
            "starting_number",
            "bib numbers start at 1 or above",
        ));
    }

    let mut taken = BTreeSet::new();
    for bib in existing {
        if let Some(n) = numeric_bib(bib) {
            if !taken.insert(n) {
                warn!(bib = n, "existing bib number is already shared by two registrations");
            }
        }
    }

    if candidates.is_empty() {
        return Ok(BibAllocationResult::default());
    }

    let floor = match taken.last() {
        Some(&max) => max
            .checked_add(1)
            .ok_or_else(|| SeedingError::AllocationConflict {
                bib: max.to_string(),
                reason: "highest existing bib leaves no room above it".to_string(),
            })?
            .max(starting_number),
        None => starting_number,
    };
    let last = u32::try_from(candidates.len() - 1)
        .ok()
        .and_then(|n| floor.checked_add(n))
        .ok_or_else(|| SeedingError::AllocationConflict {
            bib: floor.to_string(),
            reason: format!("{} bibs from {floor} overflow the numeric range", candidates.len()),
        })?;

    let mut ordered: Vec<&BibCandidate> = candidates.iter().collect();
    ordered.sort_by(|a, b| {
        collation::compare(&a.last_name, &b.last_name)
            .then_with(|| collation::compare(&a.first_name, &b.first_name))
    });

    let mut seen = HashSet::new();
    let mut assignments = Vec::with_capacity(ordered.len());
    for (number, candidate) in (floor..=last).zip(ordered) {
        if !seen.insert(candidate.registration_id.as_str()) {
            return Err(SeedingError::AllocationConflict {
                bib: number.to_string(),
                reason: format!(
                    "registration {} appears more than once in the batch",
                    candidate.registration_id
                ),
            });
        }
        if taken.contains(&number) {
            return Err(SeedingError::AllocationConflict {
                bib: number.to_string(),
                reason: "number already assigned in this competition".to_string(),
            });
        }
        assignments.push(BibAssignment {
            registration_id: candidate.registration_id.clone(),
            bib: number.to_string(),
        });
    }

    obs::emit_bibs_allocated(assignments.len(), floor, last);
    METRICS.add_bibs_allocated(assignments.len() as u64);

    Ok(BibAllocationResult {
        assignments,
        range: Some(BibRange { first: floor, last }),
    })
}
