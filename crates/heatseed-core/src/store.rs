//! Collaborator seams: where registrations come from and where bibs go.
//!
//! The engine itself never touches storage. These traits describe what a
//! persistence layer must offer, [`MemoryRegistry`] satisfies them in memory,
//! and [`allocate_and_apply`] runs a bib batch under a per-competition lock
//! so the "read highest bib, then write new bibs" sequence cannot interleave.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bib::{self, numeric_bib, BibAllocationResult, BibCandidate};
use crate::domain::{CompetitorEntry, EventCode, Result, SeedingError};

/// Lifecycle status of a registration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    Withdrawn,
}

/// A registration as stored upstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Registration {
    pub competition_id: String,
    pub event: String,
    pub status: RegistrationStatus,
    pub entry: CompetitorEntry,
}

/// Supplies the eligible entries of one event.
pub trait RegistrationSource: Send + Sync {
    /// Confirmed entries of `event` in `competition_id`, in registration order.
    fn entries(&self, competition_id: &str, event: &str) -> Result<Vec<CompetitorEntry>>;
}

/// Reads and writes bib numbers for a competition.
pub trait BibStore: Send + Sync {
    /// Every bib currently held by a registration of the competition.
    fn existing_bibs(&self, competition_id: &str) -> Result<Vec<String>>;

    /// Confirmed registrations that have no bib yet.
    fn candidates_without_bib(&self, competition_id: &str) -> Result<Vec<BibCandidate>>;

    /// Persist a proposed allocation. Must refuse to overwrite an existing bib.
    fn apply_bibs(&self, competition_id: &str, result: &BibAllocationResult) -> Result<()>;
}

fn storage_lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| SeedingError::Storage("lock poisoned".to_string()))
}

fn has_bib(entry: &CompetitorEntry) -> bool {
    entry.bib.as_deref().is_some_and(|b| !b.trim().is_empty())
}

/// In-memory registration store.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    registrations: Mutex<Vec<Registration>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, registration: Registration) -> Result<()> {
        storage_lock(&self.registrations)?.push(registration);
        Ok(())
    }

    /// Snapshot of every stored registration.
    pub fn registrations(&self) -> Result<Vec<Registration>> {
        Ok(storage_lock(&self.registrations)?.clone())
    }
}

impl RegistrationSource for MemoryRegistry {
    fn entries(&self, competition_id: &str, event: &str) -> Result<Vec<CompetitorEntry>> {
        let code = EventCode::normalize(event);
        Ok(storage_lock(&self.registrations)?
            .iter()
            .filter(|r| {
                r.competition_id == competition_id
                    && r.status == RegistrationStatus::Confirmed
                    && EventCode::normalize(&r.event) == code
            })
            .map(|r| r.entry.clone())
            .collect())
    }
}

impl BibStore for MemoryRegistry {
    fn existing_bibs(&self, competition_id: &str) -> Result<Vec<String>> {
        Ok(storage_lock(&self.registrations)?
            .iter()
            .filter(|r| r.competition_id == competition_id)
            .filter_map(|r| r.entry.bib.clone())
            .collect())
    }

    fn candidates_without_bib(&self, competition_id: &str) -> Result<Vec<BibCandidate>> {
        Ok(storage_lock(&self.registrations)?
            .iter()
            .filter(|r| {
                r.competition_id == competition_id
                    && r.status == RegistrationStatus::Confirmed
                    && !has_bib(&r.entry)
            })
            .map(|r| {
                BibCandidate::new(
                    r.entry.id.clone(),
                    r.entry.first_name.clone(),
                    r.entry.last_name.clone(),
                )
            })
            .collect())
    }

    fn apply_bibs(&self, competition_id: &str, result: &BibAllocationResult) -> Result<()> {
        let mut registrations = storage_lock(&self.registrations)?;

        let taken: HashSet<u32> = registrations
            .iter()
            .filter(|r| r.competition_id == competition_id)
            .filter_map(|r| r.entry.bib.as_deref().and_then(numeric_bib))
            .collect();

        // Validate the whole batch before writing any of it.
        let mut targets = Vec::with_capacity(result.len());
        let mut batch_ids: HashSet<&str> = HashSet::new();
        let mut batch_bibs: HashSet<u32> = HashSet::new();
        for assignment in &result.assignments {
            if !batch_ids.insert(assignment.registration_id.as_str()) {
                return Err(SeedingError::AllocationConflict {
                    bib: assignment.bib.clone(),
                    reason: format!(
                        "registration {} appears more than once in the batch",
                        assignment.registration_id
                    ),
                });
            }
            let idx = registrations
                .iter()
                .position(|r| {
                    r.competition_id == competition_id && r.entry.id == assignment.registration_id
                })
                .ok_or_else(|| {
                    SeedingError::Storage(format!(
                        "registration {} not found in competition {competition_id}",
                        assignment.registration_id
                    ))
                })?;
            let current = registrations[idx]
                .entry
                .bib
                .as_deref()
                .filter(|b| !b.trim().is_empty());
            if let Some(current) = current {
                return Err(SeedingError::AllocationConflict {
                    bib: assignment.bib.clone(),
                    reason: format!(
                        "registration {} already holds bib {current}",
                        assignment.registration_id
                    ),
                });
            }
            if let Some(n) = numeric_bib(&assignment.bib) {
                if taken.contains(&n) {
                    return Err(SeedingError::AllocationConflict {
                        bib: assignment.bib.clone(),
                        reason: "number already assigned in this competition".to_string(),
                    });
                }
                if !batch_bibs.insert(n) {
                    return Err(SeedingError::AllocationConflict {
                        bib: assignment.bib.clone(),
                        reason: "number given twice in the batch".to_string(),
                    });
                }
            }
            targets.push(idx);
        }

        for (idx, assignment) in targets.into_iter().zip(&result.assignments) {
            registrations[idx].entry.bib = Some(assignment.bib.clone());
        }
        debug!(competition_id, applied = result.len(), "bibs applied");
        Ok(())
    }
}

/// One mutex per competition, handed out on demand.
///
/// Entries live as long as the `CompetitionLocks` value itself unless a
/// caller drops them with [`CompetitionLocks::release`] once a competition
/// is closed.
#[derive(Debug, Default)]
pub struct CompetitionLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CompetitionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding `competition_id`; the same `Arc` on every call.
    pub fn handle(&self, competition_id: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = storage_lock(&self.locks)?;
        Ok(Arc::clone(
            locks.entry(competition_id.to_string()).or_default(),
        ))
    }

    /// Forgets the lock for `competition_id`. Holders of an earlier handle
    /// keep it; the next `handle` call creates a fresh mutex.
    pub fn release(&self, competition_id: &str) -> Result<()> {
        let mut locks = storage_lock(&self.locks)?;
        if locks.remove(competition_id).is_some() {
            debug!(competition_id, "competition lock released");
        }
        Ok(())
    }
}

/// Allocate and persist bibs for every confirmed registration of a
/// competition that lacks one, holding the competition's lock throughout.
pub fn allocate_and_apply(
    store: &dyn BibStore,
    locks: &CompetitionLocks,
    competition_id: &str,
    starting_number: u32,
) -> Result<BibAllocationResult> {
    let handle = locks.handle(competition_id)?;
    let _guard = storage_lock(&handle)?;

    let existing = store.existing_bibs(competition_id)?;
    let candidates = store.candidates_without_bib(competition_id)?;
    let result = bib::allocate(
        &candidates,
        existing.iter().map(String::as_str),
        starting_number,
    )?;
    if !result.is_empty() {
        store.apply_bibs(competition_id, &result)?;
    }
    Ok(result)
}
