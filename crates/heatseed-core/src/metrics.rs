//! Process-wide counters for seeding activity.
//!
//! Counters are bumped at the call site and emitted together by
//! [`Metrics::flush`] as one `tracing::info!` event.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Atomic counters; no allocation, no locking.
pub struct Metrics {
    plans_generated: AtomicU64,
    athletes_seeded: AtomicU64,
    fallback_plans: AtomicU64,
    bibs_allocated: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            plans_generated: AtomicU64::new(0),
            athletes_seeded: AtomicU64::new(0),
            fallback_plans: AtomicU64::new(0),
            bibs_allocated: AtomicU64::new(0),
        }
    }

    /// Record one generated plan covering `athletes` competitors.
    pub fn record_plan(&self, athletes: u64) {
        self.plans_generated.fetch_add(1, Ordering::Relaxed);
        self.athletes_seeded.fetch_add(athletes, Ordering::Relaxed);
        tracing::trace!(metric = "plans_generated", "counter incremented");
    }

    pub fn inc_fallback_plans(&self) {
        self.fallback_plans.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "fallback_plans", "counter incremented");
    }

    pub fn add_bibs_allocated(&self, count: u64) {
        self.bibs_allocated.fetch_add(count, Ordering::Relaxed);
        tracing::trace!(metric = "bibs_allocated", count, "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            plans_generated = self.plans_generated(),
            athletes_seeded = self.athletes_seeded(),
            fallback_plans = self.fallback_plans(),
            bibs_allocated = self.bibs_allocated(),
        );
    }

    pub fn plans_generated(&self) -> u64 {
        self.plans_generated.load(Ordering::Relaxed)
    }

    pub fn athletes_seeded(&self) -> u64 {
        self.athletes_seeded.load(Ordering::Relaxed)
    }

    pub fn fallback_plans(&self) -> u64 {
        self.fallback_plans.load(Ordering::Relaxed)
    }

    pub fn bibs_allocated(&self) -> u64 {
        self.bibs_allocated.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.plans_generated.store(0, Ordering::Relaxed);
        self.athletes_seeded.store(0, Ordering::Relaxed);
        self.fallback_plans.store(0, Ordering::Relaxed);
        self.bibs_allocated.store(0, Ordering::Relaxed);
    }
}
