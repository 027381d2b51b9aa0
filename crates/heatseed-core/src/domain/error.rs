//! Domain-level error taxonomy for the seeding engine.
//!
//! Malformed performance strings are never errors (they degrade to "no mark").
//! Everything here is a configuration or allocation fault the caller can
//! surface with a specific corrective message.

/// Seeding engine errors.
#[derive(Debug, thiserror::Error)]
pub enum SeedingError {
    #[error("invalid configuration for {field}: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("heat {heat} cannot hold {athletes} athletes with {capacity} usable lanes")]
    CapacityExceeded {
        heat: u32,
        athletes: usize,
        capacity: u32,
    },

    #[error("invalid manual assignment: {0}")]
    InvalidManualAssignment(String),

    #[error("bib allocation conflict on {bib}: {reason}")]
    AllocationConflict { bib: String, reason: String },

    #[error("storage error: {0}")]
    Storage(String),
}

impl SeedingError {
    /// Shorthand for an [`SeedingError::InvalidConfiguration`].
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether the caller should treat this as a configuration problem
    /// (rejected before any seeding is attempted).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration { .. }
                | Self::CapacityExceeded { .. }
                | Self::InvalidManualAssignment(_)
        )
    }
}

/// Result type for seeding engine operations.
pub type Result<T> = std::result::Result<T, SeedingError>;
