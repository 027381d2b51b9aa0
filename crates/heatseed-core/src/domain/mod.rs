//! Domain models for the seeding engine.
//!
//! - `CompetitorEntry`: one registration in one event, with its marks
//! - `EventClassification`: lower-is-better vs higher-is-better events
//! - `SeedingDraft` / `SeedingConfig`: editable vs resolved configuration

pub mod competitor;
pub mod config;
pub mod error;
pub mod event;

pub use competitor::{CompetitorEntry, Mark};
pub use config::{
    HeatLayout, ManualPlacement, SeedingConfig, SeedingDraft, SeedingMethod, SortKey,
    DEFAULT_MAX_LANES,
};
pub use error::{Result, SeedingError};
pub use event::{EventClassification, EventCode};
