//! Seeding configuration.
//!
//! A [`SeedingDraft`] is the loosely-typed, editable form a UI or config file
//! produces. [`SeedingDraft::resolve`] validates it into the immutable
//! [`SeedingConfig`] snapshot the engine consumes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::{Result, SeedingError};

/// Default venue lane count.
pub const DEFAULT_MAX_LANES: u32 = 8;

/// Key used to rank competitors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortKey {
    /// Personal best.
    Pb,
    /// Season best.
    Sb,
    /// Declared seed mark.
    SeedTime,
    /// Last name, then first name.
    Name,
    /// Bib number, ascending.
    Bib,
    /// Club name.
    Club,
}

impl SortKey {
    /// Whether this key ranks by a performance mark.
    pub fn is_performance(self) -> bool {
        matches!(self, Self::Pb | Self::Sb | Self::SeedTime)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pb => "PB",
            Self::Sb => "SB",
            Self::SeedTime => "SEED_TIME",
            Self::Name => "NAME",
            Self::Bib => "BIB",
            Self::Club => "CLUB",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = SeedingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "PB" => Ok(Self::Pb),
            "SB" => Ok(Self::Sb),
            "SEED_TIME" | "SEED" => Ok(Self::SeedTime),
            "NAME" => Ok(Self::Name),
            "BIB" => Ok(Self::Bib),
            "CLUB" => Ok(Self::Club),
            _ => Err(SeedingError::invalid_config(
                "sort_by",
                format!("unknown sort key '{s}' (expected PB, SB, SEED_TIME, NAME, BIB or CLUB)"),
            )),
        }
    }
}

/// How competitors are placed into lanes within a heat.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SeedingMethod {
    /// Strongest in the centre lane, then alternating right/left outward.
    #[default]
    Zigzag,
    /// Strongest in the first available lane, then in order.
    Straight,
    /// Shuffled within each heat.
    Random,
    /// Caller-supplied placements, validated only.
    Manual,
}

impl SeedingMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zigzag => "zigzag",
            Self::Straight => "straight",
            Self::Random => "random",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for SeedingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeedingMethod {
    type Err = SeedingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zigzag" => Ok(Self::Zigzag),
            "straight" => Ok(Self::Straight),
            "random" => Ok(Self::Random),
            "manual" => Ok(Self::Manual),
            _ => Err(SeedingError::invalid_config(
                "seeding_method",
                format!("unknown seeding method '{s}' (expected zigzag, straight, random or manual)"),
            )),
        }
    }
}

/// Resolved heat topology.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HeatLayout {
    /// Minimum heat count derived from athlete count and venue lanes.
    Auto,
    /// Caller-chosen heat count, every heat with the same lane count.
    Fixed { heats: u32, lanes: u32 },
    /// Explicit lane count per heat, in heat order.
    Custom { lanes: Vec<u32> },
}

/// One caller-chosen placement for the `manual` method.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManualPlacement {
    pub competitor_id: String,
    pub heat: u32,
    pub lane: u32,
}

/// Editable seeding configuration as produced by a form or config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeedingDraft {
    pub number_of_heats: Option<u32>,
    pub lanes_per_heat: Option<u32>,
    pub max_lanes: u32,
    pub sort_by: String,
    pub seeding_method: String,
    pub skip_lane1: bool,
    pub auto_calculate: bool,
    pub custom_lanes_per_heat: Option<Vec<u32>>,
    pub random_seed: Option<u64>,
    pub manual_assignments: Vec<ManualPlacement>,
}

impl Default for SeedingDraft {
    fn default() -> Self {
        Self {
            number_of_heats: None,
            lanes_per_heat: None,
            max_lanes: DEFAULT_MAX_LANES,
            sort_by: SortKey::SeedTime.as_str().to_string(),
            seeding_method: SeedingMethod::Zigzag.as_str().to_string(),
            skip_lane1: false,
            auto_calculate: true,
            custom_lanes_per_heat: None,
            random_seed: None,
            manual_assignments: Vec::new(),
        }
    }
}

impl SeedingDraft {
    /// Validate the draft into an immutable [`SeedingConfig`].
    ///
    /// Layout precedence: non-empty `custom_lanes_per_heat`, then
    /// `auto_calculate`, then fixed `number_of_heats`/`lanes_per_heat`.
    pub fn resolve(&self) -> Result<SeedingConfig> {
        let sort_by: SortKey = self.sort_by.parse()?;
        let method: SeedingMethod = self.seeding_method.parse()?;

        let min_lanes = if self.skip_lane1 { 2 } else { 1 };
        if self.max_lanes < min_lanes {
            return Err(SeedingError::invalid_config(
                "max_lanes",
                format!(
                    "venue needs at least {min_lanes} lane(s){}, got {}",
                    if self.skip_lane1 {
                        " when lane 1 is skipped"
                    } else {
                        ""
                    },
                    self.max_lanes
                ),
            ));
        }

        let check_lanes = |field: &str, lanes: u32| -> Result<()> {
            if lanes < min_lanes {
                return Err(SeedingError::invalid_config(
                    field,
                    format!("a heat needs at least {min_lanes} lane(s), got {lanes}"),
                ));
            }
            if lanes > self.max_lanes {
                return Err(SeedingError::invalid_config(
                    field,
                    format!(
                        "{lanes} lanes exceeds the venue maximum of {}",
                        self.max_lanes
                    ),
                ));
            }
            Ok(())
        };

        let layout = match self.custom_lanes_per_heat.as_deref() {
            Some(custom) if !custom.is_empty() => {
                for &lanes in custom {
                    check_lanes("custom_lanes_per_heat", lanes)?;
                }
                HeatLayout::Custom {
                    lanes: custom.to_vec(),
                }
            }
            _ if self.auto_calculate => {
                if self.number_of_heats.is_some() || self.lanes_per_heat.is_some() {
                    debug!("auto_calculate set, ignoring explicit heat and lane counts");
                }
                HeatLayout::Auto
            }
            _ => {
                let heats = match self.number_of_heats {
                    Some(h) if h > 0 => h,
                    _ => {
                        return Err(SeedingError::invalid_config(
                            "number_of_heats",
                            "required and positive when auto_calculate is off",
                        ))
                    }
                };
                let lanes = self.lanes_per_heat.unwrap_or(self.max_lanes);
                check_lanes("lanes_per_heat", lanes)?;
                HeatLayout::Fixed { heats, lanes }
            }
        };

        if method != SeedingMethod::Manual && !self.manual_assignments.is_empty() {
            warn!(
                method = %method,
                placements = self.manual_assignments.len(),
                "manual placements ignored for non-manual seeding method"
            );
        }

        let config = SeedingConfig {
            layout,
            max_lanes: self.max_lanes,
            sort_by,
            method,
            skip_lane1: self.skip_lane1,
            random_seed: self.random_seed,
            manual_assignments: if method == SeedingMethod::Manual {
                self.manual_assignments.clone()
            } else {
                Vec::new()
            },
        };
        debug!(?config, "seeding configuration resolved");
        Ok(config)
    }
}

/// Validated, immutable seeding configuration.
///
/// Only obtainable through [`SeedingDraft::resolve`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeedingConfig {
    layout: HeatLayout,
    max_lanes: u32,
    sort_by: SortKey,
    method: SeedingMethod,
    skip_lane1: bool,
    random_seed: Option<u64>,
    manual_assignments: Vec<ManualPlacement>,
}

impl SeedingConfig {
    pub fn layout(&self) -> &HeatLayout {
        &self.layout
    }

    pub fn max_lanes(&self) -> u32 {
        self.max_lanes
    }

    pub fn sort_by(&self) -> SortKey {
        self.sort_by
    }

    pub fn method(&self) -> SeedingMethod {
        self.method
    }

    pub fn skip_lane1(&self) -> bool {
        self.skip_lane1
    }

    pub fn random_seed(&self) -> Option<u64> {
        self.random_seed
    }

    pub fn manual_assignments(&self) -> &[ManualPlacement] {
        &self.manual_assignments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_draft_resolves_to_auto_zigzag() {
        let config = SeedingDraft::default().resolve().unwrap();
        assert_eq!(config.layout(), &HeatLayout::Auto);
        assert_eq!(config.method(), SeedingMethod::Zigzag);
        assert_eq!(config.sort_by(), SortKey::SeedTime);
        assert_eq!(config.max_lanes(), DEFAULT_MAX_LANES);
    }

    #[test]
    fn test_sort_key_parsing_is_lenient_on_case() {
        assert_eq!("pb".parse::<SortKey>().unwrap(), SortKey::Pb);
        assert_eq!("seed-time".parse::<SortKey>().unwrap(), SortKey::SeedTime);
        assert_eq!("Club".parse::<SortKey>().unwrap(), SortKey::Club);
    }

    #[test]
    fn test_unknown_sort_key_is_invalid_configuration() {
        let draft = SeedingDraft {
            sort_by: "FASTEST".to_string(),
            ..Default::default()
        };
        let err = draft.resolve().unwrap_err();
        assert!(matches!(
            err,
            SeedingError::InvalidConfiguration { ref field, .. } if field == "sort_by"
        ));
    }

    #[test]
    fn test_unknown_method_is_invalid_configuration() {
        let draft = SeedingDraft {
            seeding_method: "serpentine".to_string(),
            ..Default::default()
        };
        let err = draft.resolve().unwrap_err();
        assert!(err.to_string().contains("serpentine"));
    }

    #[test]
    fn test_skip_lane1_needs_two_lanes() {
        let draft = SeedingDraft {
            max_lanes: 1,
            skip_lane1: true,
            ..Default::default()
        };
        assert!(draft.resolve().is_err());
    }

    #[test]
    fn test_custom_lanes_take_precedence_over_auto() {
        let draft = SeedingDraft {
            custom_lanes_per_heat: Some(vec![8, 6]),
            auto_calculate: true,
            ..Default::default()
        };
        let config = draft.resolve().unwrap();
        assert_eq!(config.layout(), &HeatLayout::Custom { lanes: vec![8, 6] });
    }

    #[test]
    fn test_custom_lanes_above_venue_max_rejected() {
        let draft = SeedingDraft {
            custom_lanes_per_heat: Some(vec![8, 9]),
            ..Default::default()
        };
        assert!(draft.resolve().is_err());
    }

    #[test]
    fn test_fixed_layout_requires_heat_count() {
        let draft = SeedingDraft {
            auto_calculate: false,
            ..Default::default()
        };
        assert!(draft.resolve().is_err());

        let draft = SeedingDraft {
            auto_calculate: false,
            number_of_heats: Some(3),
            ..Default::default()
        };
        assert_eq!(
            draft.resolve().unwrap().layout(),
            &HeatLayout::Fixed { heats: 3, lanes: 8 }
        );
    }

    #[test]
    fn test_manual_placements_dropped_for_other_methods() {
        let draft = SeedingDraft {
            manual_assignments: vec![ManualPlacement {
                competitor_id: "a".to_string(),
                heat: 1,
                lane: 1,
            }],
            ..Default::default()
        };
        assert!(draft.resolve().unwrap().manual_assignments().is_empty());
    }

    #[test]
    fn test_draft_deserializes_from_partial_json() {
        let draft: SeedingDraft =
            serde_json::from_str(r#"{"max_lanes": 6, "skip_lane1": true, "sort_by": "PB"}"#)
                .unwrap();
        assert_eq!(draft.max_lanes, 6);
        assert!(draft.auto_calculate);
        assert_eq!(draft.seeding_method, "zigzag");
    }
}
