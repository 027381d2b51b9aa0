//! Event classification: which way is "better" for an event's marks.
//!
//! Classification is computed once per event from a normalized [`EventCode`]
//! and passed into the parser and comparator as a tagged value.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::collation::fold;

/// Whether an event's primary metric is lower-is-better or higher-is-better.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventClassification {
    /// Running, hurdles, walks, relays. Marks are times in seconds.
    TimeBased,
    /// Jumps, vaults, throws and points-scored combined events.
    /// Marks are meters (or points).
    DistanceBased,
}

impl EventClassification {
    /// Classify a free-text event name, e.g. `"100m Hurdles"` or `"Shot Put"`.
    pub fn for_event(name: &str) -> Self {
        EventCode::normalize(name).classification()
    }

    pub fn lower_is_better(self) -> bool {
        matches!(self, Self::TimeBased)
    }

    /// Sentinel value that ranks below every real mark.
    pub fn no_mark_value(self) -> f64 {
        if self.lower_is_better() {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        }
    }
}

impl fmt::Display for EventClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimeBased => write!(f, "time"),
            Self::DistanceBased => write!(f, "distance"),
        }
    }
}

/// Standard field event abbreviations.
const FIELD_CODES: &[&str] = &["hj", "pv", "lj", "tj", "sp", "dt", "ht", "jt", "wt"];

/// Fragments of normalized field and combined event names (English and French).
const FIELD_FRAGMENTS: &[&str] = &[
    "jump",
    "vault",
    "shot",
    "put",
    "discus",
    "hammer",
    "javelin",
    "throw",
    "hauteur",
    "perche",
    "longueur",
    "triplesaut",
    "poids",
    "disque",
    "marteau",
    "javelot",
    "athlon",
];

/// A normalized event code: lowercase ASCII-folded alphanumerics only.
///
/// `"100 m Haies"`, `"100m haies"` and `"100M-HAIES"` share one code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventCode(String);

impl EventCode {
    pub fn normalize(name: &str) -> Self {
        let code = fold(name)
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn classification(&self) -> EventClassification {
        let code = self.0.as_str();
        if FIELD_CODES.contains(&code) || FIELD_FRAGMENTS.iter().any(|f| code.contains(f)) {
            EventClassification::DistanceBased
        } else {
            EventClassification::TimeBased
        }
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
