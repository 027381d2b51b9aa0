//! Competitor entries: one registration in one event.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::performance::split_year_suffix;

/// A raw performance mark as recorded upstream, e.g. `"10.84"`, `"1:02,50"`,
/// `"18.50 m/2023"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mark {
    /// Raw mark text, parsed on demand.
    pub raw: String,

    /// Date the mark was achieved, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl Mark {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            date: None,
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Year of the mark: the recorded date if present, else a trailing
    /// `/YYYY` suffix on the raw text.
    pub fn year(&self) -> Option<i32> {
        self.date
            .map(|d| d.year())
            .or_else(|| split_year_suffix(&self.raw).1)
    }
}

/// One competitor registered in one event.
///
/// Immutable input to the engine, produced by the registration source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompetitorEntry {
    /// Stable registration identifier.
    pub id: String,

    pub first_name: String,

    pub last_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub club: Option<String>,

    /// Start number, unique within a competition once assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bib: Option<String>,

    /// Declared qualifying mark.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_mark: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_best: Option<Mark>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season_best: Option<Mark>,
}

impl CompetitorEntry {
    /// Create an entry with only identity fields set.
    pub fn new(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            club: None,
            bib: None,
            seed_mark: None,
            personal_best: None,
            season_best: None,
        }
    }

    pub fn with_club(mut self, club: impl Into<String>) -> Self {
        self.club = Some(club.into());
        self
    }

    pub fn with_bib(mut self, bib: impl Into<String>) -> Self {
        self.bib = Some(bib.into());
        self
    }

    pub fn with_seed_mark(mut self, mark: impl Into<String>) -> Self {
        self.seed_mark = Some(mark.into());
        self
    }

    pub fn with_personal_best(mut self, mark: Mark) -> Self {
        self.personal_best = Some(mark);
        self
    }

    pub fn with_season_best(mut self, mark: Mark) -> Self {
        self.season_best = Some(mark);
        self
    }

    /// "First Last" display name.
    pub fn display_name(&self) -> String {
        match (self.first_name.trim(), self.last_name.trim()) {
            ("", last) => last.to_string(),
            (first, "") => first.to_string(),
            (first, last) => format!("{first} {last}"),
        }
    }
}
