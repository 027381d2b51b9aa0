//! Ranking comparator and start-list ordering.
//!
//! [`compare`] is a pure best-first order: `Ordering::Less` means `a` ranks
//! ahead of `b`. Direction is chosen by the caller through [`Traversal`],
//! never inside the comparator. Sorting is stable, so equal-ranked entries
//! keep their input order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::collation;
use crate::domain::{CompetitorEntry, EventClassification, SortKey};
use crate::performance::{self, ParsedPerformance};

/// Order in which a ranked list is traversed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Traversal {
    #[default]
    BestFirst,
    WeakestFirst,
}

/// Per-entry sort key, computed once before sorting.
#[derive(Debug, Clone)]
enum RankKey<'a> {
    Performance(ParsedPerformance),
    Bib(BibKey<'a>),
    Club(Option<&'a str>),
    Name { last: &'a str, first: &'a str },
}

/// Numeric bibs first, then other bib text, then entries without a bib.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum BibKey<'a> {
    Numeric(u64),
    Text(&'a str),
    Missing,
}

/// The raw mark `key` ranks on; `None` for the non-performance keys.
pub(crate) fn raw_mark(entry: &CompetitorEntry, key: SortKey) -> Option<&str> {
    match key {
        SortKey::Pb => entry.personal_best.as_ref().map(|m| m.raw.as_str()),
        SortKey::Sb => entry.season_best.as_ref().map(|m| m.raw.as_str()),
        SortKey::SeedTime => entry.seed_mark.as_deref(),
        SortKey::Name | SortKey::Bib | SortKey::Club => None,
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn rank_key(
    entry: &CompetitorEntry,
    key: SortKey,
    classification: EventClassification,
) -> RankKey<'_> {
    match key {
        SortKey::Pb | SortKey::Sb | SortKey::SeedTime => RankKey::Performance(
            performance::parse_opt(raw_mark(entry, key), classification),
        ),
        SortKey::Bib => RankKey::Bib(match non_blank(entry.bib.as_deref()) {
            Some(bib) => bib
                .parse::<u64>()
                .map(BibKey::Numeric)
                .unwrap_or(BibKey::Text(bib)),
            None => BibKey::Missing,
        }),
        SortKey::Club => RankKey::Club(non_blank(entry.club.as_deref())),
        SortKey::Name => RankKey::Name {
            last: entry.last_name.as_str(),
            first: entry.first_name.as_str(),
        },
    }
}

fn compare_performance(
    a: &ParsedPerformance,
    b: &ParsedPerformance,
    classification: EventClassification,
) -> Ordering {
    match (a.has_mark, b.has_mark) {
        (false, false) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) if classification.lower_is_better() => a.value.total_cmp(&b.value),
        (true, true) => b.value.total_cmp(&a.value),
    }
}

fn compare_keys(a: &RankKey<'_>, b: &RankKey<'_>, classification: EventClassification) -> Ordering {
    match (a, b) {
        (RankKey::Performance(a), RankKey::Performance(b)) => {
            compare_performance(a, b, classification)
        }
        (RankKey::Bib(a), RankKey::Bib(b)) => match (a, b) {
            (BibKey::Text(a), BibKey::Text(b)) => collation::compare(a, b),
            _ => a.cmp(b),
        },
        (RankKey::Club(a), RankKey::Club(b)) => match (a, b) {
            (Some(a), Some(b)) => collation::compare(a, b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        (
            RankKey::Name {
                last: la,
                first: fa,
            },
            RankKey::Name {
                last: lb,
                first: fb,
            },
        ) => collation::compare(la, lb).then_with(|| collation::compare(fa, fb)),
        // Keys are always built from one SortKey.
        _ => Ordering::Equal,
    }
}

/// Compare two entries best-first under `key`.
///
/// For performance keys an entry without a mark never outranks one with a
/// mark; two entries without marks compare equal.
pub fn compare(
    a: &CompetitorEntry,
    b: &CompetitorEntry,
    key: SortKey,
    classification: EventClassification,
) -> Ordering {
    compare_keys(
        &rank_key(a, key, classification),
        &rank_key(b, key, classification),
        classification,
    )
}

/// Stable ranking of `entries` under `key` in the requested traversal order.
pub fn rank<'a>(
    entries: &'a [CompetitorEntry],
    key: SortKey,
    classification: EventClassification,
    traversal: Traversal,
) -> Vec<&'a CompetitorEntry> {
    let mut keyed: Vec<(RankKey<'a>, &'a CompetitorEntry)> = entries
        .iter()
        .map(|e| (rank_key(e, key, classification), e))
        .collect();

    match traversal {
        Traversal::BestFirst => keyed.sort_by(|a, b| compare_keys(&a.0, &b.0, classification)),
        Traversal::WeakestFirst => {
            keyed.sort_by(|a, b| compare_keys(&b.0, &a.0, classification))
        }
    }

    keyed.into_iter().map(|(_, e)| e).collect()
}

/// One row of a rendered start list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StartListRow {
    /// 1-based position in traversal order.
    pub position: usize,
    pub competitor_id: String,
    pub name: String,
    pub club: Option<String>,
    pub bib: Option<String>,
    /// Canonical rendering of the ranking mark, for performance keys.
    pub mark: Option<String>,
}

/// Start list sorted by `key`, e.g. by personal best or seed time.
pub fn start_list(
    entries: &[CompetitorEntry],
    key: SortKey,
    classification: EventClassification,
    traversal: Traversal,
) -> Vec<StartListRow> {
    rank(entries, key, classification, traversal)
        .into_iter()
        .enumerate()
        .map(|(i, entry)| StartListRow {
            position: i + 1,
            competitor_id: entry.id.clone(),
            name: entry.display_name(),
            club: entry.club.clone(),
            bib: entry.bib.clone(),
            mark: key
                .is_performance()
                .then(|| {
                    performance::parse_opt(raw_mark(entry, key), classification)
                        .display(classification)
                })
                .flatten(),
        })
        .collect()
}
