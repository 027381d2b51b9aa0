//! Performance mark parsing.
//!
//! Converts raw mark strings (`"10.84"`, `"1:02,50"`, `"18.50 m/2023"`,
//! `"10.52 (+1.2)"`) into a comparable value in the event's canonical unit:
//! seconds for time-based events, meters for distance-based ones.
//!
//! Parsing never fails. Anything unparsable becomes "no mark", whose value
//! is the classification's weakest sentinel (`+inf` for times, `-inf` for
//! distances) so it ranks last without special-casing at comparison sites.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::EventClassification;

/// Parsed marks are quantized to thousandths of the canonical unit, so that
/// equivalent spellings produce bit-identical values.
const UNITS_PER_THOUSANDTH: f64 = 1000.0;

/// A mark reduced to a comparable number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedPerformance {
    /// Seconds or meters; the weakest sentinel when `has_mark` is false.
    pub value: f64,
    pub has_mark: bool,
}

impl ParsedPerformance {
    pub fn no_mark(classification: EventClassification) -> Self {
        Self {
            value: classification.no_mark_value(),
            has_mark: false,
        }
    }

    fn from_thousandths(thousandths: u64) -> Self {
        Self {
            value: thousandths as f64 / UNITS_PER_THOUSANDTH,
            has_mark: true,
        }
    }

    /// The numeric value, if there is a mark.
    pub fn mark_value(&self) -> Option<f64> {
        self.has_mark.then_some(self.value)
    }

    /// Render the mark canonically: `"10.84"`, `"1:02.50"`, `"2:13:05.00"`
    /// for times, `"18.50 m"` for distances.
    pub fn display(&self, classification: EventClassification) -> Option<String> {
        let value = self.mark_value()?;
        let rendered = match classification {
            EventClassification::TimeBased => format_time(value),
            EventClassification::DistanceBased => format!("{value:.2} m"),
        };
        Some(rendered)
    }
}

/// Parse a raw mark for an event of the given classification.
pub fn parse(raw: &str, classification: EventClassification) -> ParsedPerformance {
    let parsed = match classification {
        EventClassification::TimeBased => parse_time(raw),
        EventClassification::DistanceBased => parse_distance(raw),
    };
    parsed
        .map(ParsedPerformance::from_thousandths)
        .unwrap_or_else(|| ParsedPerformance::no_mark(classification))
}

/// [`parse`] for an optional raw mark; `None` is "no mark".
pub fn parse_opt(raw: Option<&str>, classification: EventClassification) -> ParsedPerformance {
    match raw {
        Some(raw) => parse(raw, classification),
        None => ParsedPerformance::no_mark(classification),
    }
}

fn year_suffix_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(?s)(?P<mark>.*?)\s*/\s*(?P<year>\d{4})\s*$").ok())
        .as_ref()
}

fn annotation_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\([^)]*\)").ok())
        .as_ref()
}

/// Split a trailing `/YYYY` year annotation off a raw mark.
pub fn split_year_suffix(raw: &str) -> (&str, Option<i32>) {
    let Some(caps) = year_suffix_pattern().and_then(|re| re.captures(raw)) else {
        return (raw, None);
    };
    match (caps.name("mark"), caps.name("year")) {
        (Some(mark), Some(year)) => (mark.as_str(), year.as_str().parse().ok()),
        _ => (raw, None),
    }
}

/// Strip year and bracketed annotations, normalize the decimal comma, and
/// keep only the first whitespace-separated token.
fn clean(raw: &str) -> Option<String> {
    let (mark, _) = split_year_suffix(raw.trim());
    let mark = match annotation_pattern() {
        Some(re) => re.replace_all(mark, " ").into_owned(),
        None => mark.to_string(),
    };
    let token = mark.split_whitespace().next()?;
    Some(token.replace(',', "."))
}

/// `value` in thousandths, or `None` when negative or too large for `u64`.
fn scale(value: f64) -> Option<u64> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let scaled = (value * UNITS_PER_THOUSANDTH).round();
    (scaled < u64::MAX as f64).then_some(scaled as u64)
}

fn to_thousandths(value: f64) -> Option<u64> {
    scale(value).filter(|&t| t >= 1)
}

fn is_decimal(part: &str) -> bool {
    !part.is_empty()
        && part.chars().all(|c| c.is_ascii_digit() || c == '.')
        && part.chars().filter(|&c| c == '.').count() <= 1
        && part != "."
}

/// `ss.xx`, `m:ss.xx` or `h:mm:ss.xx` to thousandths of a second.
fn parse_time(raw: &str) -> Option<u64> {
    let token = clean(raw)?;
    // Trailing annotation letters: hand timing "h", altitude "A", indoor "i", unit "s".
    let token = token.trim_end_matches(|c: char| c.is_ascii_alphabetic());

    let parts: Vec<&str> = token.split(':').collect();
    if parts.is_empty() || parts.len() > 3 || !parts.iter().all(|p| is_decimal(p)) {
        return None;
    }

    let (whole, seconds) = parts.split_at(parts.len() - 1);
    let mut thousandths: u64 = 0;
    for part in whole {
        if part.contains('.') {
            return None;
        }
        let unit: u64 = part.parse().ok()?;
        thousandths = thousandths.checked_add(unit)?.checked_mul(60)?;
    }
    thousandths = thousandths.checked_mul(1000)?;

    // The seconds field may be zero ("1:00.00") once minutes are present.
    let seconds = scale(seconds.first()?.parse().ok()?)?;
    let total = thousandths.checked_add(seconds)?;
    (total > 0).then_some(total)
}

/// Distances and heights; unit suffixes (`m`, `kg`, `pts`) are ignored.
fn parse_distance(raw: &str) -> Option<u64> {
    let token = clean(raw)?;
    let numeric: String = token
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if numeric.is_empty() {
        return None;
    }
    to_thousandths(numeric.parse().ok()?)
}

fn format_time(seconds: f64) -> String {
    let thousandths = (seconds * UNITS_PER_THOUSANDTH).round() as u64;
    let fraction = thousandths % 1000;
    let fraction = if fraction % 10 == 0 {
        format!("{:02}", fraction / 10)
    } else {
        format!("{fraction:03}")
    };
    let whole = thousandths / 1000;
    let (hours, minutes, secs) = (whole / 3600, (whole % 3600) / 60, whole % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}.{fraction}")
    } else if minutes > 0 {
        format!("{minutes}:{secs:02}.{fraction}")
    } else {
        format!("{secs}.{fraction}")
    }
}
