//! Work-experience totals from structured start/end rows.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::dates::normalize_date;
use crate::pipeline::structuring::types::ExperienceInterval;
use crate::pipeline::vocabulary::{normalize_label, Vocabulary};

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

/// "03/2015", "3-2015", "03.2015"
static NUMERIC_MONTH_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})[/.\-]((?:19|20)\d{2})\b").unwrap());

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\W\d_]+\.?").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Whole months from `self` to `later`, negative when `later` is earlier.
    pub fn months_until(self, later: YearMonth) -> i64 {
        (later.year as i64 - self.year as i64) * 12 + later.month as i64 - self.month as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceSummary {
    pub total_months: i64,
    /// Total in years, one decimal place.
    pub years: f64,
    pub earliest_start_year: i32,
}

/// Resolve a start or end cell to a month. A bare year means January.
pub fn parse_year_month(raw: &str, vocab: &Vocabulary) -> Option<YearMonth> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = normalize_date(raw, vocab) {
        return Some(YearMonth::of(date));
    }
    if let Some(caps) = NUMERIC_MONTH_YEAR.captures(raw) {
        let month: u32 = caps[1].parse().ok()?;
        let year: i32 = caps[2].parse().ok()?;
        if (1..=12).contains(&month) {
            return Some(YearMonth { year, month });
        }
    }
    let year: i32 = YEAR.find(raw)?.as_str().parse().ok()?;
    let lowered = raw.to_lowercase();
    let month = WORD
        .find_iter(&lowered)
        .find_map(|w| vocab.month_number(w.as_str()))
        .unwrap_or(1);
    Some(YearMonth { year, month })
}

/// "Present", "till date", "à ce jour" and similar end markers.
fn is_ongoing(raw: &str, vocab: &Vocabulary) -> bool {
    let normalized = normalize_label(raw);
    if normalized.is_empty() || vocab.is_present_keyword(&normalized) {
        return true;
    }
    let padded = format!(" {normalized} ");
    vocab
        .present_keywords
        .iter()
        .filter(|k| k.chars().count() > 4)
        .any(|k| padded.contains(&format!(" {k} ")))
}

/// Sum the months of every interval whose start resolves.
///
/// An empty or "present" end counts up to `today`. An end that is present but
/// unreadable contributes no months, though its start still counts towards
/// the earliest start year. `None` when no interval has a readable start.
pub fn summarize(
    intervals: &[ExperienceInterval],
    today: NaiveDate,
    vocab: &Vocabulary,
) -> Option<ExperienceSummary> {
    let now = YearMonth::of(today);
    let mut total_months = 0i64;
    let mut earliest: Option<i32> = None;

    for interval in intervals {
        let Some(start) = parse_year_month(&interval.start, vocab) else {
            tracing::debug!(start = %interval.start, "Skipping experience row with unreadable start");
            continue;
        };
        earliest = Some(earliest.map_or(start.year, |e| e.min(start.year)));

        let end = if is_ongoing(&interval.end, vocab) {
            Some(now)
        } else {
            parse_year_month(&interval.end, vocab)
        };
        if let Some(end) = end {
            let months = start.months_until(end.min(now));
            if months > 0 {
                total_months += months;
            }
        }
    }

    earliest.map(|earliest_start_year| ExperienceSummary {
        total_months,
        years: (total_months as f64 / 12.0 * 10.0).round() / 10.0,
        earliest_start_year,
    })
}

/// Whole years elapsed since a career start year.
pub fn years_since(start_year: i32, today: NaiveDate) -> i64 {
    (today.year() - start_year).max(0) as i64
}
