//! Qualification aggregation.
//!
//! Every entry is rendered as `"<description> - <year>"`, de-duplicated and
//! ordered newest first. Structured table rows are preferred; free text is
//! scanned line by line for degree keywords only when the form had none.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::structuring::types::{EducationEntry, QualificationEntry};
use crate::pipeline::vocabulary::Vocabulary;

/// Descriptions with fewer alphanumeric characters are dropped.
pub const MIN_DESCRIPTION_CHARS: usize = 2;

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

static TRAILING_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" - ((?:19|20)\d{2})$").unwrap());

static LINE_PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[()\-:,]").unwrap());

/// First plausible four-digit year in `raw`.
pub fn find_year(raw: &str) -> Option<&str> {
    YEAR.find(raw).map(|m| m.as_str())
}

/// Completion year of a range such as "2008 - 2012".
pub fn last_year(raw: &str) -> Option<&str> {
    YEAR.find_iter(raw).last().map(|m| m.as_str())
}

/// Render one entry. `None` when the description is too short to be useful.
pub fn format_entry(description: &str, year: Option<&str>) -> Option<String> {
    let desc = description
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let desc = desc.trim_matches(|c: char| c == '-' || c == ',' || c.is_whitespace());
    if desc.chars().filter(|c| c.is_alphanumeric()).count() < MIN_DESCRIPTION_CHARS {
        return None;
    }
    Some(match year {
        Some(y) => format!("{desc} - {y}"),
        None => desc.to_string(),
    })
}

/// Education rows: level and field of study, dated by the year column.
pub fn from_education(entries: &[EducationEntry]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|e| {
            let desc = [e.level.as_str(), e.field.as_str()]
                .iter()
                .filter(|s| !s.trim().is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(" ");
            format_entry(&desc, last_year(&e.year))
        })
        .collect()
}

/// Professional qualification rows: title, dated by the year column.
pub fn from_certifications(entries: &[QualificationEntry]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|q| format_entry(&q.title, last_year(&q.year)))
        .collect()
}

/// Free-text fallback: lines mentioning a degree keyword next to a year.
pub fn from_text(text: &str, vocab: &Vocabulary) -> Vec<String> {
    let Some(degree) = degree_regex(vocab) else {
        return Vec::new();
    };
    text.lines()
        .filter(|line| degree.is_match(line))
        .filter_map(|line| {
            let year = find_year(line)?;
            let without_year = line.replacen(year, "", 1);
            let cleaned = LINE_PUNCTUATION.replace_all(&without_year, " ");
            format_entry(&cleaned, Some(year))
        })
        .collect()
}

fn degree_regex(vocab: &Vocabulary) -> Option<Regex> {
    if vocab.degree_keywords.is_empty() {
        return None;
    }
    let alternation = vocab
        .degree_keywords
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    match Regex::new(&format!(r"(?i)\b(?:{alternation})\b")) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(error = %e, "Degree keyword list does not compile");
            None
        }
    }
}

/// De-duplicate, sort newest first (undated entries last) and join with newlines.
pub fn aggregate(entries: Vec<String>) -> String {
    let mut seen = HashSet::new();
    let mut unique: Vec<String> = entries
        .into_iter()
        .filter(|e| seen.insert(e.clone()))
        .collect();
    unique.sort_by_key(|e| std::cmp::Reverse(entry_year(e)));
    unique.join("\n")
}

fn entry_year(entry: &str) -> Option<u32> {
    TRAILING_YEAR
        .captures(entry)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
