//! Multilingual date normalization.
//!
//! Month names (English, French, Portuguese, full or abbreviated) become
//! numbers, ordinal suffixes and connector words are dropped, and the three
//! remaining parts are matched against day-month-year, year-month-day and
//! month-day-year templates in that order. When none fits, the year is
//! picked by magnitude.

use std::sync::LazyLock;

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use thiserror::Error;

use crate::pipeline::vocabulary::Vocabulary;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DateParseError {
    #[error("empty date")]
    Empty,

    #[error("unrecognised word '{0}'")]
    UnknownWord(String),

    #[error("expected day, month and year, found {0} parts")]
    WrongShape(usize),

    #[error("no valid calendar date")]
    Invalid,
}

static ORDINAL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(?:st|nd|rd|th|er|ère|ème|eme|º|ª)\b").unwrap());

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s,/\-.]+").unwrap());

/// Words joining date parts ("15 de março de 1990", "15th of March").
const CONNECTORS: &[&str] = &["de", "of", "the", "le", "du", "em"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Number {
    value: u32,
    digits: usize,
}

impl Number {
    fn is_full_year(self) -> bool {
        self.digits == 4 || self.value > 31
    }

    fn is_short(self) -> bool {
        self.digits <= 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Number(Number),
    Month(u32),
}

#[derive(Debug, Clone, Copy)]
enum Template {
    DayMonthYear,
    YearMonthDay,
    MonthDayYear,
}

const TEMPLATES: [Template; 3] = [
    Template::DayMonthYear,
    Template::YearMonthDay,
    Template::MonthDayYear,
];

/// Parse a free-form date string into a calendar date.
pub fn normalize_date(raw: &str, vocab: &Vocabulary) -> Result<NaiveDate, DateParseError> {
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() {
        return Err(DateParseError::Empty);
    }
    let stripped = ORDINAL_SUFFIX.replace_all(&lowered, "$1");

    let mut parts = Vec::with_capacity(3);
    for token in SEPARATORS.split(&stripped).filter(|t| !t.is_empty()) {
        if CONNECTORS.contains(&token) || vocab.is_weekday(token) {
            continue;
        }
        if token.chars().all(|c| c.is_ascii_digit()) {
            let value = token
                .parse::<u32>()
                .map_err(|_| DateParseError::UnknownWord(token.to_string()))?;
            parts.push(Part::Number(Number {
                value,
                digits: token.len(),
            }));
        } else if let Some(month) = vocab.month_number(token) {
            parts.push(Part::Month(month));
        } else {
            return Err(DateParseError::UnknownWord(token.to_string()));
        }
    }

    if parts.len() != 3 {
        return Err(DateParseError::WrongShape(parts.len()));
    }

    let numbers: Vec<Number> = parts
        .iter()
        .filter_map(|p| match p {
            Part::Number(n) => Some(*n),
            Part::Month(_) => None,
        })
        .collect();

    let month_word = parts.iter().find_map(|p| match p {
        Part::Month(m) => Some(*m),
        Part::Number(_) => None,
    });
    if let Some(month) = month_word {
        return from_named_month(month, &numbers);
    }

    let [a, b, c] = [numbers[0], numbers[1], numbers[2]];
    TEMPLATES
        .iter()
        .find_map(|t| apply_template(*t, a, b, c))
        .or_else(|| by_magnitude(&numbers))
        .ok_or(DateParseError::Invalid)
}

fn from_named_month(month: u32, numbers: &[Number]) -> Result<NaiveDate, DateParseError> {
    let [first, second] = match numbers {
        [first, second] => [*first, *second],
        _ => return Err(DateParseError::Invalid),
    };
    let (day, year) = if first.is_full_year() && !second.is_full_year() {
        (second.value, expand_year(first))
    } else {
        (first.value, expand_year(second))
    };
    NaiveDate::from_ymd_opt(year, month, day).ok_or(DateParseError::Invalid)
}

fn apply_template(template: Template, a: Number, b: Number, c: Number) -> Option<NaiveDate> {
    let year_shaped = |n: Number| n.digits == 4 || n.digits == 2;
    match template {
        Template::DayMonthYear if a.is_short() && b.is_short() && year_shaped(c) => {
            NaiveDate::from_ymd_opt(expand_year(c), b.value, a.value)
        }
        Template::YearMonthDay if a.digits == 4 && b.is_short() && c.is_short() => {
            NaiveDate::from_ymd_opt(a.value as i32, b.value, c.value)
        }
        Template::MonthDayYear if a.is_short() && b.is_short() && year_shaped(c) => {
            NaiveDate::from_ymd_opt(expand_year(c), a.value, b.value)
        }
        _ => None,
    }
}

/// Last resort: the year is the part that can only be a year, and a value
/// above 12 among the others must be the day.
fn by_magnitude(numbers: &[Number]) -> Option<NaiveDate> {
    let year_idx = numbers.iter().position(|n| n.is_full_year())?;
    let rest: Vec<u32> = numbers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != year_idx)
        .map(|(_, n)| n.value)
        .collect();
    let (x, y) = (rest[0], rest[1]);
    let (day, month) = if x > 12 {
        (x, y)
    } else if y > 12 {
        (y, x)
    } else {
        (x, y)
    };
    NaiveDate::from_ymd_opt(expand_year(numbers[year_idx]), month, day)
}

/// Two-digit years pivot on the current year: "90" is 1990, "05" is 2005.
fn expand_year(n: Number) -> i32 {
    if n.digits > 2 {
        return n.value as i32;
    }
    let current = Local::now().year();
    let century = current - current % 100;
    let candidate = century + n.value as i32;
    if candidate > current {
        candidate - 100
    } else {
        candidate
    }
}

/// ISO form used in field records.
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Human form used in the spreadsheet ("15 March 1990").
pub fn display_date(date: NaiveDate) -> String {
    date.format("%d %B %Y").to_string()
}

/// Re-render a stored ISO date for display. Anything else is returned as is.
pub fn display_from_iso(value: &str) -> String {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(display_date)
        .unwrap_or_else(|_| value.to_string())
}

/// Completed years between `dob` and `today`. `None` for future birth dates.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> Option<i64> {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    (age >= 0).then_some(age as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<NaiveDate, DateParseError> {
        normalize_date(raw, &Vocabulary::default())
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn numeric_day_first() {
        assert_eq!(parse("15/03/1990").unwrap(), ymd(1990, 3, 15));
        assert_eq!(parse("05.11.1987").unwrap(), ymd(1987, 11, 5));
    }

    #[test]
    fn iso_order() {
        assert_eq!(parse("1990-03-15").unwrap(), ymd(1990, 3, 15));
    }

    #[test]
    fn month_first_when_day_first_is_impossible() {
        assert_eq!(parse("03/15/1990").unwrap(), ymd(1990, 3, 15));
    }

    #[test]
    fn english_month_names() {
        assert_eq!(parse("15th March, 1990").unwrap(), ymd(1990, 3, 15));
        assert_eq!(parse("March 15, 1990").unwrap(), ymd(1990, 3, 15));
        assert_eq!(parse("Thursday, 15 of March 1990").unwrap(), ymd(1990, 3, 15));
        assert_eq!(parse("1 Sept. 1985").unwrap(), ymd(1985, 9, 1));
    }

    #[test]
    fn french_and_portuguese_month_names() {
        assert_eq!(parse("1er février 1992").unwrap(), ymd(1992, 2, 1));
        assert_eq!(parse("15 de março de 1990").unwrap(), ymd(1990, 3, 15));
        assert_eq!(parse("lundi 3 août 1987").unwrap(), ymd(1987, 8, 3));
    }

    #[test]
    fn two_digit_years_pivot_on_current_century() {
        assert_eq!(parse("15/03/90").unwrap(), ymd(1990, 3, 15));
        assert_eq!(parse("15/03/05").unwrap(), ymd(2005, 3, 15));
    }

    #[test]
    fn year_first_with_day_above_twelve_uses_magnitude() {
        assert_eq!(parse("1990 15 03").unwrap(), ymd(1990, 3, 15));
    }

    #[test]
    fn rejects_unparseable_input() {
        assert_eq!(parse(""), Err(DateParseError::Empty));
        assert_eq!(parse("unknown"), Err(DateParseError::UnknownWord("unknown".into())));
        assert_eq!(parse("1990"), Err(DateParseError::WrongShape(1)));
        assert_eq!(parse("31/02/1990"), Err(DateParseError::Invalid));
    }

    #[test]
    fn display_forms() {
        let d = ymd(1990, 3, 15);
        assert_eq!(iso_date(d), "1990-03-15");
        assert_eq!(display_date(d), "15 March 1990");
        assert_eq!(display_from_iso("1990-03-15"), "15 March 1990");
        assert_eq!(display_from_iso("sometime in 1990"), "sometime in 1990");
    }

    #[test]
    fn age_counts_completed_years() {
        let dob = ymd(1990, 3, 15);
        assert_eq!(age_on(dob, ymd(2024, 3, 14)), Some(33));
        assert_eq!(age_on(dob, ymd(2024, 3, 15)), Some(34));
        assert_eq!(age_on(dob, ymd(1989, 1, 1)), None);
    }
}
