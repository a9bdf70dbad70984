//! Section state machine over the form's table rows.
//!
//! Forms are laid out as one long table: a header row opens a section and
//! the rows below it are read with that section's column layout until the
//! next header. Merged cells arrive repeated, so adjacent duplicates are
//! collapsed first. Rows that do not fit the layout are skipped.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{
    EducationEntry, ExperienceInterval, PersonalInfo, QualificationEntry, Section, StructuredForm,
};
use crate::pipeline::extraction::TableGrid;
use crate::pipeline::vocabulary::{normalize_label, Vocabulary};

/// Labels this short only match exactly ("sex", "dob", "nom", "name").
const EXACT_LABEL_MAX_CHARS: usize = 4;

/// Section numbering in front of a header: "1.", "B)", "IV -", "Section 2:".
static HEADER_NUMBERING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:section\s+)?(?:\d{1,2}|[a-h]|[ivx]{1,4})\s*[.):\-]\s*").unwrap()
});

/// Serial prefix inside a date cell: "1. Jan 2015", "2) 2018".
static SERIAL_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{1,2}[.)]\s+").unwrap());

static BARE_INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{1,3}[.)]?$").unwrap());

/// Collapse runs of identical adjacent cells (merged-cell artifacts).
pub fn unique_cells(row: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(row.len());
    for cell in row {
        let cell = cell.trim();
        if out.last().map(String::as_str) != Some(cell) {
            out.push(cell.to_string());
        }
    }
    out
}

fn is_bare_integer(cell: &str) -> bool {
    BARE_INTEGER.is_match(cell.trim())
}

/// Data columns start after a serial-number column or a leading blank.
///
/// A bare integer first cell shifts by one. A blank first cell shifts by two
/// when a serial follows it, otherwise by one.
pub fn leading_offset(cells: &[String]) -> usize {
    match cells.first().map(|c| c.trim()) {
        Some(first) if is_bare_integer(first) => 1,
        Some("") => {
            if cells.get(1).is_some_and(|c| is_bare_integer(c)) {
                2
            } else {
                1
            }
        }
        _ => 0,
    }
}

fn header_text(cell: &str) -> String {
    let normalized = normalize_label(cell);
    HEADER_NUMBERING.replace(&normalized, "").trim().to_string()
}

/// Prefix match on a word boundary, so "experience (most recent first)"
/// matches "experience" but "experienced" does not.
fn starts_with_word(text: &str, keyword: &str) -> bool {
    text.strip_prefix(keyword)
        .is_some_and(|rest| rest.chars().next().map_or(true, |c| !c.is_alphanumeric()))
}

/// Section a row opens, judged on its first non-empty cell so that data
/// such as "Ministry of Education" further along a row never switches state.
pub fn detect_section(cells: &[String], vocab: &Vocabulary) -> Option<Section> {
    let headers = &vocab.section_headers;
    let ordered: [(Section, &Vec<String>); 5] = [
        (Section::Personal, &headers.personal),
        (Section::Qualification, &headers.qualification),
        (Section::Education, &headers.education),
        (Section::Experience, &headers.experience),
        (Section::Ignored, &headers.ignored),
    ];
    let text = header_text(cells.iter().find(|c| !c.trim().is_empty())?);
    if text.is_empty() {
        return None;
    }
    ordered.iter().find_map(|(section, keywords)| {
        keywords
            .iter()
            .any(|k| starts_with_word(&text, k))
            .then_some(*section)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PersonalField {
    FullName,
    OtherNames,
    FirstName,
    FamilyName,
    Gender,
    Nationality,
    DateOfBirth,
}

fn label_matches(label: &str, keyword: &str) -> bool {
    if keyword.chars().count() <= EXACT_LABEL_MAX_CHARS {
        label == keyword
    } else {
        starts_with_word(label, keyword)
    }
}

fn classify_personal_label(raw: &str, vocab: &Vocabulary) -> Option<PersonalField> {
    let label = normalize_label(raw);
    if label.is_empty() {
        return None;
    }
    let labels = &vocab.personal_labels;
    let ordered: [(PersonalField, &Vec<String>); 7] = [
        (PersonalField::FullName, &labels.full_name),
        (PersonalField::OtherNames, &labels.other_names),
        (PersonalField::FirstName, &labels.first_name),
        (PersonalField::FamilyName, &labels.family_name),
        (PersonalField::Gender, &labels.gender),
        (PersonalField::Nationality, &labels.nationality),
        (PersonalField::DateOfBirth, &labels.date_of_birth),
    ];
    ordered.iter().find_map(|(field, keywords)| {
        keywords
            .iter()
            .any(|k| label_matches(&label, k))
            .then_some(*field)
    })
}

/// Walks table rows and accumulates a [`StructuredForm`].
pub struct SectionParser<'v> {
    vocab: &'v Vocabulary,
    state: Section,
    form: StructuredForm,
}

impl<'v> SectionParser<'v> {
    /// Rows before the first header are read as personal information.
    pub fn new(vocab: &'v Vocabulary) -> Self {
        Self {
            vocab,
            state: Section::Personal,
            form: StructuredForm::default(),
        }
    }

    pub fn state(&self) -> Section {
        self.state
    }

    pub fn feed_row(&mut self, row: &[String]) {
        let cells = unique_cells(row);
        if cells.iter().all(|c| c.is_empty()) {
            return;
        }
        if let Some(section) = detect_section(&cells, self.vocab) {
            if section != self.state {
                tracing::trace!(from = ?self.state, to = ?section, "Section change");
            }
            self.state = section;
            return;
        }
        match self.state {
            Section::Personal => self.personal_row(&cells),
            Section::Education => self.education_row(&cells),
            Section::Qualification => self.qualification_row(&cells),
            Section::Experience => self.experience_row(&cells),
            Section::Ignored => {}
        }
    }

    pub fn finish(self) -> StructuredForm {
        self.form
    }

    /// Label/value pairs. A row may hold more than one pair
    /// ("Surname | OBI | First name | ADA").
    fn personal_row(&mut self, cells: &[String]) {
        let mut idx = usize::from(cells.first().is_some_and(|c| c.is_empty()));
        while let (Some(label), Some(value)) = (cells.get(idx), cells.get(idx + 1)) {
            let Some(field) = classify_personal_label(label, self.vocab) else {
                break;
            };
            let value = value.trim();
            if !value.is_empty() && classify_personal_label(value, self.vocab).is_none() {
                self.set_personal(field, value);
            }
            idx += 2;
        }
    }

    fn set_personal(&mut self, field: PersonalField, value: &str) {
        let info: &mut PersonalInfo = &mut self.form.personal;
        let slot = match field {
            PersonalField::FullName => &mut info.full_name,
            PersonalField::OtherNames => &mut info.other_names,
            PersonalField::FirstName => &mut info.first_name,
            PersonalField::FamilyName => &mut info.family_name,
            PersonalField::Gender => &mut info.gender,
            PersonalField::Nationality => &mut info.nationality,
            PersonalField::DateOfBirth => &mut info.date_of_birth,
        };
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
    }

    fn is_data_cell(&self, cell: &str) -> bool {
        !cell.trim().is_empty() && !self.vocab.is_column_header(cell) && !self.vocab.is_noise(cell)
    }

    /// Level | year | field of study | institution
    fn education_row(&mut self, cells: &[String]) {
        let o = leading_offset(cells);
        let (Some(level), Some(year)) = (cells.get(o), cells.get(o + 1)) else {
            return;
        };
        if !self.is_data_cell(level) {
            return;
        }
        self.form.education.push(EducationEntry {
            level: level.clone(),
            year: year.clone(),
            field: cells.get(o + 2).cloned().unwrap_or_default(),
            institution: cells.get(o + 3).cloned().unwrap_or_default(),
        });
    }

    /// Title | awarding centre | year
    fn qualification_row(&mut self, cells: &[String]) {
        let o = leading_offset(cells);
        let Some(title) = cells.get(o) else {
            return;
        };
        if !self.is_data_cell(title) {
            return;
        }
        self.form.qualifications.push(QualificationEntry {
            title: title.clone(),
            centre: cells.get(o + 1).cloned().unwrap_or_default(),
            year: cells.get(o + 2).cloned().unwrap_or_default(),
        });
    }

    /// Start | end | employer | position
    fn experience_row(&mut self, cells: &[String]) {
        let o = leading_offset(cells);
        let Some(start) = cells.get(o) else {
            return;
        };
        let start = SERIAL_PREFIX.replace(start.trim(), "").to_string();
        if !self.is_data_cell(&start) {
            return;
        }
        self.form.experience.push(ExperienceInterval {
            start,
            end: cells.get(o + 1).cloned().unwrap_or_default(),
        });
    }
}

/// Run the section parser over a whole grid.
pub fn parse_table(grid: &TableGrid, vocab: &Vocabulary) -> StructuredForm {
    let mut parser = SectionParser::new(vocab);
    for row in grid {
        parser.feed_row(row);
    }
    parser.finish()
}
