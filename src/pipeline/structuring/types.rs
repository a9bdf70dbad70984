use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{ConfidenceMap, FieldRecord};
use crate::pipeline::extraction::RawDocument;

// ═══════════════════════════════════════════
// Table sections
// ═══════════════════════════════════════════

/// Parser state while walking the form's table rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Personal,
    Education,
    Qualification,
    Experience,
    /// Languages, references, declarations: rows are skipped.
    Ignored,
}

/// Personal-information rows keyed by label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub other_names: Option<String>,
    pub family_name: Option<String>,
    pub gender: Option<String>,
    pub nationality: Option<String>,
    pub date_of_birth: Option<String>,
}

impl PersonalInfo {
    /// Name as written on the form: an explicit full name, otherwise
    /// first, other and family names joined.
    pub fn name(&self) -> Option<String> {
        if let Some(full) = self.full_name.as_deref().filter(|s| !s.trim().is_empty()) {
            return Some(full.trim().to_string());
        }
        let parts: Vec<&str> = [&self.first_name, &self.other_names, &self.family_name]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub level: String,
    pub year: String,
    pub field: String,
    pub institution: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationEntry {
    pub title: String,
    pub centre: String,
    pub year: String,
}

/// One employment row, dates kept as written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceInterval {
    pub start: String,
    pub end: String,
}

/// Everything the section parser recovered from the form's tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredForm {
    pub personal: PersonalInfo,
    pub education: Vec<EducationEntry>,
    pub qualifications: Vec<QualificationEntry>,
    pub experience: Vec<ExperienceInterval>,
}

impl StructuredForm {
    pub fn is_empty(&self) -> bool {
        *self == StructuredForm::default()
    }
}

// ═══════════════════════════════════════════
// Extraction output
// ═══════════════════════════════════════════

/// Fields recovered from one decoded form, before the folder name is applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormExtraction {
    pub fields: FieldRecord,
    pub confidence: ConfidenceMap,
    pub issues: Vec<String>,
}

/// Turns a decoded document into field values.
pub trait FieldExtractor {
    fn extract(&self, document: &RawDocument, today: NaiveDate) -> FormExtraction;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_full_name_wins() {
        let info = PersonalInfo {
            full_name: Some(" Ada Obi ".into()),
            first_name: Some("Ignored".into()),
            ..Default::default()
        };
        assert_eq!(info.name().unwrap(), "Ada Obi");
    }

    #[test]
    fn name_parts_are_joined_in_order() {
        let info = PersonalInfo {
            first_name: Some("Ada".into()),
            other_names: Some("".into()),
            family_name: Some("Obi".into()),
            ..Default::default()
        };
        assert_eq!(info.name().unwrap(), "Ada Obi");
        assert!(PersonalInfo::default().name().is_none());
    }

    #[test]
    fn empty_form_detection() {
        assert!(StructuredForm::default().is_empty());
        let form = StructuredForm {
            experience: vec![ExperienceInterval {
                start: "2015".into(),
                end: "".into(),
            }],
            ..Default::default()
        };
        assert!(!form.is_empty());
    }
}
