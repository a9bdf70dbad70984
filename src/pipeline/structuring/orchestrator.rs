use std::sync::Arc;

use chrono::NaiveDate;

use super::confidence::{
    low_confidence_fields, DERIVED_EXPERIENCE, QUALIFICATIONS, TABLE_EXPERIENCE, TABLE_FIELD,
    UNPARSED_DATE_CAP,
};
use super::patterns::{cascade_fields, extract_from_text};
use super::table::parse_table;
use super::types::{FieldExtractor, FormExtraction, StructuredForm};
use crate::models::{ConfidenceMap, Field, FieldRecord};
use crate::pipeline::extraction::RawDocument;
use crate::pipeline::normalize::{
    age_on, aggregate, clear_noise, from_certifications, from_education, from_text, iso_date,
    missing_field_issues, normalize_date, summarize, years_since,
};
use crate::pipeline::processor::ProcessingError;
use crate::pipeline::vocabulary::Vocabulary;

/// Orchestrates field extraction for one decoded form:
/// table sections → text patterns → noise filter → normalization → issues
pub struct FormExtractor {
    vocab: Arc<Vocabulary>,
}

impl FormExtractor {
    pub fn new(vocab: Arc<Vocabulary>) -> Self {
        Self { vocab }
    }

    /// Personal cells and employment rows from the table. Both outrank text.
    fn apply_table(
        &self,
        form: &StructuredForm,
        record: &mut FieldRecord,
        confidence: &mut ConfidenceMap,
        today: NaiveDate,
    ) {
        let personal = &form.personal;
        let mut set = |field: Field, value: Option<String>| {
            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                record.set(field, value);
                confidence.set(field, TABLE_FIELD);
            }
        };
        set(Field::Name, personal.name());
        set(
            Field::Gender,
            personal.gender.as_deref().map(|g| {
                self.vocab
                    .gender_code(g)
                    .map(str::to_string)
                    .unwrap_or_else(|| g.trim().to_uppercase())
            }),
        );
        set(Field::Nationality, personal.nationality.clone());
        set(Field::Dob, personal.date_of_birth.clone());

        if let Some(summary) = summarize(&form.experience, today, &self.vocab) {
            record.set(Field::ExpStartYear, summary.earliest_start_year as i64);
            confidence.set(Field::ExpStartYear, TABLE_EXPERIENCE);
            if summary.total_months > 0 {
                record.set(Field::ExperienceYears, summary.years);
                confidence.set(Field::ExperienceYears, TABLE_EXPERIENCE);
            }
        }
    }

    /// Rewrite DOB as ISO and derive AGE. An unreadable date is kept as
    /// written, flagged, and its confidence capped.
    fn normalize_dob(
        &self,
        record: &mut FieldRecord,
        confidence: &mut ConfidenceMap,
        issues: &mut Vec<String>,
        today: NaiveDate,
    ) {
        if !record.is_filled(Field::Dob) {
            return;
        }
        let raw = record.text(Field::Dob);
        match normalize_date(&raw, &self.vocab) {
            Ok(dob) => {
                record.set(Field::Dob, iso_date(dob));
                if let Some(age) = age_on(dob, today) {
                    record.set(Field::Age, age);
                    confidence.set(Field::Age, confidence.get(Field::Dob));
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Date of birth kept as written");
                issues.push(ProcessingError::DateUnreadable(raw).to_string());
                confidence.set(Field::Dob, confidence.get(Field::Dob).min(UNPARSED_DATE_CAP));
            }
        }
    }

    fn aggregate_qualifications(
        &self,
        form: &StructuredForm,
        text: &str,
        record: &mut FieldRecord,
        confidence: &mut ConfidenceMap,
    ) {
        let mut entries = from_education(&form.education);
        entries.extend(from_certifications(&form.qualifications));
        if entries.is_empty() {
            entries = from_text(text, &self.vocab);
        }
        let joined = aggregate(entries);
        if !joined.is_empty() {
            record.set(Field::Qualifications, joined);
            confidence.set(Field::Qualifications, QUALIFICATIONS);
        }
    }
}

impl FieldExtractor for FormExtractor {
    fn extract(&self, document: &RawDocument, today: NaiveDate) -> FormExtraction {
        let mut record = FieldRecord::new();
        let mut confidence = ConfidenceMap::new();
        let mut issues = Vec::new();

        let form = document
            .table
            .as_ref()
            .map(|grid| parse_table(grid, &self.vocab))
            .unwrap_or_default();
        self.apply_table(&form, &mut record, &mut confidence, today);

        let (merged, text_confidence) = extract_from_text(&document.text, &record, &self.vocab);
        for field in cascade_fields() {
            if !record.is_filled(field) && merged.is_filled(field) {
                confidence.set(field, text_confidence.get(field));
            }
        }
        record = merged;

        for field in clear_noise(&mut record, &self.vocab) {
            confidence.set(field, 0.0);
        }

        self.normalize_dob(&mut record, &mut confidence, &mut issues, today);
        self.aggregate_qualifications(&form, &document.text, &mut record, &mut confidence);

        if !record.is_filled(Field::ExperienceYears) {
            if let Ok(start) = record.get(Field::ExpStartYear).to_string().parse::<i32>() {
                record.set(Field::ExperienceYears, years_since(start, today));
                confidence.set(Field::ExperienceYears, DERIVED_EXPERIENCE);
            }
        }

        issues.extend(missing_field_issues(&record));

        let low = low_confidence_fields(&record, &confidence);
        if !low.is_empty() {
            tracing::debug!(fields = ?low, "Low-confidence values");
        }

        FormExtraction {
            fields: record,
            confidence,
            issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn extractor() -> FormExtractor {
        FormExtractor::new(Arc::new(Vocabulary::default()))
    }

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn table_form_fills_every_field() {
        let doc = RawDocument {
            text: String::new(),
            table: Some(grid(&[
                &["PERSONAL INFORMATION"],
                &["Surname", "OBI", "First Name", "ADA"],
                &["Sex", "Female"],
                &["Date of Birth", "15th March 1990"],
                &["Nationality", "Nigerian"],
                &["EDUCATION"],
                &["1", "BSc", "2012", "Chemistry", "UNILAG"],
                &["WORK EXPERIENCE"],
                &["Jan 2015", "Dec 2017", "ACME"],
                &["Jan 2018", "Present", "Globex"],
            ])),
        };
        let out = extractor().extract(&doc, today());

        assert_eq!(out.fields.text(Field::Name), "ADA OBI");
        assert_eq!(out.fields.text(Field::Gender), "F");
        assert_eq!(out.fields.text(Field::Dob), "1990-03-15");
        assert_eq!(*out.fields.get(Field::Age), FieldValue::Integer(34));
        assert_eq!(out.fields.text(Field::Nationality), "Nigerian");
        assert_eq!(*out.fields.get(Field::ExpStartYear), FieldValue::Integer(2015));
        assert_eq!(*out.fields.get(Field::ExperienceYears), FieldValue::Decimal(9.3));
        assert_eq!(out.fields.text(Field::Qualifications), "BSc Chemistry - 2012");
        assert_eq!(out.confidence.get(Field::Gender), TABLE_FIELD);
        assert_eq!(out.confidence.get(Field::ExperienceYears), TABLE_EXPERIENCE);
        assert!(out.issues.is_empty(), "unexpected issues: {:?}", out.issues);
    }

    #[test]
    fn text_only_form_uses_patterns() {
        let doc = RawDocument::from_text(
            "APPLICATION FORM\nFull Name: Kofi Mensah\nSex: M\nNationality: Ghanaian\n\
             Date of Birth: 02/05/1985\nExperience start year: 2009\nMSc Economics, 2011",
        );
        let out = extractor().extract(&doc, today());

        assert_eq!(out.fields.text(Field::Gender), "M");
        assert_eq!(out.fields.text(Field::Dob), "1985-05-02");
        assert_eq!(*out.fields.get(Field::Age), FieldValue::Integer(39));
        assert_eq!(*out.fields.get(Field::ExpStartYear), FieldValue::Integer(2009));
        assert_eq!(*out.fields.get(Field::ExperienceYears), FieldValue::Integer(15));
        assert_eq!(out.confidence.get(Field::ExperienceYears), DERIVED_EXPERIENCE);
        assert_eq!(out.fields.text(Field::Qualifications), "MSc Economics - 2011");
        assert!(out.issues.is_empty(), "unexpected issues: {:?}", out.issues);
    }

    #[test]
    fn table_values_outrank_text() {
        let doc = RawDocument {
            text: "Nationality: Togolese".into(),
            table: Some(grid(&[&["Nationality", "Beninese"]])),
        };
        let out = extractor().extract(&doc, today());
        assert_eq!(out.fields.text(Field::Nationality), "Beninese");
    }

    #[test]
    fn unreadable_dob_is_kept_and_flagged() {
        let doc = RawDocument::from_text("Date of Birth: 15/03/1990\n");
        let mut out = extractor().extract(&doc, today());
        assert_eq!(out.fields.text(Field::Dob), "1990-03-15");

        let doc = RawDocument {
            text: String::new(),
            table: Some(grid(&[&["Date of Birth", "around spring 1990"]])),
        };
        out = extractor().extract(&doc, today());
        assert_eq!(out.fields.text(Field::Dob), "around spring 1990");
        assert!(!out.fields.is_filled(Field::Age));
        assert_eq!(out.confidence.get(Field::Dob), UNPARSED_DATE_CAP);
        assert_eq!(
            out.issues[0],
            "DOB 'around spring 1990' could not be normalized - review manually"
        );
    }

    #[test]
    fn placeholders_become_missing_field_issues() {
        let doc = RawDocument {
            text: String::new(),
            table: Some(grid(&[&["Nationality", "N/A"], &["Sex", "F"]])),
        };
        let out = extractor().extract(&doc, today());
        assert!(!out.fields.is_filled(Field::Nationality));
        assert!(out
            .issues
            .contains(&"NATIONALITY is empty or could not be extracted - review manually".to_string()));
        assert_eq!(out.issues.len(), Field::REQUIRED.len() - 1);
    }
}
