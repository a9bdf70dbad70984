//! Per-applicant processing: decode the selected form, extract fields, and
//! turn every failure into a result row instead of an error.
//!
//! Uses trait-based DI for the decoder and the field extractor so the
//! processor is testable with mock implementations.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use chrono::NaiveDate;

use crate::config::{AdminDefaults, MIN_EXTRACTED_TEXT_CHARS};
use crate::models::{display_name, ApplicantFolder, ExtractionResult, ExtractionStatus, Field};
use crate::pipeline::extraction::types::{DocumentDecoder, RawDocument, TableGrid};
use crate::pipeline::extraction::ExtractionError;
use crate::pipeline::structuring::types::FieldExtractor;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Everything that can go wrong for one applicant. Each variant's message is
/// what ends up in the result's issue list and the error log.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Application form not found in folder. Manually extract information from CV if available.")]
    NoFormFound,

    #[error("Unsupported file type: .{0}")]
    UnsupportedType(String),

    #[error("Could not read application form: {0}")]
    DecodeFailed(String),

    #[error("No text extracted from document")]
    EmptyDocument,

    #[error("{0} is empty or could not be extracted - review manually")]
    FieldMissing(Field),

    #[error("DOB '{0}' could not be normalized - review manually")]
    DateUnreadable(String),

    #[error("Extraction failed: {0}")]
    ExtractionException(String),
}

impl ProcessingError {
    /// Result status for an applicant that stopped on this error.
    pub fn status(&self) -> ExtractionStatus {
        match self {
            Self::NoFormFound => ExtractionStatus::NoForm,
            Self::UnsupportedType(_) => ExtractionStatus::Unsupported,
            Self::EmptyDocument => ExtractionStatus::Failed,
            Self::DecodeFailed(_) | Self::ExtractionException(_) => ExtractionStatus::Error,
            // Field-level problems never stop an applicant.
            Self::FieldMissing(_) | Self::DateUnreadable(_) => ExtractionStatus::Success,
        }
    }
}

impl From<ExtractionError> for ProcessingError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::UnsupportedFormat(ext) => Self::UnsupportedType(ext),
            other => Self::DecodeFailed(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Processor
// ---------------------------------------------------------------------------

pub struct ApplicantProcessor {
    decoder: Box<dyn DocumentDecoder + Send + Sync>,
    extractor: Box<dyn FieldExtractor + Send + Sync>,
    admin: AdminDefaults,
}

impl ApplicantProcessor {
    pub fn new(
        decoder: Box<dyn DocumentDecoder + Send + Sync>,
        extractor: Box<dyn FieldExtractor + Send + Sync>,
        admin: AdminDefaults,
    ) -> Self {
        Self {
            decoder,
            extractor,
            admin,
        }
    }

    /// Process one applicant. Never fails: problems become the result's
    /// status and issues. NAME is the folder name, uppercased on success.
    pub fn process(&self, applicant: &ApplicantFolder, today: NaiveDate) -> ExtractionResult {
        let outcome = match applicant.form.as_deref() {
            Some(form) => self.process_form(applicant, form, today),
            None => Err(ProcessingError::NoFormFound),
        };
        outcome.unwrap_or_else(|e| self.failure(applicant, e))
    }

    /// [`process`](Self::process) with panics in decoding or extraction
    /// caught and reported as an extraction exception for this applicant only.
    pub fn process_isolated(&self, applicant: &ApplicantFolder, today: NaiveDate) -> ExtractionResult {
        match catch_unwind(AssertUnwindSafe(|| self.process(applicant, today))) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(applicant = %applicant.name, panic = %message, "Applicant processing panicked");
                self.failure(applicant, ProcessingError::ExtractionException(message))
            }
        }
    }

    fn process_form(
        &self,
        applicant: &ApplicantFolder,
        form: &Path,
        today: NaiveDate,
    ) -> Result<ExtractionResult, ProcessingError> {
        tracing::info!(applicant = %applicant.name, form = %form.display(), "Processing applicant");

        let document = self.decoder.decode(form)?;
        if document.text.trim().chars().count() < MIN_EXTRACTED_TEXT_CHARS
            && !document.has_table_rows()
        {
            return Err(ProcessingError::EmptyDocument);
        }

        let extraction = self.extractor.extract(&document, today);
        if extraction.fields.is_filled(Field::Name) {
            tracing::debug!(
                applicant = %applicant.name,
                form_name = %extraction.fields.text(Field::Name),
                "Name on form replaced by folder name"
            );
        }

        let mut result = ExtractionResult::for_applicant(applicant, ExtractionStatus::Success, &self.admin);
        for field in Field::ALL {
            if field == Field::Name || field.is_administrative() {
                continue;
            }
            result.fields.set(field, extraction.fields.get(field).clone());
            result.confidence.set(field, extraction.confidence.get(field));
        }
        result.fields.set(Field::Name, display_name(&applicant.name));
        result.confidence.set(Field::Name, 1.0);
        result.issues = extraction.issues;

        tracing::info!(
            applicant = %applicant.name,
            issues = result.issues.len(),
            "Applicant processed"
        );
        Ok(result)
    }

    fn failure(&self, applicant: &ApplicantFolder, error: ProcessingError) -> ExtractionResult {
        let status = error.status();
        match status {
            ExtractionStatus::NoForm => {
                tracing::info!(applicant = %applicant.name, "No application form found")
            }
            _ => tracing::warn!(applicant = %applicant.name, status = %status, error = %error, "Applicant not extracted"),
        }
        ExtractionResult::for_applicant(applicant, status, &self.admin).with_issue(error.to_string())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ── Mocks for testing ──────────────────────────────────────

/// Decoder returning a fixed document (or a fixed error) for any path.
pub struct MockDecoder {
    text: String,
    table: Option<TableGrid>,
    unsupported: Option<String>,
}

impl MockDecoder {
    pub fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            table: None,
            unsupported: None,
        }
    }

    pub fn table(rows: &[&[&str]]) -> Self {
        Self {
            text: String::new(),
            table: Some(
                rows.iter()
                    .map(|r| r.iter().map(|c| c.to_string()).collect())
                    .collect(),
            ),
            unsupported: None,
        }
    }

    pub fn unsupported(ext: &str) -> Self {
        Self {
            text: String::new(),
            table: None,
            unsupported: Some(ext.to_string()),
        }
    }
}

impl DocumentDecoder for MockDecoder {
    fn decode(&self, _path: &Path) -> Result<RawDocument, ExtractionError> {
        if let Some(ext) = &self.unsupported {
            return Err(ExtractionError::UnsupportedFormat(ext.clone()));
        }
        Ok(RawDocument {
            text: self.text.clone(),
            table: self.table.clone(),
        })
    }
}
