use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::enums::ExtractionStatus;
use super::fields::{ConfidenceMap, Field, FieldRecord};
use crate::config::AdminDefaults;

/// One immediate subdirectory of the batch parent folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicantFolder {
    /// Folder base name, used as the applicant's display name.
    pub name: String,
    pub path: PathBuf,
    /// Best-scoring form file, if any supported file exists.
    pub form: Option<PathBuf>,
}

impl ApplicantFolder {
    /// Cache key for this applicant.
    pub fn cache_key(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// Outcome of processing one applicant folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub applicant_name: String,
    pub folder: PathBuf,
    pub status: ExtractionStatus,
    pub fields: FieldRecord,
    pub confidence: ConfidenceMap,
    pub issues: Vec<String>,
    pub source_file: Option<PathBuf>,
}

impl ExtractionResult {
    /// Result shell for `applicant`, with NAME set to the folder name as written.
    pub fn for_applicant(
        applicant: &ApplicantFolder,
        status: ExtractionStatus,
        admin: &AdminDefaults,
    ) -> Self {
        let mut fields = FieldRecord::with_admin(admin);
        fields.set(Field::Name, applicant.name.as_str());
        Self {
            applicant_name: applicant.name.clone(),
            folder: applicant.path.clone(),
            status,
            fields,
            confidence: ConfidenceMap::new(),
            issues: Vec::new(),
            source_file: applicant.form.clone(),
        }
    }

    pub fn with_issue(mut self, issue: impl Into<String>) -> Self {
        self.issues.push(issue.into());
        self
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_file
            .as_deref()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str())
    }
}

/// NAME column value for a successfully extracted applicant.
pub fn display_name(folder_name: &str) -> String {
    folder_name.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn applicant(name: &str) -> ApplicantFolder {
        ApplicantFolder {
            name: name.into(),
            path: PathBuf::from("/batch").join(name),
            form: Some(PathBuf::from("/batch").join(name).join("Application Form.docx")),
        }
    }

    #[test]
    fn result_name_is_folder_name_as_written() {
        let result = ExtractionResult::for_applicant(
            &applicant("Amina Diallo"),
            ExtractionStatus::Success,
            &AdminDefaults::default(),
        );
        assert_eq!(result.fields.text(Field::Name), "Amina Diallo");
        assert_eq!(result.applicant_name, "Amina Diallo");
        assert_eq!(result.fields.text(Field::IntExt), "EXT");
    }

    #[test]
    fn display_name_trims_and_uppercases() {
        assert_eq!(display_name("  Amina Diallo "), "AMINA DIALLO");
    }

    #[test]
    fn source_name_is_file_name_only() {
        let result = ExtractionResult::for_applicant(
            &applicant("Kofi Mensah"),
            ExtractionStatus::Success,
            &AdminDefaults::default(),
        );
        assert_eq!(result.source_name(), Some("Application Form.docx"));
    }

    #[test]
    fn cache_key_is_folder_path() {
        assert_eq!(applicant("x").cache_key(), "/batch/x");
    }

    #[test]
    fn result_round_trips_through_json() {
        let result = ExtractionResult::for_applicant(
            &applicant("Kofi Mensah"),
            ExtractionStatus::NoForm,
            &AdminDefaults::default(),
        )
        .with_issue("Application form not found");
        let json = serde_json::to_string(&result).unwrap();
        let back: ExtractionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
