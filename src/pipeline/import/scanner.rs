use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use super::selector::select_form;
use super::ImportError;
use crate::models::ApplicantFolder;

/// Discover applicant folders (immediate subdirectories of `parent`) and
/// select each one's form. Sorted by folder name.
pub fn scan_applicants(parent: &Path, keywords: &[String]) -> Result<Vec<ApplicantFolder>, ImportError> {
    if !parent.exists() {
        return Err(ImportError::ParentNotFound(parent.to_path_buf()));
    }
    if !parent.is_dir() {
        return Err(ImportError::NotADirectory(parent.to_path_buf()));
    }

    let mut applicants = Vec::new();
    for entry in std::fs::read_dir(parent)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let form = match select_form(&path, keywords) {
            Ok(form) => form,
            Err(e) => {
                tracing::warn!(applicant = %name, error = %e, "Could not list applicant folder");
                None
            }
        };
        applicants.push(ApplicantFolder { name, path, form });
    }

    applicants.sort_by(|a, b| a.name.cmp(&b.name));
    tracing::info!(count = applicants.len(), parent = %parent.display(), "Found applicant folders");
    Ok(applicants)
}

/// Overview of a batch folder before processing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FolderStatistics {
    pub total_folders: usize,
    pub with_forms: usize,
    pub without_forms: usize,
    /// Selected form count per lowercase extension (".pdf", ".docx", ...).
    pub file_types: BTreeMap<String, usize>,
}

pub fn folder_statistics(applicants: &[ApplicantFolder]) -> FolderStatistics {
    let mut stats = FolderStatistics {
        total_folders: applicants.len(),
        ..Default::default()
    };
    for applicant in applicants {
        match &applicant.form {
            Some(form) => {
                stats.with_forms += 1;
                let ext = form
                    .extension()
                    .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
                    .unwrap_or_default();
                *stats.file_types.entry(ext).or_insert(0) += 1;
            }
            None => stats.without_forms += 1,
        }
    }
    stats
}
