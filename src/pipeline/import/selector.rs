use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::ImportError;
use crate::config::SUPPORTED_EXTENSIONS;

/// A supported file inside an applicant folder, with its ranking keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormCandidate {
    pub path: PathBuf,
    pub score: u32,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

/// Keyword score for a file stem.
///
/// +3 per keyword found in the lowercased stem, otherwise +1 when it is found
/// once spaces are removed from both sides ("applicationform").
pub fn score_file_name(stem: &str, keywords: &[String]) -> u32 {
    let lower = stem.to_lowercase();
    let compact = lower.replace(' ', "");
    keywords
        .iter()
        .map(|kw| {
            let kw = kw.to_lowercase();
            if lower.contains(&kw) {
                3
            } else if compact.contains(&kw.replace(' ', "")) {
                1
            } else {
                0
            }
        })
        .sum()
}

pub fn is_supported_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Every supported file directly inside `folder`, scored.
pub fn form_candidates(folder: &Path, keywords: &[String]) -> Result<Vec<FormCandidate>, ImportError> {
    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || !is_supported_file(&path) {
            continue;
        }
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        // Unreadable metadata ranks as an empty, undated file.
        let (size, modified) = match entry.metadata() {
            Ok(meta) => (meta.len(), meta.modified().ok()),
            Err(_) => (0, None),
        };
        candidates.push(FormCandidate {
            score: score_file_name(&stem, keywords),
            path,
            size,
            modified,
        });
    }
    Ok(candidates)
}

/// Pick the application form inside `folder`.
///
/// Ranks by keyword score, then size, then modification time (all
/// descending), then file name for a stable result. A supported file with a
/// zero score is still selected when nothing better exists.
pub fn select_form(folder: &Path, keywords: &[String]) -> Result<Option<PathBuf>, ImportError> {
    let mut candidates = form_candidates(folder, keywords)?;
    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(b.size.cmp(&a.size))
            .then(b.modified.cmp(&a.modified))
            .then(a.path.cmp(&b.path))
    });
    Ok(candidates.into_iter().next().map(|c| c.path))
}
