//! Persistent result cache for one batch parent folder.
//!
//! Stored next to the applicant folders as
//! `.processing_cache_<sha256 of parent path>.json`. Only terminal statuses
//! that a rerun would reproduce are stored, so failed applicants are retried.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::BatchError;
use crate::models::ExtractionResult;

/// Bumped whenever `ExtractionResult` changes shape.
pub const CACHE_FORMAT_VERSION: u32 = 1;

const CACHE_FILE_PREFIX: &str = ".processing_cache_";

#[derive(Debug, Deserialize)]
struct CacheFile {
    version: u32,
    entries: BTreeMap<String, ExtractionResult>,
}

#[derive(Serialize)]
struct CacheFileRef<'a> {
    version: u32,
    entries: &'a BTreeMap<String, ExtractionResult>,
}

/// Cached results keyed by applicant folder path.
#[derive(Debug)]
pub struct ResultCache {
    path: PathBuf,
    entries: BTreeMap<String, ExtractionResult>,
    dirty: bool,
}

/// Cache file location for a batch parent folder.
pub fn cache_path(parent: &Path) -> PathBuf {
    let digest = Sha256::digest(parent.to_string_lossy().as_bytes());
    parent.join(format!("{CACHE_FILE_PREFIX}{digest:x}.json"))
}

impl ResultCache {
    /// Load the cache for `parent`. A missing, unreadable or outdated file
    /// yields an empty cache.
    pub fn load(parent: &Path) -> Self {
        let path = cache_path(parent);
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<CacheFile>(&raw) {
                Ok(file) if file.version == CACHE_FORMAT_VERSION => file.entries,
                Ok(file) => {
                    tracing::warn!(
                        found = file.version,
                        expected = CACHE_FORMAT_VERSION,
                        "Cache format changed, starting fresh"
                    );
                    BTreeMap::new()
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Cache unreadable, starting fresh");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cache unreadable, starting fresh");
                BTreeMap::new()
            }
        };
        if !entries.is_empty() {
            tracing::info!(entries = entries.len(), "Loaded result cache");
        }
        Self {
            path,
            entries,
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&ExtractionResult> {
        self.entries.get(key)
    }

    /// Store `result` if its status is worth replaying. Returns whether it was stored.
    pub fn insert(&mut self, key: String, result: ExtractionResult) -> bool {
        if !result.status.is_cacheable() {
            return false;
        }
        self.entries.insert(key, result);
        self.dirty = true;
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the cache atomically: serialize to a sibling temp file, then rename.
    pub fn save(&mut self) -> Result<(), BatchError> {
        let encoded = serde_json::to_vec(&CacheFileRef {
            version: CACHE_FORMAT_VERSION,
            entries: &self.entries,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, encoded).map_err(|source| BatchError::CacheWrite {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| BatchError::CacheWrite {
            path: self.path.clone(),
            source,
        })?;
        self.dirty = false;
        tracing::debug!(entries = self.entries.len(), "Result cache flushed");
        Ok(())
    }
}
