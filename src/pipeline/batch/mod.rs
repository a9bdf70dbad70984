//! Batch orchestration: scan a parent folder, serve cached results, run the
//! rest through a bounded worker pool, and report progress as results land.

pub mod cache;
pub mod progress;
pub mod runner;

pub use cache::*;
pub use progress::*;
pub use runner::*;

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::import::ImportError;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Scan failed: {0}")]
    Scan(#[from] ImportError),

    #[error("Cache write failed for {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache serialization error: {0}")]
    CacheEncode(#[from] serde_json::Error),
}
