use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "Applicant Intake";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "applicant_intake=info,warn"
}

/// Worker pool size for the batch runner.
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// The result cache is flushed to disk after this many completions.
pub const DEFAULT_CACHE_FLUSH_EVERY: usize = 10;

/// Rendering DPI for scanned pages handed to OCR.
pub const DEFAULT_OCR_DPI: u32 = 300;

/// Only the first pages of a scanned PDF are OCR'd.
pub const DEFAULT_PDF_MAX_PAGES: usize = 10;

pub const DEFAULT_OCR_PAGE_TIMEOUT: Duration = Duration::from_secs(60);

/// Extracted text shorter than this counts as "nothing extracted".
pub const MIN_EXTRACTED_TEXT_CHARS: usize = 10;

/// File extensions the form selector will consider.
pub const SUPPORTED_EXTENSIONS: &[&str] =
    &["pdf", "docx", "doc", "jpg", "jpeg", "png", "tiff", "tif", "bmp"];

/// Batch orchestration settings.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub max_workers: usize,
    pub cache_flush_every: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            cache_flush_every: DEFAULT_CACHE_FLUSH_EVERY,
        }
    }
}

/// Document decoding settings (scanned PDF fallback and images).
#[derive(Debug, Clone)]
pub struct DecoderSettings {
    pub ocr_dpi: u32,
    pub pdf_max_pages: usize,
    pub ocr_page_timeout: Duration,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            ocr_dpi: DEFAULT_OCR_DPI,
            pdf_max_pages: DEFAULT_PDF_MAX_PAGES,
            ocr_page_timeout: DEFAULT_OCR_PAGE_TIMEOUT,
        }
    }
}

/// Constant values written into the administrative columns of every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminDefaults {
    pub position_code: String,
    pub int_ext: String,
}

impl Default for AdminDefaults {
    fn default() -> Self {
        Self {
            position_code: String::new(),
            int_ext: "EXT".to_string(),
        }
    }
}
