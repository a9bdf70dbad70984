pub mod docx;
pub mod ocr;
pub mod orchestrator;
pub mod pdfium;
pub mod sanitize;
pub mod types;

pub use docx::*;
pub use ocr::*;
pub use orchestrator::*;
pub use pdfium::*;
pub use sanitize::*;
pub use types::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported file type: .{0}")]
    UnsupportedFormat(String),

    #[error("Legacy binary .doc files cannot be read, save the form as .docx")]
    LegacyWordFormat,

    #[error("DOCX parsing failed: {0}")]
    Docx(String),

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("PDF page {page} rendering failed: {reason}")]
    PdfRendering { page: usize, reason: String },

    #[error("PDF is password-protected")]
    PdfEncrypted,

    #[error("No PDF backend available")]
    PdfUnavailable,

    #[error("Tesseract OCR initialization failed: {0}")]
    OcrInit(String),

    #[error("OCR processing failed: {0}")]
    OcrProcessing(String),

    #[error("No OCR engine available for scanned documents")]
    OcrUnavailable,

    #[error("Tessdata not found at: {0}")]
    TessdataNotFound(PathBuf),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),
}
