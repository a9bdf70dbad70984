use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ExtractionError;

/// Rows of cell text, one `Vec` per table row, in document order.
pub type TableGrid = Vec<Vec<String>>;

/// What a decoder produces for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    pub text: String,
    /// Present only for formats with real tables (DOCX).
    pub table: Option<TableGrid>,
}

impl RawDocument {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            table: None,
        }
    }

    pub fn has_table_rows(&self) -> bool {
        self.table.as_ref().is_some_and(|t| !t.is_empty())
    }
}

/// Text of one PDF page from its embedded text layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfPageText {
    pub page_number: usize,
    pub text: String,
}

/// Raw OCR result from the engine
#[derive(Debug, Clone)]
pub struct OcrPageResult {
    pub text: String,
    pub confidence: f32,
}

/// OCR engine abstraction (allows mocking for tests)
pub trait OcrEngine {
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError>;
}

/// PDF text-layer extraction abstraction
pub trait PdfExtractor {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<Vec<PdfPageText>, ExtractionError>;
}

/// Renders single PDF pages to PNG for OCR.
pub trait PdfPageRenderer {
    fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize, ExtractionError>;

    fn render_page(
        &self,
        pdf_bytes: &[u8],
        page_number: usize,
        dpi: u32,
    ) -> Result<Vec<u8>, ExtractionError>;
}

/// Turns a file on disk into text plus an optional table grid.
pub trait DocumentDecoder {
    fn decode(&self, path: &Path) -> Result<RawDocument, ExtractionError>;
}
