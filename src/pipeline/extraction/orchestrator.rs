use std::path::Path;

use super::docx::{is_zip_container, read_docx};
use super::ocr::{ocr_with_timeout, SharedOcrEngine};
use super::sanitize::{clean_cell, sanitize_extracted_text};
use super::types::{DocumentDecoder, PdfExtractor, PdfPageRenderer, RawDocument};
use super::ExtractionError;
use crate::config::DecoderSettings;
use crate::models::DocumentKind;

/// File-system decoder routing by extension.
/// Uses trait objects for OCR and PDF access, enabling dependency injection.
pub struct FileDecoder {
    settings: DecoderSettings,
    ocr_engine: Option<SharedOcrEngine>,
    pdf_extractor: Option<Box<dyn PdfExtractor + Send + Sync>>,
    pdf_renderer: Option<Box<dyn PdfPageRenderer + Send + Sync>>,
}

impl FileDecoder {
    /// DOCX-only decoder. PDF and image support are added with the builders.
    pub fn new(settings: DecoderSettings) -> Self {
        Self {
            settings,
            ocr_engine: None,
            pdf_extractor: None,
            pdf_renderer: None,
        }
    }

    pub fn with_ocr_engine(mut self, engine: SharedOcrEngine) -> Self {
        self.ocr_engine = Some(engine);
        self
    }

    pub fn with_pdf_extractor(mut self, extractor: Box<dyn PdfExtractor + Send + Sync>) -> Self {
        self.pdf_extractor = Some(extractor);
        self
    }

    /// Add a PDF page renderer for OCR of scanned PDFs.
    pub fn with_pdf_renderer(mut self, renderer: Box<dyn PdfPageRenderer + Send + Sync>) -> Self {
        self.pdf_renderer = Some(renderer);
        self
    }

    fn decode_word(&self, bytes: &[u8], kind: DocumentKind) -> Result<RawDocument, ExtractionError> {
        if kind == DocumentKind::LegacyDoc && !is_zip_container(bytes) {
            return Err(ExtractionError::LegacyWordFormat);
        }
        let mut doc = read_docx(bytes)?;
        doc.text = sanitize_extracted_text(&doc.text);
        if let Some(grid) = doc.table.as_mut() {
            for row in grid.iter_mut() {
                for cell in row.iter_mut() {
                    *cell = clean_cell(cell);
                }
            }
        }
        Ok(doc)
    }

    fn decode_pdf(&self, bytes: &[u8]) -> Result<RawDocument, ExtractionError> {
        let extractor = self
            .pdf_extractor
            .as_ref()
            .ok_or(ExtractionError::PdfUnavailable)?;
        let text = extractor
            .extract_text(bytes)?
            .into_iter()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("\n");

        if !text.trim().is_empty() {
            return Ok(RawDocument::from_text(sanitize_extracted_text(&text)));
        }

        // No text layer: scanned PDF.
        match (&self.pdf_renderer, &self.ocr_engine) {
            (Some(renderer), Some(engine)) => {
                let text = self.ocr_scanned_pdf(bytes, renderer.as_ref(), engine)?;
                Ok(RawDocument::from_text(sanitize_extracted_text(&text)))
            }
            _ => {
                tracing::warn!("PDF has no text layer and OCR is not configured");
                Ok(RawDocument::default())
            }
        }
    }

    /// OCR the first `pdf_max_pages` pages, each bounded by the page timeout.
    fn ocr_scanned_pdf(
        &self,
        bytes: &[u8],
        renderer: &(dyn PdfPageRenderer + Send + Sync),
        engine: &SharedOcrEngine,
    ) -> Result<String, ExtractionError> {
        let page_count = renderer.page_count(bytes)?;
        let pages = page_count.min(self.settings.pdf_max_pages);
        if page_count > pages {
            tracing::info!(page_count, ocr_pages = pages, "OCR limited to leading pages");
        }

        let mut texts = Vec::with_capacity(pages);
        for page in 0..pages {
            let image = renderer.render_page(bytes, page, self.settings.ocr_dpi)?;
            texts.push(ocr_with_timeout(engine, image, self.settings.ocr_page_timeout)?);
        }
        Ok(texts.join("\n"))
    }

    fn decode_image(&self, bytes: Vec<u8>) -> Result<RawDocument, ExtractionError> {
        let engine = self.ocr_engine.as_ref().ok_or(ExtractionError::OcrUnavailable)?;
        let text = ocr_with_timeout(engine, bytes, self.settings.ocr_page_timeout)?;
        Ok(RawDocument::from_text(sanitize_extracted_text(&text)))
    }
}

impl DocumentDecoder for FileDecoder {
    fn decode(&self, path: &Path) -> Result<RawDocument, ExtractionError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let kind = DocumentKind::from_extension(&ext)
            .ok_or_else(|| ExtractionError::UnsupportedFormat(ext.clone()))?;

        tracing::debug!(path = %path.display(), kind = kind.as_str(), "Decoding form");
        let bytes = std::fs::read(path)?;

        let doc = match kind {
            DocumentKind::Docx | DocumentKind::LegacyDoc => self.decode_word(&bytes, kind)?,
            DocumentKind::Pdf => self.decode_pdf(&bytes)?,
            DocumentKind::Image => self.decode_image(bytes)?,
        };

        tracing::debug!(
            kind = kind.as_str(),
            text_length = doc.text.len(),
            table_rows = doc.table.as_ref().map_or(0, |t| t.len()),
            "Decoding complete"
        );
        Ok(doc)
    }
}
