//! PDFium-backed text layer reader and page rasterizer.
//!
//! Application forms arrive either as born-digital PDFs (text layer present)
//! or as scans (no text layer). The first are read directly; the second are
//! rasterized page by page and handed to OCR.
//!
//! `Pdfium` is `!Send`, so every call binds the library afresh and keeps the
//! document local to that call. `PdfiumBackend` itself carries no state.

use std::io::Cursor;

use image::{DynamicImage, ImageOutputFormat};
use pdfium_render::prelude::*;

use super::types::{PdfExtractor, PdfPageRenderer, PdfPageText};
use super::ExtractionError;

/// Longest rendered side in pixels. Oversized pages are scaled down to fit.
const RENDER_CAP_PX: u32 = 4096;

const PDF_POINTS_PER_INCH: f32 = 72.0;

/// Env var naming an explicit PDFium shared library.
pub const PDFIUM_LIB_ENV: &str = "PDFIUM_DYNAMIC_LIB_PATH";

#[derive(Debug, Clone, Copy)]
pub struct PdfiumBackend;

impl PdfiumBackend {
    /// Fails when no PDFium library can be bound, so callers can run
    /// without PDF support instead of failing on every form.
    pub fn new() -> Result<Self, ExtractionError> {
        bind_pdfium()?;
        Ok(Self)
    }
}

/// Bind PDFium from, in order: the env var path, the executable's
/// directory, the system library path.
fn bind_pdfium() -> Result<Pdfium, ExtractionError> {
    if let Ok(path) = std::env::var(PDFIUM_LIB_ENV) {
        let bindings = Pdfium::bind_to_library(&path).map_err(|e| {
            ExtractionError::PdfParsing(format!("cannot load PDFium from {path}: {e}"))
        })?;
        tracing::debug!(path = %path, "PDFium bound from {PDFIUM_LIB_ENV}");
        return Ok(Pdfium::new(bindings));
    }

    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_string_lossy().into_owned()))
        .map(|dir| Pdfium::pdfium_platform_library_name_at_path(&dir));
    if let Some(bindings) = beside_exe.and_then(|lib| Pdfium::bind_to_library(lib).ok()) {
        return Ok(Pdfium::new(bindings));
    }

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| ExtractionError::PdfParsing(format!("PDFium library not found ({PDFIUM_LIB_ENV} unset): {e}")))
}

fn open_error(e: PdfiumError) -> ExtractionError {
    let text = e.to_string().to_lowercase();
    if text.contains("password") || text.contains("encrypt") {
        ExtractionError::PdfEncrypted
    } else {
        ExtractionError::PdfParsing(e.to_string())
    }
}

/// Open `bytes` and run `f` on the document.
fn with_document<T>(
    bytes: &[u8],
    f: impl FnOnce(&PdfDocument) -> Result<T, ExtractionError>,
) -> Result<T, ExtractionError> {
    let pdfium = bind_pdfium()?;
    let document = pdfium.load_pdf_from_byte_slice(bytes, None).map_err(open_error)?;
    f(&document)
}

/// Pixel size for a page rendered at `dpi`, scaled down so neither side
/// exceeds [`RENDER_CAP_PX`]. Never returns a zero side.
fn render_size(width_pt: f32, height_pt: f32, dpi: u32) -> (u32, u32) {
    let scale = dpi as f32 / PDF_POINTS_PER_INCH;
    let (w, h) = ((width_pt * scale).max(1.0), (height_pt * scale).max(1.0));
    let shrink = (RENDER_CAP_PX as f32 / w.max(h)).min(1.0);
    (
        ((w * shrink) as u32).clamp(1, RENDER_CAP_PX),
        ((h * shrink) as u32).clamp(1, RENDER_CAP_PX),
    )
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, ExtractionError> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageOutputFormat::Png)
        .map_err(|e| ExtractionError::ImageProcessing(format!("PNG encoding failed: {e}")))?;
    Ok(out.into_inner())
}

impl PdfExtractor for PdfiumBackend {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<Vec<PdfPageText>, ExtractionError> {
        with_document(pdf_bytes, |document| {
            Ok(document
                .pages()
                .iter()
                .enumerate()
                .map(|(index, page)| PdfPageText {
                    page_number: index + 1,
                    text: page.text().map(|t| t.all()).unwrap_or_default(),
                })
                .collect())
        })
    }
}

impl PdfPageRenderer for PdfiumBackend {
    fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize, ExtractionError> {
        with_document(pdf_bytes, |document| Ok(document.pages().len() as usize))
    }

    /// Render the zero-based page `page_number` to PNG.
    fn render_page(
        &self,
        pdf_bytes: &[u8],
        page_number: usize,
        dpi: u32,
    ) -> Result<Vec<u8>, ExtractionError> {
        let render_error = |reason: String| ExtractionError::PdfRendering {
            page: page_number,
            reason,
        };
        with_document(pdf_bytes, |document| {
            let pages = document.pages();
            let page = u16::try_from(page_number)
                .ok()
                .and_then(|index| pages.get(index).ok())
                .ok_or_else(|| render_error(format!("no such page, document has {}", pages.len())))?;

            let (width, height) = render_size(page.width().value, page.height().value, dpi);
            let bitmap = page
                .render_with_config(
                    &PdfRenderConfig::new()
                        .set_target_width(width as i32)
                        .set_maximum_height(height as i32),
                )
                .map_err(|e| render_error(e.to_string()))?;
            let png = encode_png(&bitmap.as_image())?;

            tracing::debug!(page = page_number, width, height, bytes = png.len(), "Rendered page for OCR");
            Ok(png)
        })
    }
}

// ── Mocks for testing ──────────────────────────────────────

/// Text layer with fixed per-page text. Empty strings model scanned pages.
pub struct MockPdfExtractor {
    pages: Vec<String>,
}

impl MockPdfExtractor {
    pub fn new(pages: &[&str]) -> Self {
        Self {
            pages: pages.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl PdfExtractor for MockPdfExtractor {
    fn extract_text(&self, _pdf_bytes: &[u8]) -> Result<Vec<PdfPageText>, ExtractionError> {
        Ok(self
            .pages
            .iter()
            .enumerate()
            .map(|(index, text)| PdfPageText {
                page_number: index + 1,
                text: text.clone(),
            })
            .collect())
    }
}

/// Renderer producing a blank 1x1 PNG for each of `page_count` pages.
pub struct MockPdfPageRenderer {
    page_count: usize,
}

impl MockPdfPageRenderer {
    pub fn new(page_count: usize) -> Self {
        Self { page_count }
    }
}

impl PdfPageRenderer for MockPdfPageRenderer {
    fn page_count(&self, _pdf_bytes: &[u8]) -> Result<usize, ExtractionError> {
        Ok(self.page_count)
    }

    fn render_page(
        &self,
        _pdf_bytes: &[u8],
        page_number: usize,
        _dpi: u32,
    ) -> Result<Vec<u8>, ExtractionError> {
        if page_number >= self.page_count {
            return Err(ExtractionError::PdfRendering {
                page: page_number,
                reason: format!("no such page, document has {}", self.page_count),
            });
        }
        encode_png(&DynamicImage::new_rgb8(1, 1))
    }
}
