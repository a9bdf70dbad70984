use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use super::types::{OcrEngine, OcrPageResult};
use super::ExtractionError;

/// Shared, thread-safe OCR engine handle.
pub type SharedOcrEngine = Arc<dyn OcrEngine + Send + Sync>;

/// Bundled Tesseract OCR engine.
/// Only available when compiled with the `ocr` feature flag.
#[cfg(feature = "ocr")]
pub struct BundledTesseract {
    tessdata_dir: std::path::PathBuf,
    lang: String,
}

#[cfg(feature = "ocr")]
impl BundledTesseract {
    /// Initialize with a tessdata directory.
    /// Uses every available language among English, French and Portuguese.
    pub fn new(tessdata_dir: &std::path::Path) -> Result<Self, ExtractionError> {
        if !tessdata_dir.join("eng.traineddata").exists() {
            return Err(ExtractionError::TessdataNotFound(tessdata_dir.to_path_buf()));
        }

        let mut langs = vec!["eng"];
        for extra in ["fra", "por"] {
            if tessdata_dir.join(format!("{extra}.traineddata")).exists() {
                langs.push(extra);
            }
        }
        let lang = langs.join("+");
        tracing::info!(lang = %lang, "Tesseract languages selected");

        Ok(Self {
            tessdata_dir: tessdata_dir.to_path_buf(),
            lang,
        })
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for BundledTesseract {
    /// One Tesseract handle per page: handles are not `Sync`, and pages of
    /// different applicants are recognised on different workers.
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        let datapath = self.tessdata_dir.to_string_lossy();
        let mut page = tesseract::Tesseract::new(Some(&datapath), Some(&self.lang))
            .map_err(|e| ExtractionError::OcrInit(format!("{e:?}")))?
            .set_image_from_mem(image_bytes)
            .map_err(|e| ExtractionError::OcrProcessing(format!("{e:?}")))?;
        let text = page
            .get_text()
            .map_err(|e| ExtractionError::OcrProcessing(format!("{e:?}")))?;
        // mean_text_conf is 0..=100, or negative when nothing was recognised
        let confidence = page.mean_text_conf().clamp(0, 100) as f32 / 100.0;

        Ok(OcrPageResult { text, confidence })
    }
}

// ── Mocks for testing ──────────────────────────────────────

/// OCR engine returning fixed text, optionally after a delay.
pub struct MockOcrEngine {
    pub text: String,
    pub confidence: f32,
    pub delay: Option<Duration>,
}

impl MockOcrEngine {
    pub fn new(text: &str, confidence: f32) -> Self {
        Self {
            text: text.to_string(),
            confidence,
            delay: None,
        }
    }

    /// Simulate a page that takes `delay` to recognise.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl OcrEngine for MockOcrEngine {
    fn ocr_image(&self, _image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        Ok(OcrPageResult {
            text: self.text.clone(),
            confidence: self.confidence,
        })
    }
}

/// Run OCR on one image with a wall-clock bound.
///
/// A page that exceeds `timeout` yields empty text; its worker thread is left
/// to finish in the background and its result is discarded.
pub fn ocr_with_timeout(
    engine: &SharedOcrEngine,
    image_bytes: Vec<u8>,
    timeout: Duration,
) -> Result<String, ExtractionError> {
    let (tx, rx) = mpsc::channel();
    let engine = Arc::clone(engine);
    std::thread::spawn(move || {
        let result = engine.ocr_image(&image_bytes);
        // The receiver is gone after a timeout.
        let _ = tx.send(result);
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result.map(|page| page.text),
        Err(mpsc::RecvTimeoutError::Timeout) => {
            tracing::warn!(timeout_secs = timeout.as_secs_f64(), "OCR page timed out, skipping");
            Ok(String::new())
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(ExtractionError::OcrProcessing(
            "OCR worker stopped without a result".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_page_returns_text() {
        let engine: SharedOcrEngine = Arc::new(MockOcrEngine::new("Nationality: Togolese", 0.9));
        let text = ocr_with_timeout(&engine, vec![], Duration::from_secs(5)).unwrap();
        assert_eq!(text, "Nationality: Togolese");
    }

    #[test]
    fn slow_page_yields_empty_text() {
        let engine: SharedOcrEngine = Arc::new(
            MockOcrEngine::new("never seen", 0.9).with_delay(Duration::from_millis(500)),
        );
        let text = ocr_with_timeout(&engine, vec![], Duration::from_millis(20)).unwrap();
        assert!(text.is_empty());
    }

    #[cfg(feature = "ocr")]
    #[test]
    fn missing_tessdata_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            BundledTesseract::new(dir.path()),
            Err(ExtractionError::TessdataNotFound(_))
        ));
    }
}
