use std::io::Write;

use log::{debug, warn};
use tempfile::NamedTempFile;
use tesseract::Tesseract;

use crate::utils::AnalysisError;

/// Characters that can legitimately appear on a license card.
const CHAR_WHITELIST: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 ,.'()-/";

/// Recognition capability the extractor runs against. The pipeline only
/// needs text back; swapping the engine (or stubbing it in tests) must not
/// touch any scoring code.
pub trait OcrEngine {
    fn recognize(&self, image_png: &[u8]) -> Result<String, AnalysisError>;
}

/// Tesseract-backed engine configured for a single uniform block of text
/// restricted to the license character set.
pub struct TesseractOcr;

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image_png: &[u8]) -> Result<String, AnalysisError> {
        let mut temp_file = NamedTempFile::new()
            .map_err(|e| AnalysisError::OcrError(format!("Failed to create temp file: {}", e)))?;

        temp_file
            .write_all(image_png)
            .map_err(|e| AnalysisError::OcrError(format!("Failed to write to temp file: {}", e)))?;

        let image_path = temp_file
            .path()
            .to_str()
            .ok_or_else(|| AnalysisError::OcrError("Failed to convert path to string".to_string()))?;

        let text = Tesseract::new(None, Some("eng"))
            .map_err(|e| AnalysisError::OcrError(format!("Tesseract init error: {}", e)))?
            .set_image(image_path)
            .map_err(|e| AnalysisError::OcrError(format!("Tesseract set image error: {}", e)))?
            .set_variable("tessedit_char_whitelist", CHAR_WHITELIST)
            .map_err(|e| AnalysisError::OcrError(format!("Tesseract set variable error: {}", e)))?
            .set_variable("tessedit_pageseg_mode", "6")
            .map_err(|e| AnalysisError::OcrError(format!("Tesseract set variable error: {}", e)))?
            .get_text()
            .map_err(|e| AnalysisError::OcrError(format!("Tesseract error: {}", e)))?;

        Ok(text)
    }
}

/// Thin normalization adapter between the engine and the text validator.
/// Carries no fraud logic.
pub struct TextExtractor;

impl TextExtractor {
    /// Run recognition and normalize the output: upper case, whitespace runs
    /// collapsed to single spaces, trimmed. A failing or empty engine yields
    /// an empty string rather than failing the pipeline; the text validator
    /// treats that as nothing matching.
    pub fn extract(engine: &dyn OcrEngine, image_png: &[u8]) -> String {
        match engine.recognize(image_png) {
            Ok(text) => {
                let normalized = Self::normalize(&text);
                debug!("OCR text ({} chars): {}", normalized.len(), normalized);
                normalized
            }
            Err(e) => {
                warn!("OCR failed, continuing with empty text: {}", e);
                String::new()
            }
        }
    }

    fn normalize(text: &str) -> String {
        text.to_uppercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedOcr(&'static str);

    impl OcrEngine for FixedOcr {
        fn recognize(&self, _image_png: &[u8]) -> Result<String, AnalysisError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingOcr;

    impl OcrEngine for FailingOcr {
        fn recognize(&self, _image_png: &[u8]) -> Result<String, AnalysisError> {
            Err(AnalysisError::OcrError("engine unavailable".to_string()))
        }
    }

    #[test]
    fn test_extract_normalizes_whitespace_and_case() {
        let engine = FixedOcr("new york  state\n\n dmv\t id");
        let text = TextExtractor::extract(&engine, &[]);
        assert_eq!(text, "NEW YORK STATE DMV ID");
    }

    #[test]
    fn test_engine_failure_yields_empty_text() {
        let text = TextExtractor::extract(&FailingOcr, &[]);
        assert_eq!(text, "");
    }

    #[test]
    fn test_empty_recognition_yields_empty_text() {
        let engine = FixedOcr("   \n  ");
        assert_eq!(TextExtractor::extract(&engine, &[]), "");
    }
}
