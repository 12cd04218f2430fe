use std::path::Path;
use std::time::SystemTime;

use chrono::{Local, NaiveDate};
use image::RgbImage;
use log::{info, warn};

use crate::models::{FileMetadata, FraudReport, IdentityClaim, JurisdictionRules};
use crate::processing::{
    ImageProcessor, ImageQualityAnalyzer, MetadataAnalyzer, OcrEngine, TesseractOcr, TextExtractor,
};
use crate::utils::AnalysisError;
use crate::validation::{ScoreAggregator, ScoringConfig, TextValidator};

/// Orchestrates one full document analysis: decode, image-quality analysis,
/// OCR, text validation, metadata analysis, aggregation.
///
/// The analyzer itself holds only immutable configuration and can be reused
/// across documents; every per-document value is built fresh inside a call,
/// so identical inputs always produce identical reports.
pub struct LicenseAnalyzer {
    rules: JurisdictionRules,
    config: ScoringConfig,
    ocr: Box<dyn OcrEngine>,
}

impl LicenseAnalyzer {
    /// Analyzer backed by the system Tesseract engine.
    pub fn new() -> Result<Self, AnalysisError> {
        Self::with_engine(Box::new(TesseractOcr))
    }

    /// Analyzer with a caller-supplied recognition engine. Used by tests and
    /// by embedders with their own OCR deployment.
    pub fn with_engine(ocr: Box<dyn OcrEngine>) -> Result<Self, AnalysisError> {
        Ok(LicenseAnalyzer {
            rules: JurisdictionRules::builtin()?,
            config: ScoringConfig::default(),
            ocr,
        })
    }

    pub fn with_rules(mut self, rules: JurisdictionRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_config(mut self, config: ScoringConfig) -> Self {
        self.config = config;
        self
    }

    pub fn rules(&self) -> &JurisdictionRules {
        &self.rules
    }

    /// Run the full pipeline against an image file. An unreadable image is
    /// the only fatal condition; everything downstream degrades into the
    /// score instead of failing.
    pub fn analyze(&self, image_path: &Path, claim: &IdentityClaim) -> Result<FraudReport, AnalysisError> {
        let decoded = image::open(image_path)
            .map_err(|e| AnalysisError::LoadError(format!("{}: {}", image_path.display(), e)))?
            .to_rgb8();

        let file_metadata = match FileMetadata::collect(image_path, &decoded) {
            Ok(meta) => meta,
            Err(e) => {
                warn!("Metadata gathering failed, scoring as fault: {}", e);
                FileMetadata::failed(e.to_string())
            }
        };

        let today = Local::now().naive_local().date();
        let now = SystemTime::now();
        Ok(self.analyze_decoded(&decoded, file_metadata, claim, today, now))
    }

    /// The deterministic core: every clock and collaborator input is a
    /// parameter.
    pub fn analyze_decoded(
        &self,
        image: &RgbImage,
        file_metadata: FileMetadata,
        claim: &IdentityClaim,
        today: NaiveDate,
        now: SystemTime,
    ) -> FraudReport {
        let quality = ImageQualityAnalyzer::analyze(image);
        info!(
            "Image analysis: sub-score {:.1}, {} fake indicator(s)",
            quality.image_fraud_score,
            quality.fake_indicators.len()
        );

        let raw_text = match ImageProcessor::prepare_for_ocr(image) {
            Ok(png) => TextExtractor::extract(self.ocr.as_ref(), &png),
            Err(e) => {
                warn!("Preprocessing failed, continuing with empty text: {}", e);
                String::new()
            }
        };

        let text_result = TextValidator::validate(&raw_text, claim, &self.rules, today);
        let metadata_result = MetadataAnalyzer::analyze(&file_metadata, now);

        ScoreAggregator::aggregate(
            &self.config,
            &text_result,
            &quality,
            &metadata_result,
            &raw_text,
        )
    }
}
