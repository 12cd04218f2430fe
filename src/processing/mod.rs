pub mod colorspace;
pub mod headshot;
pub mod image_processor;
pub mod metadata;
pub mod ocr;
pub mod quality;

pub use headshot::{HeadshotAssessment, HeadshotValidator};
pub use image_processor::ImageProcessor;
pub use metadata::MetadataAnalyzer;
pub use ocr::{OcrEngine, TesseractOcr, TextExtractor};
pub use quality::ImageQualityAnalyzer;
