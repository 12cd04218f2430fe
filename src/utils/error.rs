use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Image load error: {0}")]
    LoadError(String),
    #[error("Image processing error: {0}")]
    ImageProcessingError(String),
    #[error("OCR error: {0}")]
    OcrError(String),
    #[error("Metadata error: {0}")]
    MetadataError(String),
    #[error("Rule data error: {0}")]
    RuleDataError(String),
    #[error("IO error: {0}")]
    IoError(String),
}
