pub mod data;
pub mod report;
pub mod rules;

pub use data::{
    FaceRegion, FileMetadata, IdentityClaim, MetadataFindings, QualityAnalysis, QualityMetrics,
    TagRead, TextValidationResult,
};
pub use report::{
    ComponentScores, FraudReport, MetadataScore, RiskLevel, ScoreInterpretation, WeightedScore,
};
pub use rules::{state_abbreviation, JurisdictionRule, JurisdictionRules};
