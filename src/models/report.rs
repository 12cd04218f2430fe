use std::collections::BTreeMap;

use serde::Serialize;

use crate::utils::AnalysisError;

/// Risk tier assigned from the final fraud score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            RiskLevel::High
        } else if score >= 50.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// A component sub-score plus the weight it carried in the aggregate,
/// rendered as an integer percentage.
#[derive(Debug, Clone, Serialize)]
pub struct WeightedScore {
    pub score: f64,
    pub weight: String,
}

/// The metadata component additionally carries its findings list.
#[derive(Debug, Clone, Serialize)]
pub struct MetadataScore {
    pub score: f64,
    pub findings: Vec<String>,
    pub weight: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentScores {
    pub text_fraud_score: WeightedScore,
    pub image_fraud_score: WeightedScore,
    pub metadata_analysis: MetadataScore,
}

/// Static guide explaining score polarity and the risk bands, embedded in
/// every report so the output is self-describing.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreInterpretation {
    pub all_scores: &'static str,
    pub weighting: WeightingGuide,
    pub risk_levels: RiskBands,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeightingGuide {
    pub text_matching: String,
    pub image_quality: String,
    pub metadata_analysis: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskBands {
    #[serde(rename = "Low")]
    pub low: &'static str,
    #[serde(rename = "Medium")]
    pub medium: &'static str,
    #[serde(rename = "High")]
    pub high: &'static str,
}

impl ScoreInterpretation {
    pub fn new(text_weight: f64, image_weight: f64, metadata_weight: f64) -> Self {
        ScoreInterpretation {
            all_scores: "0-100 (0 = good/authentic, 100 = bad/potentially fraudulent)",
            weighting: WeightingGuide {
                text_matching: format!("{:.0}% of total score", text_weight * 100.0),
                image_quality: format!("{:.0}% of total score", image_weight * 100.0),
                metadata_analysis: format!("{:.0}% of total score", metadata_weight * 100.0),
            },
            risk_levels: RiskBands {
                low: "0-49",
                medium: "50-74",
                high: "75-100",
            },
        }
    }
}

/// Final, immutable analysis output. One report per document+claim pair.
#[derive(Debug, Clone, Serialize)]
pub struct FraudReport {
    pub fraud_score: f64,
    pub risk_level: RiskLevel,
    pub component_scores: ComponentScores,
    pub match_scores: BTreeMap<String, f64>,
    pub scoring_factors: Vec<String>,
    pub quality_metrics: BTreeMap<String, String>,
    pub fake_indicators: Vec<String>,
    pub raw_text: String,
    pub score_interpretation: ScoreInterpretation,
}

impl FraudReport {
    pub fn to_json_pretty(&self) -> Result<String, AnalysisError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AnalysisError::IoError(format!("Failed to serialize report: {}", e)))
    }
}
