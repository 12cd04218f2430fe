use crate::models::{
    ComponentScores, FraudReport, MetadataFindings, MetadataScore, QualityAnalysis, RiskLevel,
    ScoreInterpretation, TextValidationResult, WeightedScore,
};

/// One row of the conditional weight table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentWeights {
    pub text: f64,
    pub image: f64,
    pub metadata: f64,
}

/// Tunable aggregation constants. The defaults are the operationally tuned
/// values; none of them is derived from the others, so deployments adjust
/// them here rather than in scoring code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    /// Weights when the metadata sub-score stays at or below the switch.
    pub standard_weights: ComponentWeights,
    /// Weights once metadata alone is alarming enough to deserve more pull.
    pub high_metadata_weights: ComponentWeights,
    pub metadata_switch: f64,
    pub rescale_divisor: f64,
    pub rescale_multiplier: f64,
    pub indicator_bonus: f64,
    pub indicator_bonus_threshold: usize,
    pub text_bonus: f64,
    pub text_bonus_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            standard_weights: ComponentWeights {
                text: 0.2,
                image: 0.7,
                metadata: 0.1,
            },
            high_metadata_weights: ComponentWeights {
                text: 0.2,
                image: 0.6,
                metadata: 0.2,
            },
            metadata_switch: 80.0,
            rescale_divisor: 60.0,
            rescale_multiplier: 75.0,
            indicator_bonus: 10.0,
            indicator_bonus_threshold: 2,
            text_bonus: 15.0,
            text_bonus_threshold: 90.0,
        }
    }
}

/// Fuses the three sub-scores into the final fraud score and assembles the
/// report. Deterministic: the same inputs always produce the same report.
pub struct ScoreAggregator;

impl ScoreAggregator {
    pub fn aggregate(
        config: &ScoringConfig,
        text: &TextValidationResult,
        quality: &QualityAnalysis,
        metadata: &MetadataFindings,
        raw_text: &str,
    ) -> FraudReport {
        let weights = if metadata.metadata_score > config.metadata_switch {
            config.high_metadata_weights
        } else {
            config.standard_weights
        };

        let total = text.text_fraud_score * weights.text
            + quality.image_fraud_score * weights.image
            + metadata.metadata_score * weights.metadata;

        let mut normalized = total / config.rescale_divisor * config.rescale_multiplier;

        if quality.fake_indicators.len() >= config.indicator_bonus_threshold {
            normalized = (normalized + config.indicator_bonus).min(100.0);
        }
        if text.text_fraud_score > config.text_bonus_threshold {
            normalized = (normalized + config.text_bonus).min(100.0);
        }
        let fraud_score = round1(normalized.clamp(0.0, 100.0));

        FraudReport {
            fraud_score,
            risk_level: RiskLevel::from_score(fraud_score),
            component_scores: ComponentScores {
                text_fraud_score: WeightedScore {
                    score: round1(text.text_fraud_score),
                    weight: format_weight(weights.text),
                },
                image_fraud_score: WeightedScore {
                    score: round1(quality.image_fraud_score),
                    weight: format_weight(weights.image),
                },
                metadata_analysis: MetadataScore {
                    score: round1(metadata.metadata_score),
                    findings: metadata.findings.clone(),
                    weight: format_weight(weights.metadata),
                },
            },
            match_scores: text.match_scores.clone(),
            scoring_factors: text.scoring_factors.clone(),
            quality_metrics: quality.metrics.formatted(),
            fake_indicators: quality.fake_indicators.clone(),
            raw_text: raw_text.to_string(),
            score_interpretation: ScoreInterpretation::new(
                weights.text,
                weights.image,
                weights.metadata,
            ),
        }
    }
}

fn format_weight(weight: f64) -> String {
    format!("{:.0}%", weight * 100.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QualityMetrics;

    fn quality(image_score: f64, indicators: usize) -> QualityAnalysis {
        QualityAnalysis {
            metrics: QualityMetrics {
                resolution_score: 0.0,
                color_transition: 0.0,
                rainbow_effect: 0.0,
                blur_score: 0.0,
                saturation_score: 0.0,
                digital_artifacts: 0.0,
                microprint_score: 0.0,
            },
            fake_indicators: (0..indicators)
                .map(|i| format!("indicator {}", i))
                .collect(),
            indicator_penalty: 0.0,
            image_fraud_score: image_score,
        }
    }

    fn text(score: f64) -> TextValidationResult {
        TextValidationResult {
            text_fraud_score: score,
            ..Default::default()
        }
    }

    fn metadata(score: f64) -> MetadataFindings {
        MetadataFindings {
            metadata_score: score,
            findings: Vec::new(),
        }
    }

    #[test]
    fn test_all_zero_inputs_yield_zero_low() {
        let report = ScoreAggregator::aggregate(
            &ScoringConfig::default(),
            &text(0.0),
            &quality(0.0, 0),
            &metadata(0.0),
            "",
        );
        assert_eq!(report.fraud_score, 0.0);
        assert_eq!(report.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_all_maximum_inputs_clamp_to_100_high() {
        let report = ScoreAggregator::aggregate(
            &ScoringConfig::default(),
            &text(100.0),
            &quality(100.0, 0),
            &metadata(100.0),
            "",
        );
        assert_eq!(report.fraud_score, 100.0);
        assert_eq!(report.risk_level, RiskLevel::High);
        // Metadata above the switch pulls the high-metadata weight row
        assert_eq!(report.component_scores.image_fraud_score.weight, "60%");
        assert_eq!(report.component_scores.metadata_analysis.weight, "20%");
    }

    #[test]
    fn test_weight_selection_switches_strictly_above_80() {
        let at_switch = ScoreAggregator::aggregate(
            &ScoringConfig::default(),
            &text(0.0),
            &quality(0.0, 0),
            &metadata(80.0),
            "",
        );
        assert_eq!(at_switch.component_scores.image_fraud_score.weight, "70%");
        assert_eq!(at_switch.component_scores.metadata_analysis.weight, "10%");

        let above_switch = ScoreAggregator::aggregate(
            &ScoringConfig::default(),
            &text(0.0),
            &quality(0.0, 0),
            &metadata(80.1),
            "",
        );
        assert_eq!(above_switch.component_scores.image_fraud_score.weight, "60%");
        assert_eq!(above_switch.component_scores.metadata_analysis.weight, "20%");
    }

    #[test]
    fn test_rescaling_constant() {
        // text 0, image 48, metadata 0: total 33.6, rescaled 42.0
        let report = ScoreAggregator::aggregate(
            &ScoringConfig::default(),
            &text(0.0),
            &quality(48.0, 0),
            &metadata(0.0),
            "",
        );
        assert_eq!(report.fraud_score, 42.0);
        assert_eq!(report.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_indicator_bonus_at_two() {
        let config = ScoringConfig::default();
        let without = ScoreAggregator::aggregate(&config, &text(0.0), &quality(20.0, 1), &metadata(0.0), "");
        let with = ScoreAggregator::aggregate(&config, &text(0.0), &quality(20.0, 2), &metadata(0.0), "");
        assert_eq!(with.fraud_score - without.fraud_score, 10.0);
    }

    #[test]
    fn test_text_bonus_above_90() {
        let config = ScoringConfig::default();
        let below = ScoreAggregator::aggregate(&config, &text(90.0), &quality(0.0, 0), &metadata(0.0), "");
        let above = ScoreAggregator::aggregate(&config, &text(91.0), &quality(0.0, 0), &metadata(0.0), "");
        // 90 -> 22.5; 91 -> 22.75 + 15 bonus
        assert_eq!(below.fraud_score, 22.5);
        assert_eq!(above.fraud_score, 37.8);
    }

    #[test]
    fn test_report_carries_factor_lists_through() {
        let mut text_result = text(45.0);
        text_result
            .scoring_factors
            .push("ZIP code 90210 not found in ID text".to_string());
        text_result.match_scores.insert("first_name".to_string(), 100.0);

        let mut quality_result = quality(10.0, 1);
        quality_result.fake_indicators = vec!["Unnatural color transitions".to_string()];

        let mut metadata_result = metadata(25.0);
        metadata_result.findings.push("Unusual file extension: .bmp".to_string());

        let report = ScoreAggregator::aggregate(
            &ScoringConfig::default(),
            &text_result,
            &quality_result,
            &metadata_result,
            "RAW CARD TEXT",
        );

        assert_eq!(report.scoring_factors.len(), 1);
        assert_eq!(report.fake_indicators.len(), 1);
        assert_eq!(report.component_scores.metadata_analysis.findings.len(), 1);
        assert_eq!(report.match_scores["first_name"], 100.0);
        assert_eq!(report.raw_text, "RAW CARD TEXT");
        assert_eq!(report.quality_metrics.len(), 7);
    }
}
