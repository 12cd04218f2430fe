use std::collections::BTreeMap;
use std::time::SystemTime;

use serde::Deserialize;

/// The identity a document is claimed to belong to. Every field is optional;
/// a check whose inputs were never supplied is skipped without penalty.
///
/// Name and address fields are upper-cased at construction so comparisons
/// against OCR output (which is normalized to upper case) are direct. A field
/// that is present but empty is still a supplied value and is matched
/// literally; only `None` disables a check.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityClaim {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub street_address: Option<String>,
    pub street_city: Option<String>,
    pub street_state: Option<String>,
    pub street_zip: Option<String>,
    pub date_of_birth: Option<String>,
}

impl IdentityClaim {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        first_name: Option<&str>,
        last_name: Option<&str>,
        street_address: Option<&str>,
        street_city: Option<&str>,
        street_state: Option<&str>,
        street_zip: Option<&str>,
        date_of_birth: Option<&str>,
    ) -> Self {
        IdentityClaim {
            first_name: first_name.map(|s| s.to_uppercase()),
            last_name: last_name.map(|s| s.to_uppercase()),
            street_address: street_address.map(|s| s.to_uppercase()),
            street_city: street_city.map(|s| s.to_uppercase()),
            street_state: street_state.map(|s| s.to_uppercase()),
            street_zip: street_zip.map(|s| s.to_string()),
            date_of_birth: date_of_birth.map(|s| s.to_string()),
        }
    }

    /// Apply the constructor's case normalization to a claim deserialized
    /// from external input (e.g. a claims JSON file).
    pub fn normalized(self) -> Self {
        IdentityClaim {
            first_name: self.first_name.map(|s| s.to_uppercase()),
            last_name: self.last_name.map(|s| s.to_uppercase()),
            street_address: self.street_address.map(|s| s.to_uppercase()),
            street_city: self.street_city.map(|s| s.to_uppercase()),
            street_state: self.street_state.map(|s| s.to_uppercase()),
            street_zip: self.street_zip,
            date_of_birth: self.date_of_birth,
        }
    }
}

/// The seven image-quality features, each clamped to [0, 100]. Owned by a
/// single analyzer run and never mutated after computation.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityMetrics {
    pub resolution_score: f64,
    pub color_transition: f64,
    pub rainbow_effect: f64,
    pub blur_score: f64,
    pub saturation_score: f64,
    pub digital_artifacts: f64,
    pub microprint_score: f64,
}

impl QualityMetrics {
    /// Render the metrics map for the report, one decimal with a percent sign.
    pub fn formatted(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("resolution_score".to_string(), format!("{:.1}%", self.resolution_score));
        map.insert("color_transition".to_string(), format!("{:.1}%", self.color_transition));
        map.insert("rainbow_effect".to_string(), format!("{:.1}%", self.rainbow_effect));
        map.insert("blur_score".to_string(), format!("{:.1}%", self.blur_score));
        map.insert("saturation_score".to_string(), format!("{:.1}%", self.saturation_score));
        map.insert("digital_artifacts".to_string(), format!("{:.1}%", self.digital_artifacts));
        map.insert("microprint_score".to_string(), format!("{:.1}%", self.microprint_score));
        map
    }
}

/// One ImageQualityAnalyzer run: the feature metrics, the qualitative fake
/// indicators they triggered, the fixed-penalty accumulator those triggers
/// added up to, and the weighted-and-boosted image fraud sub-score.
///
/// Constructed fresh per document; no state crosses document boundaries.
#[derive(Debug, Clone)]
pub struct QualityAnalysis {
    pub metrics: QualityMetrics,
    pub fake_indicators: Vec<String>,
    pub indicator_penalty: f64,
    pub image_fraud_score: f64,
}

/// Result of validating OCR text against the claimed identity.
#[derive(Debug, Clone, Default)]
pub struct TextValidationResult {
    pub text_fraud_score: f64,
    pub scoring_factors: Vec<String>,
    pub match_scores: BTreeMap<String, f64>,
    /// Reserved for structured field extraction; currently carries nothing
    /// beyond what raw_text already exposes.
    pub extracted_data: BTreeMap<String, String>,
}

/// Result of analyzing the source file's metadata.
#[derive(Debug, Clone)]
pub struct MetadataFindings {
    pub metadata_score: f64,
    pub findings: Vec<String>,
}

/// Outcome of reading embedded tag metadata. Absence of tags is normal for
/// phone captures and carries no penalty; a read failure is penalized.
#[derive(Debug, Clone)]
pub enum TagRead {
    Absent,
    Tags(Vec<String>),
    Failed(String),
}

/// Everything the metadata analyzer consumes about the source file, gathered
/// once so the scoring itself is a pure function of this value and a
/// reference instant.
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// Lower-cased extension including the dot, e.g. ".jpg".
    pub extension: Option<String>,
    pub modified: Option<SystemTime>,
    pub accessed: Option<SystemTime>,
    /// Sniffed container format name, e.g. "JPEG".
    pub container: Option<String>,
    pub software_tags: TagRead,
    /// Estimated original JPEG encode quality, when the container is
    /// JPEG-family and estimation succeeded.
    pub quality_estimate: Option<u8>,
}

impl FileMetadata {
    /// A metadata value representing a failed gather. The analyzer converts
    /// this into the fixed recovery penalty instead of an error.
    pub fn failed(reason: String) -> Self {
        FileMetadata {
            extension: None,
            modified: None,
            accessed: None,
            container: None,
            software_tags: TagRead::Failed(reason),
            quality_estimate: None,
        }
    }
}

/// An externally detected face rectangle, in pixel coordinates of the source
/// image. Face detection itself is a collaborator concern; this crate only
/// judges the plausibility of regions handed to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_upper_cases_names() {
        let claim = IdentityClaim::new(
            Some("John"),
            Some("Smith"),
            Some("12 Oak St"),
            Some("Albany"),
            Some("new york"),
            Some("10001"),
            Some("01/02/1990"),
        );
        assert_eq!(claim.first_name.as_deref(), Some("JOHN"));
        assert_eq!(claim.street_state.as_deref(), Some("NEW YORK"));
        // zip and dob pass through untouched
        assert_eq!(claim.street_zip.as_deref(), Some("10001"));
    }

    #[test]
    fn test_absent_field_stays_absent() {
        let claim = IdentityClaim::new(None, None, None, None, None, None, None);
        assert!(claim.first_name.is_none());
        assert!(claim.street_zip.is_none());
    }

    #[test]
    fn test_formatted_metrics_one_decimal() {
        let metrics = QualityMetrics {
            resolution_score: 12.34,
            color_transition: 100.0,
            rainbow_effect: 0.0,
            blur_score: 49.999,
            saturation_score: 50.0,
            digital_artifacts: 3.0,
            microprint_score: 66.6,
        };
        let formatted = metrics.formatted();
        assert_eq!(formatted["resolution_score"], "12.3%");
        assert_eq!(formatted["color_transition"], "100.0%");
        assert_eq!(formatted["blur_score"], "50.0%");
        assert_eq!(formatted.len(), 7);
    }
}
