use chrono::NaiveDate;
use log::debug;
use regex::Regex;

use crate::models::rules::state_abbreviation;
use crate::models::{IdentityClaim, JurisdictionRules, TextValidationResult};

/// Literal words and phrases that only appear on specimen or training
/// documents, never on issued licenses.
const FAKE_DOCUMENT_MARKERS: [&str; 13] = [
    "SAMPLE",
    "SPECIMEN",
    "NOT FOR IDENTIFICATION",
    "VOID",
    "NON-VALID",
    "INVALID",
    "TEST",
    "DEMO",
    "EXAMPLE",
    "NOT A VALID",
    "NOT VALID",
    "TRAINING",
    "PRACTICE",
];

const NAME_MATCH_THRESHOLD: f64 = 80.0;
const NAME_MISMATCH_PENALTY: f64 = 40.0;
const ZIP_MISMATCH_PENALTY: f64 = 45.0;
const ZIP_PRESENCE_CREDIT: f64 = 10.0;
const FAKE_MARKER_PENALTY: f64 = 50.0;
const EXPIRED_PENALTY: f64 = 40.0;
const BAD_EXPIRY_FORMAT_PENALTY: f64 = 30.0;

/// Validates normalized OCR text against the claimed identity and the
/// jurisdiction rule table. Checks are independent and additive; a check
/// whose claim fields were never supplied is skipped without penalty.
pub struct TextValidator;

impl TextValidator {
    pub fn validate(
        text: &str,
        claim: &IdentityClaim,
        rules: &JurisdictionRules,
        today: NaiveDate,
    ) -> TextValidationResult {
        let mut result = TextValidationResult::default();
        let text = text.to_uppercase();
        debug!("Validating against text: {}", text);

        Self::check_zip(&text, claim, rules, &mut result);
        Self::check_names(&text, claim, &mut result);
        Self::check_fake_markers(&text, &mut result);
        Self::check_expiration(&text, today, &mut result);

        result
    }

    /// Two independent ZIP checks that can both fire: the prefix must belong
    /// to the claimed state's jurisdiction, and the literal ZIP string should
    /// appear somewhere in the card text.
    fn check_zip(
        text: &str,
        claim: &IdentityClaim,
        rules: &JurisdictionRules,
        result: &mut TextValidationResult,
    ) {
        let (zip, state) = match (&claim.street_zip, &claim.street_state) {
            (Some(zip), Some(state)) => (zip, state),
            _ => return,
        };

        let code = if state.len() == 2 {
            Some(state.as_str())
        } else {
            state_abbreviation(state)
        };

        if let Some(rule) = code.and_then(|c| rules.get(c)) {
            let prefix: String = zip.chars().take(3).collect();
            if !rule.zip_prefixes.iter().any(|p| *p == prefix) {
                result.text_fraud_score += ZIP_MISMATCH_PENALTY;
                result
                    .scoring_factors
                    .push(format!("Invalid ZIP code prefix {} for state {}", prefix, state));
            }
        }

        if text.contains(zip.as_str()) {
            result.text_fraud_score = (result.text_fraud_score - ZIP_PRESENCE_CREDIT).max(0.0);
            result.scoring_factors.push("ZIP code found in ID text".to_string());
        } else {
            result.text_fraud_score += ZIP_MISMATCH_PENALTY;
            result
                .scoring_factors
                .push(format!("ZIP code {} not found in ID text", zip));
        }
    }

    fn check_names(text: &str, claim: &IdentityClaim, result: &mut TextValidationResult) {
        if claim.first_name.is_none() && claim.last_name.is_none() {
            return;
        }

        if let Some(first) = &claim.first_name {
            let score = partial_ratio(text, first);
            result.match_scores.insert("first_name".to_string(), score);
            if score < NAME_MATCH_THRESHOLD {
                result.text_fraud_score += NAME_MISMATCH_PENALTY;
                result
                    .scoring_factors
                    .push(format!("First name low match: {:.0}%", score));
            }
        }

        if let Some(last) = &claim.last_name {
            let score = partial_ratio(text, last);
            result.match_scores.insert("last_name".to_string(), score);
            if score < NAME_MATCH_THRESHOLD {
                result.text_fraud_score += NAME_MISMATCH_PENALTY;
                result
                    .scoring_factors
                    .push(format!("Last name low match: {:.0}%", score));
            }
        }

        let first_low = result
            .match_scores
            .get("first_name")
            .is_some_and(|s| *s < NAME_MATCH_THRESHOLD);
        let last_low = result
            .match_scores
            .get("last_name")
            .is_some_and(|s| *s < NAME_MATCH_THRESHOLD);
        if !first_low && !last_low {
            return;
        }

        // Whole-text matching missed; re-scan with layout-aware extractors
        // ("Last, First", "First Last", newline-split pairs) and let a strong
        // candidate pair reverse the penalty.
        for pattern in Self::name_patterns() {
            for caps in pattern.captures_iter(text) {
                let (last_part, first_part) = match (caps.get(1), caps.get(2)) {
                    (Some(l), Some(f)) => (l.as_str(), f.as_str()),
                    _ => continue,
                };
                if let Some(first) = &claim.first_name {
                    Self::rescue_name(result, "first_name", "first name", partial_ratio(first_part, first));
                }
                if let Some(last) = &claim.last_name {
                    Self::rescue_name(result, "last_name", "last name", partial_ratio(last_part, last));
                }
            }
        }
    }

    /// A candidate similarity from pattern extraction replaces the recorded
    /// match when it is better, and reverses the earlier mismatch penalty
    /// when it clears the acceptance threshold.
    pub(crate) fn rescue_name(
        result: &mut TextValidationResult,
        field: &str,
        factor_needle: &str,
        candidate: f64,
    ) {
        let current = result.match_scores.get(field).copied().unwrap_or(0.0);
        if candidate <= current {
            return;
        }
        result.match_scores.insert(field.to_string(), candidate);

        if candidate >= NAME_MATCH_THRESHOLD {
            let before = result.scoring_factors.len();
            result
                .scoring_factors
                .retain(|f| !f.to_lowercase().contains(factor_needle));
            // Only refund when a penalty entry was actually removed, so a
            // second strong candidate cannot refund twice.
            if result.scoring_factors.len() < before {
                result.text_fraud_score = (result.text_fraud_score - NAME_MISMATCH_PENALTY).max(0.0);
            }
        }
    }

    fn name_patterns() -> Vec<Regex> {
        [
            // Last, First
            r"([A-Z'-]+)[,.\s]+([A-Z'-]+(?:\s+[A-Z'-]+)*)",
            // First Last
            r"([A-Z'-]+(?:\s+[A-Z'-]+)*)\s+([A-Z'-]+)",
            // Name parts split across lines
            r"([A-Z'-]+)[,.\s]*\n\s*([A-Z'-]+)",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    }

    fn check_fake_markers(text: &str, result: &mut TextValidationResult) {
        for marker in FAKE_DOCUMENT_MARKERS {
            if text.contains(marker) {
                result.text_fraud_score += FAKE_MARKER_PENALTY;
                result
                    .scoring_factors
                    .push(format!("Found fake indicator: {}", marker));
            }
        }
    }

    fn check_expiration(text: &str, today: NaiveDate, result: &mut TextValidationResult) {
        let pattern = match Regex::new(r"(?:EXP|EXPIRES?)[,.\s:]+(\d{2}/\d{2}/\d{4})") {
            Ok(p) => p,
            Err(_) => return,
        };
        let raw = match pattern.captures(text).and_then(|c| c.get(1)) {
            Some(m) => m.as_str(),
            None => return,
        };

        match NaiveDate::parse_from_str(raw, "%m/%d/%Y") {
            Ok(expiry) if expiry < today => {
                result.text_fraud_score += EXPIRED_PENALTY;
                result.scoring_factors.push("ID is expired".to_string());
            }
            Ok(_) => {}
            Err(_) => {
                result.text_fraud_score += BAD_EXPIRY_FORMAT_PENALTY;
                result
                    .scoring_factors
                    .push("Invalid expiration date format".to_string());
            }
        }
    }
}

/// Fuzzy similarity in [0, 100]: the best edit-distance ratio of the shorter
/// string against any equal-length window of the longer, rounded to a whole
/// number. 100 means the shorter string appears verbatim.
pub(crate) fn partial_ratio(a: &str, b: &str) -> f64 {
    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let short: Vec<char> = shorter.chars().collect();
    let long: Vec<char> = longer.chars().collect();
    if short.is_empty() {
        return 0.0;
    }

    let window = short.len();
    let mut best = 0.0f64;
    for start in 0..=(long.len() - window) {
        let distance = levenshtein(&short, &long[start..start + window]);
        let ratio = 100.0 * (1.0 - distance as f64 / window as f64);
        if ratio > best {
            best = ratio;
            if best >= 100.0 {
                break;
            }
        }
    }
    best.round()
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
