use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::utils::AnalysisError;

/// Per-jurisdiction reference data: expected license-number format, the class
/// codes the jurisdiction issues, and the ZIP prefixes it covers.
#[derive(Debug, Clone, Deserialize)]
pub struct JurisdictionRule {
    pub license_format: String,
    pub valid_classes: Vec<String>,
    pub zip_prefixes: Vec<String>,
}

/// The full rule table, keyed by two-letter jurisdiction code. The table is
/// reference data, not logic: it ships as a versioned JSON document so rule
/// updates never touch scoring code.
#[derive(Debug, Clone, Deserialize)]
pub struct JurisdictionRules {
    version: String,
    jurisdictions: HashMap<String, JurisdictionRule>,
}

const BUILTIN_RULES: &str = include_str!("../../data/jurisdictions.json");

impl JurisdictionRules {
    /// Load the rule table embedded at build time.
    pub fn builtin() -> Result<Self, AnalysisError> {
        serde_json::from_str(BUILTIN_RULES)
            .map_err(|e| AnalysisError::RuleDataError(format!("Failed to parse built-in rules: {}", e)))
    }

    /// Load a rule table from an external JSON file, for deployments that
    /// update jurisdiction data independently of the binary.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AnalysisError::IoError(format!("Failed to read rule file: {}", e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| AnalysisError::RuleDataError(format!("Failed to parse rule file: {}", e)))
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Look up the rules for a two-letter jurisdiction code. Unknown codes
    /// return None; callers skip the dependent checks in that case.
    pub fn get(&self, code: &str) -> Option<&JurisdictionRule> {
        self.jurisdictions.get(code)
    }

    pub fn len(&self) -> usize {
        self.jurisdictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jurisdictions.is_empty()
    }
}

/// Resolve a full state name (upper-cased) to its two-letter code.
pub fn state_abbreviation(name: &str) -> Option<&'static str> {
    let code = match name.trim() {
        "ALABAMA" => "AL",
        "ALASKA" => "AK",
        "ARIZONA" => "AZ",
        "ARKANSAS" => "AR",
        "CALIFORNIA" => "CA",
        "COLORADO" => "CO",
        "CONNECTICUT" => "CT",
        "DELAWARE" => "DE",
        "FLORIDA" => "FL",
        "GEORGIA" => "GA",
        "HAWAII" => "HI",
        "IDAHO" => "ID",
        "ILLINOIS" => "IL",
        "INDIANA" => "IN",
        "IOWA" => "IA",
        "KANSAS" => "KS",
        "KENTUCKY" => "KY",
        "LOUISIANA" => "LA",
        "MAINE" => "ME",
        "MARYLAND" => "MD",
        "MASSACHUSETTS" => "MA",
        "MICHIGAN" => "MI",
        "MINNESOTA" => "MN",
        "MISSISSIPPI" => "MS",
        "MISSOURI" => "MO",
        "MONTANA" => "MT",
        "NEBRASKA" => "NE",
        "NEVADA" => "NV",
        "NEW HAMPSHIRE" => "NH",
        "NEW JERSEY" => "NJ",
        "NEW MEXICO" => "NM",
        "NEW YORK" => "NY",
        "NORTH CAROLINA" => "NC",
        "NORTH DAKOTA" => "ND",
        "OHIO" => "OH",
        "OKLAHOMA" => "OK",
        "OREGON" => "OR",
        "PENNSYLVANIA" => "PA",
        "RHODE ISLAND" => "RI",
        "SOUTH CAROLINA" => "SC",
        "SOUTH DAKOTA" => "SD",
        "TENNESSEE" => "TN",
        "TEXAS" => "TX",
        "UTAH" => "UT",
        "VERMONT" => "VT",
        "VIRGINIA" => "VA",
        "WASHINGTON" => "WA",
        "WEST VIRGINIA" => "WV",
        "WISCONSIN" => "WI",
        "WYOMING" => "WY",
        "DISTRICT OF COLUMBIA" | "WASHINGTON DC" | "WASHINGTON D.C." => "DC",
        _ => return None,
    };
    Some(code)
}
