pub mod license_analyzer;
pub mod models;
pub mod processing;
pub mod utils;
pub mod validation;

pub use license_analyzer::LicenseAnalyzer;
