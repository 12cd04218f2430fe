// Batch driver: run license fraud analysis over a directory of images
// against a claims file, one JSON report per image.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::Parser;
use idlens::models::IdentityClaim;
use idlens::utils::AnalysisError;
use idlens::LicenseAnalyzer;
use log::warn;

#[derive(Parser)]
#[command(name = "idlens", about = "Driver's license fraud risk scoring")]
struct Args {
    /// Directory of license images (.png, .jpg, .jpeg)
    #[arg(long)]
    images: PathBuf,

    /// JSON file mapping image file names to claimed identity fields
    #[arg(long)]
    claims: PathBuf,
}

fn main() {
    env_logger::init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), AnalysisError> {
    let claims_raw = std::fs::read_to_string(&args.claims)
        .map_err(|e| AnalysisError::IoError(format!("Failed to read claims file: {}", e)))?;
    let claims: HashMap<String, IdentityClaim> = serde_json::from_str(&claims_raw)
        .map_err(|e| AnalysisError::IoError(format!("Failed to parse claims file: {}", e)))?;

    let analyzer = LicenseAnalyzer::new()?;

    let entries = std::fs::read_dir(&args.images)
        .map_err(|e| AnalysisError::IoError(format!("Failed to read image directory: {}", e)))?;

    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!("Skipping unreadable directory entry: {}", e);
                continue;
            }
        };

        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| matches!(e.to_lowercase().as_str(), "png" | "jpg" | "jpeg"))
            .unwrap_or(false);
        if !is_image {
            continue;
        }

        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };

        let claim = match claims.get(&file_name) {
            Some(claim) => claim.clone().normalized(),
            None => {
                warn!("No claim entry for {}, skipping", file_name);
                continue;
            }
        };

        println!("\nAnalyzing: {}", file_name);
        println!("--------------------------------");

        // One bad image must not stop the batch
        match analyzer.analyze(&path, &claim) {
            Ok(report) => match report.to_json_pretty() {
                Ok(json) => println!("{}", json),
                Err(e) => warn!("Failed to render report for {}: {}", file_name, e),
            },
            Err(e) => warn!("Analysis failed for {}: {}", file_name, e),
        }
    }

    Ok(())
}
