use std::path::Path;
use std::time::SystemTime;

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use log::{debug, warn};

use crate::models::{FileMetadata, MetadataFindings, TagRead};
use crate::utils::AnalysisError;

const VALID_EXTENSIONS: [&str; 8] = [
    ".jpg", ".jpeg", ".png", ".heic", ".mpo", ".heif", ".dng", ".raw",
];
const EDITING_SOFTWARE: [&str; 7] = [
    "photoshop",
    "gimp",
    "paint",
    "lightroom",
    "illustrator",
    "affinity",
    "pixelmator",
];
const PHONE_SOFTWARE: [&str; 8] = [
    "iphone",
    "ios",
    "android",
    "samsung",
    "pixel",
    "camera",
    "gcam",
    "snapdragon",
];
const RECOGNIZED_CONTAINERS: [&str; 6] = ["JPEG", "PNG", "HEIC", "MPO", "DNG", "RAW"];
const PHONE_CONTAINERS: [&str; 2] = ["MPO", "HEIC"];

/// Modifications closer to the analysis instant than this suggest active
/// tampering rather than a recent capture.
const RECENT_MODIFICATION_SECS: u64 = 300;

const QUALITY_LADDER: [u8; 8] = [20, 40, 60, 80, 90, 95, 98, 100];

// EXIF/TIFF tags carrying the producing software's name.
const TAG_PROCESSING_SOFTWARE: u16 = 0x000B;
const TAG_SOFTWARE: u16 = 0x0131;
const TAG_ARTIST: u16 = 0x013B;

impl FileMetadata {
    /// Gather everything the analyzer needs about the source file. Failures
    /// here are converted by the caller into `FileMetadata::failed`, which
    /// the analyzer scores as a recovered fault.
    pub fn collect(path: &Path, image: &RgbImage) -> Result<FileMetadata, AnalysisError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()));

        let stat = std::fs::metadata(path)
            .map_err(|e| AnalysisError::MetadataError(format!("Failed to stat file: {}", e)))?;
        let modified = stat.modified().ok();
        let accessed = stat.accessed().ok();

        let bytes = std::fs::read(path)
            .map_err(|e| AnalysisError::MetadataError(format!("Failed to read file: {}", e)))?;

        let container = sniff_container(&bytes, extension.as_deref());

        let software_tags = if container.as_deref() == Some("JPEG") || container.as_deref() == Some("MPO") {
            match read_software_tags(&bytes) {
                Ok(Some(tags)) => TagRead::Tags(tags),
                Ok(None) => TagRead::Absent,
                Err(reason) => TagRead::Failed(reason),
            }
        } else {
            TagRead::Absent
        };

        let quality_estimate = match container.as_deref() {
            Some("JPEG") | Some("MPO") => estimate_jpeg_quality(image, bytes.len() as u64),
            _ => None,
        };

        Ok(FileMetadata {
            extension,
            modified,
            accessed,
            container,
            software_tags,
            quality_estimate,
        })
    }
}

/// Scores the source file's provenance signals. Pure function of the
/// gathered metadata and a reference instant; the clock is a parameter so
/// the recency check is testable.
pub struct MetadataAnalyzer;

impl MetadataAnalyzer {
    pub fn analyze(meta: &FileMetadata, now: SystemTime) -> MetadataFindings {
        let mut score: f64 = 0.0;
        let mut findings = Vec::new();

        match meta.extension.as_deref() {
            Some(ext) if VALID_EXTENSIONS.contains(&ext) => {}
            Some(ext) => {
                score += 25.0;
                findings.push(format!("Unusual file extension: {}", ext));
            }
            None => {
                score += 25.0;
                findings.push("Unusual file extension: (none)".to_string());
            }
        }

        if let Some(modified) = meta.modified {
            if let Ok(age) = now.duration_since(modified) {
                if age.as_secs() < RECENT_MODIFICATION_SECS {
                    score += 10.0;
                    findings.push("File modified very recently".to_string());
                }
            }
        }

        match &meta.software_tags {
            TagRead::Absent => {}
            TagRead::Failed(reason) => {
                score += 15.0;
                findings.push(format!("Error analyzing metadata: {}", reason));
            }
            TagRead::Tags(tags) => {
                for tag in tags {
                    let lowered = tag.to_lowercase();
                    if EDITING_SOFTWARE.iter().any(|s| lowered.contains(s)) {
                        score += 35.0;
                        findings.push(format!("Image edited with {}", tag));
                    } else if PHONE_SOFTWARE.iter().any(|s| lowered.contains(s)) {
                        // Phone provenance counts in the document's favor.
                        score = (score - 10.0).max(0.0);
                        findings.push("Image from phone camera".to_string());
                    }
                }
            }
        }

        match meta.container.as_deref() {
            Some(container) if RECOGNIZED_CONTAINERS.contains(&container) => {
                if PHONE_CONTAINERS.contains(&container) {
                    score = (score - 10.0).max(0.0);
                }
            }
            Some(container) => {
                score += 20.0;
                findings.push(format!("Unusual image format: {}", container));
            }
            None => {
                score += 20.0;
                findings.push("Unusual image format: (unknown)".to_string());
            }
        }

        if let Some(quality) = meta.quality_estimate {
            if quality < 50 {
                score += 15.0;
                findings.push("Suspiciously low JPEG quality".to_string());
            }
        }

        MetadataFindings {
            metadata_score: score.clamp(0.0, 100.0),
            findings,
        }
    }
}

/// Identify the container from magic bytes, with the extension breaking the
/// JPEG/MPO tie (MPO is a JPEG stream with extra picture segments).
fn sniff_container(bytes: &[u8], extension: Option<&str>) -> Option<String> {
    if bytes.len() < 12 {
        return None;
    }
    if bytes[0] == 0xFF && bytes[1] == 0xD8 && bytes[2] == 0xFF {
        if extension == Some(".mpo") {
            return Some("MPO".to_string());
        }
        return Some("JPEG".to_string());
    }
    if bytes[..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] {
        return Some("PNG".to_string());
    }
    if &bytes[4..8] == b"ftyp" {
        let brand = &bytes[8..12];
        if brand.starts_with(b"hei") || brand == b"mif1" {
            return Some("HEIC".to_string());
        }
        return None;
    }
    if bytes[..4] == [0x49, 0x49, 0x2A, 0x00] || bytes[..4] == [0x4D, 0x4D, 0x00, 0x2A] {
        return Some("DNG".to_string());
    }
    None
}

/// Re-encode the decoded image across the quality ladder and pick the level
/// whose output size lands closest to the source file's size.
fn estimate_jpeg_quality(image: &RgbImage, original_size: u64) -> Option<u8> {
    let mut best: Option<(u8, u64)> = None;
    for quality in QUALITY_LADDER {
        let mut buffer = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
        if let Err(e) = encoder.encode_image(image) {
            warn!("JPEG re-encode at quality {} failed: {}", quality, e);
            return None;
        }
        let diff = (buffer.len() as i64 - original_size as i64).unsigned_abs();
        match best {
            Some((_, best_diff)) if diff >= best_diff => {}
            _ => best = Some((quality, diff)),
        }
    }
    let estimate = best.map(|(q, _)| q);
    debug!("Estimated JPEG quality: {:?}", estimate);
    estimate
}

/// Walk the JPEG APP1/TIFF structure and pull the software-identifying ASCII
/// tags out of IFD0. Returns Ok(None) when the file simply carries no EXIF
/// block, which is common for phone photos and not suspicious.
fn read_software_tags(bytes: &[u8]) -> Result<Option<Vec<String>>, String> {
    let mut pos = 2usize; // past SOI
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return Err("Malformed JPEG marker stream".to_string());
        }
        let marker = bytes[pos + 1];
        // Fill bytes and standalone markers carry no length field
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        if marker == 0x01 || (0xD0..=0xD8).contains(&marker) {
            pos += 2;
            continue;
        }
        // Start of scan or end of image: no EXIF ahead of this point
        if marker == 0xDA || marker == 0xD9 {
            return Ok(None);
        }
        let length = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
        if length < 2 || pos + 2 + length > bytes.len() {
            return Err("Truncated JPEG segment".to_string());
        }
        if marker == 0xE1 {
            let payload = &bytes[pos + 4..pos + 2 + length];
            if payload.starts_with(b"Exif\0\0") {
                return parse_tiff_software_tags(&payload[6..]).map(Some);
            }
        }
        pos += 2 + length;
    }
    Ok(None)
}

fn parse_tiff_software_tags(tiff: &[u8]) -> Result<Vec<String>, String> {
    if tiff.len() < 8 {
        return Err("Truncated TIFF header".to_string());
    }
    let little_endian = match &tiff[..2] {
        b"II" => true,
        b"MM" => false,
        _ => return Err("Unknown TIFF byte order".to_string()),
    };
    let read_u16 = |data: &[u8], at: usize| -> Result<u16, String> {
        let raw: [u8; 2] = data
            .get(at..at + 2)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| "TIFF offset out of range".to_string())?;
        Ok(if little_endian {
            u16::from_le_bytes(raw)
        } else {
            u16::from_be_bytes(raw)
        })
    };
    let read_u32 = |data: &[u8], at: usize| -> Result<u32, String> {
        let raw: [u8; 4] = data
            .get(at..at + 4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| "TIFF offset out of range".to_string())?;
        Ok(if little_endian {
            u32::from_le_bytes(raw)
        } else {
            u32::from_be_bytes(raw)
        })
    };

    if read_u16(tiff, 2)? != 42 {
        return Err("Bad TIFF magic".to_string());
    }
    let ifd_offset = read_u32(tiff, 4)? as usize;
    let entry_count = read_u16(tiff, ifd_offset)? as usize;

    let mut tags = Vec::new();
    for i in 0..entry_count {
        let entry = ifd_offset + 2 + i * 12;
        let tag = read_u16(tiff, entry)?;
        if tag != TAG_PROCESSING_SOFTWARE && tag != TAG_SOFTWARE && tag != TAG_ARTIST {
            continue;
        }
        let field_type = read_u16(tiff, entry + 2)?;
        // ASCII only; the software tags are never anything else
        if field_type != 2 {
            continue;
        }
        let count = read_u32(tiff, entry + 4)? as usize;
        let value = if count <= 4 {
            tiff.get(entry + 8..entry + 8 + count)
                .ok_or_else(|| "TIFF value out of range".to_string())?
        } else {
            let offset = read_u32(tiff, entry + 8)? as usize;
            tiff.get(offset..offset + count)
                .ok_or_else(|| "TIFF value out of range".to_string())?
        };
        let text: String = value
            .iter()
            .take_while(|b| **b != 0)
            .map(|b| *b as char)
            .collect();
        if !text.is_empty() {
            tags.push(text);
        }
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn base_metadata() -> FileMetadata {
        FileMetadata {
            extension: Some(".jpg".to_string()),
            modified: None,
            accessed: None,
            container: Some("JPEG".to_string()),
            software_tags: TagRead::Absent,
            quality_estimate: None,
        }
    }

    #[test]
    fn test_clean_phone_capture_scores_zero() {
        let findings = MetadataAnalyzer::analyze(&base_metadata(), SystemTime::now());
        assert_eq!(findings.metadata_score, 0.0);
        assert!(findings.findings.is_empty());
    }

    #[test]
    fn test_unexpected_extension_penalized() {
        let mut meta = base_metadata();
        meta.extension = Some(".bmp".to_string());
        let findings = MetadataAnalyzer::analyze(&meta, SystemTime::now());
        assert_eq!(findings.metadata_score, 25.0);
    }

    #[test]
    fn test_recent_modification_penalized_with_fixed_clock() {
        let mut meta = base_metadata();
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        meta.modified = Some(now - Duration::from_secs(60));
        let findings = MetadataAnalyzer::analyze(&meta, now);
        assert_eq!(findings.metadata_score, 10.0);
        assert!(findings.findings.contains(&"File modified very recently".to_string()));

        // Old modification is a recent capture, not tampering
        meta.modified = Some(now - Duration::from_secs(3600));
        let findings = MetadataAnalyzer::analyze(&meta, now);
        assert_eq!(findings.metadata_score, 0.0);
    }

    #[test]
    fn test_editing_software_penalized_phone_software_exculpatory() {
        let mut meta = base_metadata();
        meta.software_tags = TagRead::Tags(vec!["Adobe Photoshop 2024".to_string()]);
        let findings = MetadataAnalyzer::analyze(&meta, SystemTime::now());
        assert_eq!(findings.metadata_score, 35.0);
        assert!(findings.findings[0].contains("Photoshop"));

        meta.software_tags = TagRead::Tags(vec!["iPhone 15 Pro".to_string()]);
        let findings = MetadataAnalyzer::analyze(&meta, SystemTime::now());
        // Reduction floors at zero
        assert_eq!(findings.metadata_score, 0.0);
        assert!(findings.findings.contains(&"Image from phone camera".to_string()));
    }

    #[test]
    fn test_tag_read_failure_recovered_with_penalty() {
        let mut meta = base_metadata();
        meta.software_tags = TagRead::Failed("Truncated JPEG segment".to_string());
        let findings = MetadataAnalyzer::analyze(&meta, SystemTime::now());
        assert_eq!(findings.metadata_score, 15.0);
        assert!(findings.findings[0].starts_with("Error analyzing metadata"));
    }

    #[test]
    fn test_phone_container_reduces_score() {
        let mut meta = base_metadata();
        meta.extension = Some(".gif".to_string()); // +25
        meta.container = Some("HEIC".to_string()); // -10
        let findings = MetadataAnalyzer::analyze(&meta, SystemTime::now());
        assert_eq!(findings.metadata_score, 15.0);
    }

    #[test]
    fn test_unknown_container_penalized() {
        let mut meta = base_metadata();
        meta.container = None;
        let findings = MetadataAnalyzer::analyze(&meta, SystemTime::now());
        assert_eq!(findings.metadata_score, 20.0);
    }

    #[test]
    fn test_low_quality_estimate_penalized() {
        let mut meta = base_metadata();
        meta.quality_estimate = Some(40);
        let findings = MetadataAnalyzer::analyze(&meta, SystemTime::now());
        assert_eq!(findings.metadata_score, 15.0);

        meta.quality_estimate = Some(90);
        let findings = MetadataAnalyzer::analyze(&meta, SystemTime::now());
        assert_eq!(findings.metadata_score, 0.0);
    }

    #[test]
    fn test_score_clamped_to_100() {
        let mut meta = base_metadata();
        meta.extension = Some(".exe".to_string());
        meta.container = None;
        meta.software_tags = TagRead::Tags(vec![
            "Photoshop".to_string(),
            "GIMP 2.10".to_string(),
            "Affinity Photo".to_string(),
        ]);
        let findings = MetadataAnalyzer::analyze(&meta, SystemTime::now());
        assert_eq!(findings.metadata_score, 100.0);
    }

    #[test]
    fn test_sniff_container() {
        assert_eq!(
            sniff_container(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0], Some(".jpg")),
            Some("JPEG".to_string())
        );
        assert_eq!(
            sniff_container(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0], Some(".mpo")),
            Some("MPO".to_string())
        );
        assert_eq!(
            sniff_container(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0], Some(".png")),
            Some("PNG".to_string())
        );
        assert_eq!(sniff_container(&[0u8; 12], Some(".bin")), None);
    }

    #[test]
    fn test_software_tag_walk_reads_ascii_tag() {
        // Minimal JPEG: SOI + APP1 with a little-endian TIFF carrying one
        // Software tag ("GIMP"), then SOS.
        let tiff: Vec<u8> = {
            let mut t = Vec::new();
            t.extend_from_slice(b"II");
            t.extend_from_slice(&42u16.to_le_bytes());
            t.extend_from_slice(&8u32.to_le_bytes()); // IFD0 at byte 8
            t.extend_from_slice(&1u16.to_le_bytes()); // one entry
            t.extend_from_slice(&TAG_SOFTWARE.to_le_bytes());
            t.extend_from_slice(&2u16.to_le_bytes()); // ASCII
            t.extend_from_slice(&5u32.to_le_bytes()); // "GIMP\0"
            t.extend_from_slice(&26u32.to_le_bytes()); // value offset
            t.extend_from_slice(&0u32.to_le_bytes()); // next IFD
            t.extend_from_slice(b"GIMP\0");
            t
        };
        let mut jpeg = vec![0xFF, 0xD8];
        let payload_len = (tiff.len() + 6 + 2) as u16;
        jpeg.extend_from_slice(&[0xFF, 0xE1]);
        jpeg.extend_from_slice(&payload_len.to_be_bytes());
        jpeg.extend_from_slice(b"Exif\0\0");
        jpeg.extend_from_slice(&tiff);
        jpeg.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02]);

        let tags = read_software_tags(&jpeg).unwrap().unwrap();
        assert_eq!(tags, vec!["GIMP".to_string()]);
    }

    #[test]
    fn test_missing_exif_is_absent_not_failure() {
        let jpeg = vec![0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x02];
        assert!(read_software_tags(&jpeg).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_segment_is_failure() {
        let jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1, 0xFF, 0xFF, 0x00];
        assert!(read_software_tags(&jpeg).is_err());
    }
}
